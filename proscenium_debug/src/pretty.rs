// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use kurbo::Rect;
use proscenium_core::trace::{CompositeEvent, RemoveEvent, SortEvent, TraceSink};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
    events: u64,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer, events: 0 }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer, events: 0 }
    }

    /// Number of events written so far.
    #[must_use]
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn rect(r: Option<Rect>) -> String {
    match r {
        Some(r) => format!("({},{})-({},{})", r.x0, r.y0, r.x1, r.y1),
        None => "-".into(),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_sort(&mut self, e: &SortEvent) {
        self.events += 1;
        let _ = writeln!(
            self.writer,
            "[sort] nodes={} unkeyed={}",
            e.nodes, e.unkeyed,
        );
    }

    fn on_composite(&mut self, e: &CompositeEvent) {
        self.events += 1;
        if e.cached {
            let _ = writeln!(self.writer, "[composite] surface={} cached", e.surface.0);
            return;
        }
        let _ = writeln!(
            self.writer,
            "[composite] surface={} damage={} drawn={} hidden={} clipped={} covered={}",
            e.surface.0,
            rect(e.damage),
            e.drawn,
            e.skipped_hidden,
            e.skipped_clipped,
            e.skipped_covered,
        );
    }

    fn on_remove(&mut self, e: &RemoveEvent) {
        self.events += 1;
        let _ = writeln!(
            self.writer,
            "[remove] node={} removed={}",
            e.node.index(),
            e.removed,
        );
    }
}

#[cfg(test)]
mod tests {
    use proscenium_core::node::{NodeKind, SceneGraph, SurfaceId};
    use proscenium_core::trace::Tracer;

    use super::*;

    #[test]
    fn pretty_print_composite() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_composite(&CompositeEvent {
            surface: SurfaceId(2),
            cached: false,
            damage: Some(Rect::new(0.0, 0.0, 10.0, 5.0)),
            drawn: 3,
            skipped_hidden: 0,
            skipped_clipped: 1,
            skipped_covered: 2,
        });
        sink.on_composite(&CompositeEvent {
            surface: SurfaceId(2),
            cached: true,
            damage: None,
            drawn: 0,
            skipped_hidden: 0,
            skipped_clipped: 0,
            skipped_covered: 0,
        });
        assert_eq!(sink.events(), 2);
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines[0],
            "[composite] surface=2 damage=(0,0)-(10,5) drawn=3 hidden=0 clipped=1 covered=2"
        );
        assert_eq!(lines[1], "[composite] surface=2 cached");
    }

    #[test]
    fn graph_events_reach_the_sink() {
        let mut g: SceneGraph<()> = SceneGraph::new();
        let w = g.create_node(None, NodeKind::Window, None).unwrap();
        g.create_node(Some(w), NodeKind::Cast, None).unwrap();

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        {
            let mut tracer = Tracer::new(&mut sink);
            g.draw_order_traced(&mut tracer);
            g.remove_traced(w, &mut tracer).unwrap();
        }
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[sort] nodes=2 unkeyed=0"), "got: {output}");
        assert!(output.contains("[remove] node=0 removed=2"), "got: {output}");
    }
}
