// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame instrumentation hooks.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! scene graph and compositor emit. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! These hooks complement the `tracing` diagnostics: spans and log lines
//! describe what happened, sink events carry the numbers.

use kurbo::Rect;

use crate::node::{NodeId, SurfaceId};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the draw order is re-sorted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortEvent {
    /// Number of live nodes sorted.
    pub nodes: usize,
    /// How many of them had no key and were placed first.
    pub unkeyed: usize,
}

/// Emitted after a layer set composite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeEvent {
    /// The surface that was composited.
    pub surface: SurfaceId,
    /// `true` if nothing was dirty and the cached buffer was returned.
    pub cached: bool,
    /// Region that was redrawn, if any.
    pub damage: Option<Rect>,
    /// Layers that issued a draw.
    pub drawn: usize,
    /// Layers skipped for being invisible or empty.
    pub skipped_hidden: usize,
    /// Layers skipped for lying outside the visible or dirty region.
    pub skipped_clipped: usize,
    /// Layers skipped because an opaque layer above covers them.
    pub skipped_covered: usize,
}

/// Emitted when a subtree is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveEvent {
    /// Root of the removed subtree.
    pub node: NodeId,
    /// Number of nodes removed, including the root.
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scene graph and compositor.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when the draw order is re-sorted.
    fn on_sort(&mut self, e: &SortEvent) {
        _ = e;
    }

    /// Called after each layer set composite.
    fn on_composite(&mut self, e: &CompositeEvent) {
        _ = e;
    }

    /// Called when a subtree is removed.
    fn on_remove(&mut self, e: &RemoveEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SortEvent`].
    #[inline]
    pub fn sort(&mut self, e: &SortEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_sort(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CompositeEvent`].
    #[inline]
    pub fn composite(&mut self, e: &CompositeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_composite(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RemoveEvent`].
    #[inline]
    pub fn remove(&mut self, e: &RemoveEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_remove(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
