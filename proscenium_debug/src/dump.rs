// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Indented text dumps of a scene graph.

use std::fmt::Write;

use proscenium_core::node::{NodeId, SceneGraph};

/// Renders every tree in `graph` as indented lines, one node per line, in
/// child-list order.
///
/// ```text
/// Window #0 [0] at (0,0) 100x80
///   Cast #1 [0,0] at (5,5) 10x10 hidden
///   Text #2 - at (0,0) 0x0 opacity=0.50
/// ```
///
/// `-` marks a node without a path key.
#[must_use]
pub fn dump_tree<B>(graph: &SceneGraph<B>) -> String {
    let mut out = String::new();
    for root in graph.roots() {
        dump_node(graph, root, 0, &mut out);
    }
    out
}

fn dump_node<B>(graph: &SceneGraph<B>, id: NodeId, depth: usize, out: &mut String) {
    let (Ok(kind), Ok(pos), Ok(size)) = (graph.kind(id), graph.position(id), graph.size(id))
    else {
        return;
    };
    let path = match graph.path(id) {
        Ok(Some(path)) => path.to_string(),
        _ => "-".into(),
    };
    let _ = write!(
        out,
        "{:indent$}{kind:?} #{} {path} at ({},{}) {}x{}",
        "",
        id.index(),
        pos.x,
        pos.y,
        size.width,
        size.height,
        indent = depth * 2,
    );
    if graph.is_visible(id) == Ok(false) {
        out.push_str(" hidden");
    }
    if let Ok(opacity) = graph.opacity(id)
        && opacity < 1.0
    {
        let _ = write!(out, " opacity={opacity:.2}");
    }
    if let Ok(Some(surface)) = graph.surface_of(id)
        && graph.parent(id).ok().flatten().is_none()
    {
        let _ = write!(out, " surface={}", surface.0);
    }
    out.push('\n');
    if let Ok(children) = graph.children(id) {
        for child in children {
            dump_node(graph, child, depth + 1, out);
        }
    }
}
