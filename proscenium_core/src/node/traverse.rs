// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child-list iteration.

use super::id::{INVALID, NodeId};
use super::store::SceneGraph;

/// An iterator over the direct children of a node, in attachment order.
///
/// Attachment order is bookkeeping only; draw order comes from path keys.
/// Created by [`SceneGraph::children`].
#[derive(Debug)]
pub struct Children<'a, B> {
    graph: &'a SceneGraph<B>,
    current: u32,
}

impl<'a, B> Children<'a, B> {
    pub(crate) fn new(graph: &'a SceneGraph<B>, first: u32) -> Self {
        Self {
            graph,
            current: first,
        }
    }
}

impl<B> Iterator for Children<'_, B> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.graph.next_sibling[idx as usize];
        Some(self.graph.id_at(idx))
    }
}
