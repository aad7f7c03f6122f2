// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-order sorting and per-frame change reporting.
//!
//! Once per frame a caller:
//!
//! 1. Calls [`SceneGraph::draw_order`], which re-sorts every live node by
//!    path key if anything structural happened since the last call.
//! 2. Calls [`SceneGraph::take_changes`], which drains each dirty channel
//!    and clears per-node dirty flags.
//!
//! Sorting is stable: nodes without a key come first, ordered among
//! themselves (and any equal keys) by creation sequence.

use super::id::NodeId;
use super::store::SceneGraph;
use crate::dirty;
use crate::path::compare_optional;
use crate::trace::{SortEvent, Tracer};

/// The set of changes drained by a single [`SceneGraph::take_changes`] call.
///
/// Only live nodes are reported in the per-channel lists; nodes removed
/// since the last drain appear in `removed` alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeChanges {
    /// Nodes whose world position changed (moved, or an ancestor moved).
    pub geometry: Vec<NodeId>,
    /// Nodes whose effective visibility or opacity may have changed.
    pub appearance: Vec<NodeId>,
    /// Nodes whose pixel buffer, size or surface changed.
    pub content: Vec<NodeId>,
    /// Nodes created since the last drain.
    pub added: Vec<NodeId>,
    /// Nodes removed since the last drain.
    pub removed: Vec<NodeId>,
    /// Whether the tree structure or any key changed.
    pub order_changed: bool,
}

impl NodeChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.appearance.clear();
        self.content.clear();
        self.added.clear();
        self.removed.clear();
        self.order_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.appearance.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.order_changed
    }
}

impl<B> SceneGraph<B> {
    /// Flags the draw order for re-sorting on the next
    /// [`draw_order`](Self::draw_order).
    pub fn mark_need_sort(&mut self) {
        self.sort_stale = true;
    }

    /// Returns `true` if the cached draw order is out of date.
    #[must_use]
    pub fn is_sort_stale(&self) -> bool {
        self.sort_stale
    }

    /// Returns every live node, back to front.
    ///
    /// Re-sorts only if the order is stale; repeated calls without a
    /// mutation in between return the same slice.
    pub fn draw_order(&mut self) -> &[NodeId] {
        self.draw_order_traced(&mut Tracer::none())
    }

    /// Like [`draw_order`](Self::draw_order), reporting a re-sort to `tracer`.
    pub fn draw_order_traced(&mut self, tracer: &mut Tracer<'_>) -> &[NodeId] {
        if self.sort_stale {
            self.draw_order = self.sorted_nodes();
            self.sort_stale = false;
            let unkeyed = self
                .draw_order
                .iter()
                .take_while(|id| self.path[id.idx as usize].is_none())
                .count();
            tracer.sort(&SortEvent {
                nodes: self.draw_order.len(),
                unkeyed,
            });
            tracing::trace!(nodes = self.draw_order.len(), unkeyed, "re-sorted draw order");
        }
        &self.draw_order
    }

    /// Returns the cached draw order without re-sorting.
    ///
    /// Only current if [`is_sort_stale`](Self::is_sort_stale) is `false`.
    #[must_use]
    pub fn cached_draw_order(&self) -> &[NodeId] {
        &self.draw_order
    }

    /// Computes a fresh back-to-front order of every live node.
    #[must_use]
    pub fn sorted_nodes(&self) -> Vec<NodeId> {
        let mut order: Vec<NodeId> = (0..self.len)
            .filter(|&idx| self.alive[idx as usize])
            .map(|idx| self.id_at(idx))
            .collect();
        order.sort_by(|a, b| {
            let (a, b) = (a.idx as usize, b.idx as usize);
            compare_optional(self.path[a].as_ref(), self.path[b].as_ref())
                .then(self.created[a].cmp(&self.created[b]))
        });
        order
    }

    /// Returns `true` if a [`take_changes`](Self::take_changes) call would
    /// report anything.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.pending_added.is_empty()
            || !self.pending_removed.is_empty()
            || self.node_dirty.iter().any(|&d| d)
    }

    /// Drains every dirty channel and returns what changed.
    pub fn take_changes(&mut self) -> NodeChanges {
        let mut changes = NodeChanges::default();
        self.take_changes_into(&mut changes);
        changes
    }

    /// Like [`take_changes`](Self::take_changes), but reuses a
    /// caller-provided buffer.
    pub fn take_changes_into(&mut self, changes: &mut NodeChanges) {
        changes.clear();

        // Inherited channels report every affected descendant.
        let geometry: Vec<u32> = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.geometry = self.live_ids(geometry);

        let appearance: Vec<u32> = self
            .dirty
            .drain(dirty::APPEARANCE)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.appearance = self.live_ids(appearance);

        let content: Vec<u32> = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();
        changes.content = self.live_ids(content);

        let order: Vec<u32> = self
            .dirty
            .drain(dirty::ORDER)
            .deterministic()
            .run()
            .collect();
        changes.order_changed = !order.is_empty() || !self.pending_removed.is_empty();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
        changes.added.retain(|&id| self.slot(id).is_ok());

        self.node_dirty.iter_mut().for_each(|d| *d = false);
    }

    fn live_ids(&self, slots: Vec<u32>) -> Vec<NodeId> {
        slots
            .into_iter()
            .filter(|&idx| idx < self.len && self.alive[idx as usize])
            .map(|idx| self.id_at(idx))
            .collect()
    }
}
