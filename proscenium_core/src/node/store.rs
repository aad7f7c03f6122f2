// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, keys and
//! property management.

use kurbo::{Point, Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, NodeId, NodeKind, SurfaceId};
use super::traverse::Children;
use crate::dirty;
use crate::error::{SceneError, SceneResult};
use crate::path::PathKey;
use crate::sequence::SequenceAllocator;
use crate::trace::{RemoveEvent, Tracer};

/// Struct-of-arrays storage for every visual node of every surface.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; removed nodes are recycled via a free list and
/// generation counters turn stale handles into [`SceneError::NotFound`].
///
/// Ownership flows strictly parent to children: a node's parent is stored
/// as a bare slot index, never as an owning reference. `B` is the pixel
/// buffer type, exclusively owned by its node.
#[derive(Debug)]
pub struct SceneGraph<B> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) position: Vec<Point>,
    pub(crate) size: Vec<Size>,
    pub(crate) visible: Vec<bool>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) surface: Vec<Option<SurfaceId>>,
    pub(crate) buffer: Vec<Option<B>>,

    // -- Ordering --
    pub(crate) path: Vec<Option<PathKey>>,
    pub(crate) created: Vec<u64>,
    pub(crate) sequences: SequenceAllocator<Option<NodeId>>,
    next_created: u64,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    live: usize,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) node_dirty: Vec<bool>,

    // -- Draw order cache --
    pub(crate) draw_order: Vec<NodeId>,
    pub(crate) sort_stale: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<NodeId>,
    pub(crate) pending_removed: Vec<NodeId>,
}

impl<B> Default for SceneGraph<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SceneGraph<B> {
    /// Creates an empty scene graph.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty scene graph with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: Vec::with_capacity(capacity),
            first_child: Vec::with_capacity(capacity),
            next_sibling: Vec::with_capacity(capacity),
            prev_sibling: Vec::with_capacity(capacity),
            kind: Vec::with_capacity(capacity),
            position: Vec::with_capacity(capacity),
            size: Vec::with_capacity(capacity),
            visible: Vec::with_capacity(capacity),
            opacity: Vec::with_capacity(capacity),
            surface: Vec::with_capacity(capacity),
            buffer: Vec::with_capacity(capacity),
            path: Vec::with_capacity(capacity),
            created: Vec::with_capacity(capacity),
            sequences: SequenceAllocator::new(),
            next_created: 0,
            generation: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
            live: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            node_dirty: Vec::with_capacity(capacity),
            draw_order: Vec::new(),
            sort_stale: false,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a node under `parent` (or as a new top-level node).
    ///
    /// A top-level node immediately gets the key `[n]` where `n` is the next
    /// top-level order. A child gets `parent_key ++ [next local order]` if the
    /// parent already has a key; otherwise its key stays unset until
    /// [`ensure_path`](Self::ensure_path) is called.
    ///
    /// The node starts visible, fully opaque, at the origin, with zero size
    /// and no destination surface.
    pub fn create_node(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        buffer: Option<B>,
    ) -> SceneResult<NodeId> {
        let parent_idx = match parent {
            Some(p) => Some(self.slot(p)?),
            None => None,
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped on removal.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.position[i] = Point::ZERO;
            self.size[i] = Size::ZERO;
            self.visible[i] = true;
            self.opacity[i] = 1.0;
            self.surface[i] = None;
            self.buffer[i] = buffer;
            self.path[i] = None;
            self.created[i] = self.next_created;
            self.alive[i] = true;
            self.node_dirty[i] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.position.push(Point::ZERO);
            self.size.push(Size::ZERO);
            self.visible.push(true);
            self.opacity.push(1.0);
            self.surface.push(None);
            self.buffer.push(buffer);
            self.path.push(None);
            self.created.push(self.next_created);
            self.generation.push(0);
            self.alive.push(true);
            self.node_dirty.push(true);
            idx
        };
        self.next_created += 1;
        self.live += 1;

        let id = self.id_at(idx);
        let path = match parent_idx {
            None => Some(PathKey::from_root(self.sequences.next(None))),
            Some(p) => {
                self.link_last(p as u32, idx);
                match self.path[p].clone() {
                    Some(parent_key) => {
                        let local = self.sequences.next(Some(self.id_at(p as u32)));
                        Some(parent_key.append(local))
                    }
                    None => None,
                }
            }
        };
        self.path[idx as usize] = path;

        self.sort_stale = true;
        self.pending_added.push(id);
        self.dirty.mark(idx, dirty::ORDER);
        self.dirty.mark(idx, dirty::CONTENT);
        tracing::debug!(?id, ?kind, ?parent, path = ?self.path[idx as usize], "created node");
        Ok(id)
    }

    /// Removes a node and, depth-first, every descendant.
    ///
    /// Each removed node is unlinked, unregistered and its pixel buffer
    /// dropped; its handle becomes stale. Returns the number of nodes
    /// removed.
    pub fn remove(&mut self, id: NodeId) -> SceneResult<usize> {
        self.remove_traced(id, &mut Tracer::none())
    }

    /// Like [`remove`](Self::remove), reporting the removal to `tracer`.
    pub fn remove_traced(&mut self, id: NodeId, tracer: &mut Tracer<'_>) -> SceneResult<usize> {
        let idx = self.slot(id)? as u32;
        let parent = self.parent[idx as usize];

        let doomed = self.subtree_post_order(idx);
        for &n in &doomed {
            let node = self.id_at(n);
            let i = n as usize;
            if self.parent[i] != INVALID {
                let p = self.parent[i];
                self.unlink_from_parent(n);
                self.dirty.remove_dependency(n, p, dirty::GEOMETRY);
                self.dirty.remove_dependency(n, p, dirty::APPEARANCE);
            }
            self.dirty.remove_key(n);
            self.sequences.forget(&Some(node));

            // Bump generation so old handles immediately fail validation.
            self.generation[i] = self.generation[i].wrapping_add(1);
            self.alive[i] = false;
            self.buffer[i] = None;
            self.path[i] = None;
            self.surface[i] = None;
            self.node_dirty[i] = false;
            self.free_list.push(n);
            self.live -= 1;
            self.pending_removed.push(node);
        }

        if parent != INVALID {
            self.dirty.mark(parent, dirty::ORDER);
        }
        self.sort_stale = true;
        tracer.remove(&RemoveEvent {
            node: id,
            removed: doomed.len(),
        });
        tracing::debug!(?id, removed = doomed.len(), "removed subtree");
        Ok(doomed.len())
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slot(id).is_ok()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn count(&self) -> usize {
        self.live
    }

    // -- Topology API --

    /// Moves `id` under `new_parent`, or makes it top-level with `None`.
    ///
    /// The node is detached from its old parent's child list and appended to
    /// the new one. It then receives a fresh key from the new parent's
    /// sequence (so it sorts in front of its new siblings) and every
    /// descendant is re-keyed under it, preserving their relative order. If
    /// the new parent has no key, the whole subtree becomes unkeyed.
    pub fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> SceneResult<()> {
        let c = self.slot(id)? as u32;
        let p = match new_parent {
            Some(np) => {
                let p = self.slot(np)? as u32;
                if p == c || self.is_ancestor(c, p) {
                    return Err(SceneError::Cycle {
                        node: id,
                        parent: np,
                    });
                }
                p
            }
            None => INVALID,
        };

        let old_p = self.parent[c as usize];
        if old_p != INVALID {
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old_p, dirty::GEOMETRY);
            self.dirty.remove_dependency(c, old_p, dirty::APPEARANCE);
            self.dirty.mark(old_p, dirty::ORDER);
        }

        let key = if p == INVALID {
            Some(PathKey::from_root(self.sequences.next(None)))
        } else {
            self.link_last(p, c);
            self.dirty.mark(p, dirty::ORDER);
            self.path[p as usize].clone().map(|parent_key| {
                let local = self.sequences.next(Some(self.id_at(p)));
                parent_key.append(local)
            })
        };
        self.assign_subtree(c, key);

        self.mark_subtree_inherited_dirty(c);
        self.node_dirty[c as usize] = true;
        self.sort_stale = true;
        tracing::debug!(?id, ?new_parent, path = ?self.path[c as usize], "reparented node");
        Ok(())
    }

    /// Draws the next key under `parent` (or the next top-level key).
    ///
    /// The returned key is reserved: no node created later under the same
    /// parent will receive it. Fails with [`SceneError::Unordered`] if the
    /// parent has no key yet.
    pub fn assign_next_path_key(&mut self, parent: Option<NodeId>) -> SceneResult<PathKey> {
        match parent {
            None => Ok(PathKey::from_root(self.sequences.next(None))),
            Some(p) => {
                let idx = self.slot(p)?;
                let parent_key = self.path[idx].clone().ok_or(SceneError::Unordered(p))?;
                Ok(parent_key.append(self.sequences.next(Some(p))))
            }
        }
    }

    /// Gives `id` a fresh key from its current parent's sequence, bringing it
    /// in front of every existing sibling, and re-keys its descendants.
    pub fn bring_to_front(&mut self, id: NodeId) -> SceneResult<PathKey> {
        let c = self.slot(id)? as u32;
        let parent = self.parent(id)?;
        let key = self.assign_next_path_key(parent)?;
        self.assign_subtree(c, Some(key.clone()));
        self.dirty.mark(c, dirty::ORDER);
        self.node_dirty[c as usize] = true;
        self.sort_stale = true;
        Ok(key)
    }

    /// Returns the node's key, deriving keys for it and any unkeyed
    /// ancestors first if necessary.
    pub fn ensure_path(&mut self, id: NodeId) -> SceneResult<PathKey> {
        let idx = self.slot(id)? as u32;
        if let Some(key) = &self.path[idx as usize] {
            return Ok(key.clone());
        }

        // Find the outermost unkeyed ancestor; keying it cascades down.
        let mut top = idx;
        loop {
            let p = self.parent[top as usize];
            if p == INVALID || self.path[p as usize].is_some() {
                break;
            }
            top = p;
        }
        self.bring_to_front(self.id_at(top))?;
        self.path[idx as usize]
            .clone()
            .ok_or(SceneError::Unordered(id))
    }

    /// Returns the parent of a node, if any.
    pub fn parent(&self, id: NodeId) -> SceneResult<Option<NodeId>> {
        let idx = self.slot(id)?;
        let p = self.parent[idx];
        Ok((p != INVALID).then(|| self.id_at(p)))
    }

    /// Returns an iterator over the direct children of a node, in the order
    /// they were attached.
    pub fn children(&self, id: NodeId) -> SceneResult<Children<'_, B>> {
        let idx = self.slot(id)?;
        Ok(Children::new(self, self.first_child[idx]))
    }

    /// Returns the live top-level nodes.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.len)
            .filter(|&idx| self.alive[idx as usize] && self.parent[idx as usize] == INVALID)
            .map(|idx| self.id_at(idx))
            .collect()
    }

    /// Returns the top-level ancestor of a node (the node itself if it has
    /// no parent).
    pub fn root_of(&self, id: NodeId) -> SceneResult<NodeId> {
        let mut idx = self.slot(id)? as u32;
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        Ok(self.id_at(idx))
    }

    // -- Property getters --

    /// Returns the node's key, or `None` if it has not been assigned one.
    pub fn path(&self, id: NodeId) -> SceneResult<Option<&PathKey>> {
        let idx = self.slot(id)?;
        Ok(self.path[idx].as_ref())
    }

    /// Returns the node's kind.
    pub fn kind(&self, id: NodeId) -> SceneResult<NodeKind> {
        Ok(self.kind[self.slot(id)?])
    }

    /// Returns the node's position relative to its parent.
    pub fn position(&self, id: NodeId) -> SceneResult<Point> {
        Ok(self.position[self.slot(id)?])
    }

    /// Returns the node's content size.
    pub fn size(&self, id: NodeId) -> SceneResult<Size> {
        Ok(self.size[self.slot(id)?])
    }

    /// Returns the node's local visibility flag.
    pub fn is_visible(&self, id: NodeId) -> SceneResult<bool> {
        Ok(self.visible[self.slot(id)?])
    }

    /// Returns the node's local opacity.
    pub fn opacity(&self, id: NodeId) -> SceneResult<f32> {
        Ok(self.opacity[self.slot(id)?])
    }

    /// Returns the node's pixel buffer, if it owns one.
    pub fn buffer(&self, id: NodeId) -> SceneResult<Option<&B>> {
        let idx = self.slot(id)?;
        Ok(self.buffer[idx].as_ref())
    }

    /// Returns the node's pixel buffer mutably and marks its content dirty.
    pub fn buffer_mut(&mut self, id: NodeId) -> SceneResult<Option<&mut B>> {
        let idx = self.slot(id)?;
        self.dirty.mark(idx as u32, dirty::CONTENT);
        self.node_dirty[idx] = true;
        Ok(self.buffer[idx].as_mut())
    }

    /// Returns whether the node changed since the last
    /// [`take_changes`](Self::take_changes).
    pub fn is_dirty(&self, id: NodeId) -> SceneResult<bool> {
        Ok(self.node_dirty[self.slot(id)?])
    }

    /// Effective visibility: the node and every ancestor are visible.
    pub fn effective_visibility(&self, id: NodeId) -> SceneResult<bool> {
        let mut idx = self.slot(id)? as u32;
        loop {
            if !self.visible[idx as usize] {
                return Ok(false);
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return Ok(true);
            }
        }
    }

    /// Effective opacity: the product of local opacities up the ancestor
    /// chain. Stops early at the first fully transparent node.
    pub fn effective_opacity(&self, id: NodeId) -> SceneResult<f32> {
        let mut idx = self.slot(id)? as u32;
        let mut acc = 1.0;
        while idx != INVALID {
            let local = self.opacity[idx as usize];
            if local <= 0.0 {
                return Ok(0.0);
            }
            acc *= local;
            idx = self.parent[idx as usize];
        }
        Ok(acc)
    }

    /// Position of the node in its surface: the sum of local positions up
    /// the ancestor chain.
    pub fn world_origin(&self, id: NodeId) -> SceneResult<Point> {
        let idx = self.slot(id)? as u32;
        Ok(self.world_origin_at(idx))
    }

    /// The node's own content rectangle in surface space.
    pub fn world_bounds(&self, id: NodeId) -> SceneResult<Rect> {
        let idx = self.slot(id)? as u32;
        Ok(self.world_bounds_at(idx))
    }

    /// Union of the content rectangles of the node and all descendants, or
    /// `None` if none of them has a non-empty size.
    pub fn subtree_bounds(&self, id: NodeId) -> SceneResult<Option<Rect>> {
        let idx = self.slot(id)? as u32;
        let mut acc = None;
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            acc = crate::geometry::union_into(acc, self.world_bounds_at(n));
            let mut child = self.first_child[n as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
        Ok(acc)
    }

    /// Like [`subtree_bounds`](Self::subtree_bounds), split by the surface
    /// each node draws into. Nodes without a surface are left out.
    pub fn subtree_bounds_by_surface(&self, id: NodeId) -> SceneResult<Vec<(SurfaceId, Rect)>> {
        let idx = self.slot(id)? as u32;
        let mut out: Vec<(SurfaceId, Rect)> = Vec::new();
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            let bounds = self.world_bounds_at(n);
            if let Some(surface) = self.surface_at(n)
                && !crate::geometry::is_empty(bounds)
            {
                match out.iter_mut().find(|(s, _)| *s == surface) {
                    Some((_, acc)) => *acc = acc.union(bounds),
                    None => out.push((surface, bounds)),
                }
            }
            let mut child = self.first_child[n as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
        Ok(out)
    }

    /// The surface the node draws into: its own, or the nearest ancestor's.
    pub fn surface_of(&self, id: NodeId) -> SceneResult<Option<SurfaceId>> {
        let idx = self.slot(id)? as u32;
        Ok(self.surface_at(idx))
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local visibility flag.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> SceneResult<()> {
        let idx = self.slot(id)?;
        self.visible[idx] = visible;
        self.node_dirty[idx] = true;
        self.dirty
            .mark_with(idx as u32, dirty::APPEARANCE, &EagerPolicy);
        Ok(())
    }

    /// Sets the local opacity, clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) -> SceneResult<()> {
        let idx = self.slot(id)?;
        if opacity.is_nan() {
            return Err(SceneError::invalid("opacity is NaN"));
        }
        self.opacity[idx] = opacity.clamp(0.0, 1.0);
        self.node_dirty[idx] = true;
        self.dirty
            .mark_with(idx as u32, dirty::APPEARANCE, &EagerPolicy);
        Ok(())
    }

    /// Sets the position relative to the parent.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> SceneResult<()> {
        let idx = self.slot(id)?;
        if !position.is_finite() {
            return Err(SceneError::invalid(format!(
                "position {position:?} is not finite"
            )));
        }
        self.position[idx] = position;
        self.node_dirty[idx] = true;
        self.dirty
            .mark_with(idx as u32, dirty::GEOMETRY, &EagerPolicy);
        Ok(())
    }

    /// Sets the content size.
    pub fn set_size(&mut self, id: NodeId, size: Size) -> SceneResult<()> {
        let idx = self.slot(id)?;
        if !(size.width >= 0.0 && size.height >= 0.0 && size.is_finite()) {
            return Err(SceneError::invalid(format!("size {size:?} is invalid")));
        }
        self.size[idx] = size;
        self.node_dirty[idx] = true;
        self.dirty.mark(idx as u32, dirty::CONTENT);
        Ok(())
    }

    /// Replaces the node's pixel buffer, returning the previous one.
    pub fn set_buffer(&mut self, id: NodeId, buffer: Option<B>) -> SceneResult<Option<B>> {
        let idx = self.slot(id)?;
        self.node_dirty[idx] = true;
        self.dirty.mark(idx as u32, dirty::CONTENT);
        Ok(core::mem::replace(&mut self.buffer[idx], buffer))
    }

    /// Binds the node (and, by inheritance, its unbound descendants) to a
    /// destination surface.
    pub fn set_surface(&mut self, id: NodeId, surface: Option<SurfaceId>) -> SceneResult<()> {
        let idx = self.slot(id)?;
        self.surface[idx] = surface;
        self.node_dirty[idx] = true;
        self.dirty.mark(idx as u32, dirty::CONTENT);
        Ok(())
    }

    // -- Internal helpers --

    /// Resolves a handle to its slot, or reports it as not found.
    pub(crate) fn slot(&self, id: NodeId) -> SceneResult<usize> {
        let idx = id.idx as usize;
        if id.idx < self.len && self.alive[idx] && self.generation[idx] == id.generation {
            Ok(idx)
        } else {
            Err(SceneError::NotFound(id))
        }
    }

    /// Builds the current handle for a live slot.
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn world_origin_at(&self, idx: u32) -> Point {
        let mut origin = Point::ZERO;
        let mut n = idx;
        while n != INVALID {
            origin += self.position[n as usize].to_vec2();
            n = self.parent[n as usize];
        }
        origin
    }

    pub(crate) fn world_bounds_at(&self, idx: u32) -> Rect {
        Rect::from_origin_size(self.world_origin_at(idx), self.size[idx as usize])
    }

    pub(crate) fn surface_at(&self, idx: u32) -> Option<SurfaceId> {
        let mut n = idx;
        while n != INVALID {
            if let Some(surface) = self.surface[n as usize] {
                return Some(surface);
            }
            n = self.parent[n as usize];
        }
        None
    }

    /// Returns `true` if `ancestor` lies on `idx`'s parent chain.
    fn is_ancestor(&self, ancestor: u32, idx: u32) -> bool {
        let mut n = self.parent[idx as usize];
        while n != INVALID {
            if n == ancestor {
                return true;
            }
            n = self.parent[n as usize];
        }
        false
    }

    /// Appends `c` as the last child of `p` and adds the inherited-channel
    /// dependency edges.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for GEOMETRY and APPEARANCE.
        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        let _ = self.dirty.add_dependency(c, p, dirty::APPEARANCE);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Sets `idx`'s key and re-keys its descendants beneath it.
    ///
    /// Descendants keep their local order when they have one; unkeyed
    /// descendants draw a fresh one from their parent's sequence. With
    /// `key == None` the whole subtree becomes unkeyed.
    fn assign_subtree(&mut self, idx: u32, key: Option<PathKey>) {
        self.path[idx as usize] = key;
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            let parent_key = self.path[n as usize].clone();
            let parent_id = self.id_at(n);
            let mut child = self.first_child[n as usize];
            while child != INVALID {
                let child_key = match &parent_key {
                    Some(pk) => Some(match self.path[child as usize].as_ref() {
                        Some(old) => old.rebase(old.len() - 1, pk),
                        None => pk.append(self.sequences.next(Some(parent_id))),
                    }),
                    None => None,
                };
                self.path[child as usize] = child_key;
                self.dirty.mark(child, dirty::ORDER);
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
    }

    /// Collects `idx` and all descendants, children before parents.
    fn subtree_post_order(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![(idx, false)];
        while let Some((n, expanded)) = stack.pop() {
            if expanded {
                out.push(n);
                continue;
            }
            stack.push((n, true));
            let mut child = self.first_child[n as usize];
            while child != INVALID {
                stack.push((child, false));
                child = self.next_sibling[child as usize];
            }
        }
        out
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::APPEARANCE, &EagerPolicy);
        self.dirty.mark(idx, dirty::ORDER);
    }
}
