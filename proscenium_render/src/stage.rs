// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: one scene graph plus a layer set per surface, behind locks.
//!
//! Mutations take the scene's writer lock for their in-memory work only;
//! damage is forwarded to the affected layer set after the scene lock is
//! released. Read-only queries share the reader lock.
//!
//! [`Stage::draw_order`] is the frame boundary: it drains the scene's change
//! lists and per-node dirty flags, and keeps what it drained until the next
//! call for [`Stage::frame_changes`].
//!
//! Lock order, outermost first: scene, rasterizer, layer set, trace sink,
//! frame changes. No path takes the scene lock while holding any of the
//! others.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{Point, Rect, Size};
use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};
use proscenium_core::node::{NodeChanges, NodeId, NodeKind, SceneGraph, SurfaceId};
use proscenium_core::path::PathKey;
use proscenium_core::plan::RenderPlan;
use proscenium_core::trace::{TraceSink, Tracer};
use proscenium_core::SceneResult;

use crate::compositor::CompositeStats;
use crate::config::StageConfig;
use crate::error::{RenderError, RenderResult};
use crate::layer::LayerId;
use crate::layer_set::LayerSet;
use crate::paint::paint_plan;
use crate::raster::Rasterizer;

type SharedSet<S> = Arc<RwLock<LayerSet<S>>>;
type BoxedSink = Box<dyn TraceSink + Send>;

/// Point-in-time counts reported by [`Stage::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Live nodes in the scene graph.
    pub nodes: usize,
    /// Registered surfaces.
    pub surfaces: usize,
    /// Layers across every surface.
    pub layers: usize,
    /// Whether the next [`Stage::draw_order`] call re-sorts.
    pub sort_stale: bool,
}

/// Thread-safe owner of the scene graph and per-surface layer sets.
///
/// Nodes own their pixel buffers (`R::Surface`). Every tree mutation marks
/// the affected rectangle dirty on the layer set of the node's surface, so a
/// following [`composite`](Self::composite) redraws it.
pub struct Stage<R: Rasterizer> {
    scene: RwLock<SceneGraph<R::Surface>>,
    surfaces: RwLock<HashMap<SurfaceId, SharedSet<R::Surface>>>,
    raster: Mutex<R>,
    next_surface: AtomicU32,
    config: StageConfig,
    sink: Mutex<Option<BoxedSink>>,
    frame: Mutex<NodeChanges>,
}

impl<R: Rasterizer> fmt::Debug for Stage<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: Rasterizer> Stage<R> {
    /// Creates an empty stage drawing through `raster`.
    pub fn new(raster: R, config: StageConfig) -> Self {
        Self {
            scene: RwLock::new(SceneGraph::with_capacity(config.node_capacity)),
            surfaces: RwLock::new(HashMap::new()),
            raster: Mutex::new(raster),
            next_surface: AtomicU32::new(0),
            config,
            sink: Mutex::new(None),
            frame: Mutex::new(NodeChanges::default()),
        }
    }

    /// The configuration the stage was created with.
    #[must_use]
    pub fn config(&self) -> StageConfig {
        self.config
    }

    /// Installs (or with `None`, removes) the sink receiving frame events.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&self, sink: Option<BoxedSink>) {
        *self.sink.lock() = sink;
    }

    // -- Surfaces ----------------------------------------------------------

    /// Registers a `width` x `height` surface with an empty layer set.
    pub fn create_surface(&self, width: u32, height: u32) -> RenderResult<SurfaceId> {
        let id = SurfaceId(self.next_surface.fetch_add(1, Ordering::Relaxed));
        let set = logged("create_surface", LayerSet::new(id, width, height))?;
        self.surfaces.write().insert(id, Arc::new(RwLock::new(set)));
        tracing::debug!(surface = id.0, width, height, "created surface");
        Ok(id)
    }

    /// Drops a surface and its layer set.
    ///
    /// Nodes still bound to it keep the identity and are simply not
    /// composited anywhere.
    pub fn remove_surface(&self, id: SurfaceId) -> RenderResult<()> {
        let removed = self.surfaces.write().remove(&id);
        match removed {
            Some(_) => {
                tracing::debug!(surface = id.0, "removed surface");
                Ok(())
            }
            None => logged("remove_surface", Err(RenderError::UnknownSurface(id))),
        }
    }

    /// Runs `f` with exclusive access to a surface's layer set and the
    /// rasterizer, for adding and editing layers.
    pub fn with_layers<T>(
        &self,
        surface: SurfaceId,
        f: impl FnOnce(&mut LayerSet<R::Surface>, &mut R) -> T,
    ) -> RenderResult<T> {
        let set = self.layer_set(surface)?;
        let mut raster = self.raster.lock();
        let mut set = set.write();
        Ok(f(&mut *set, &mut *raster))
    }

    /// Adds `rect` to a surface's damage.
    pub fn mark_dirty(&self, surface: SurfaceId, rect: Rect) -> RenderResult<()> {
        let set = logged("mark_dirty", self.layer_set(surface))?;
        set.write().add_dirty_region(rect);
        Ok(())
    }

    /// Composites a surface's layers within `visible` and reports what the
    /// pass did. Read the result with [`read_buffer`](Self::read_buffer).
    #[tracing::instrument(skip(self))]
    pub fn composite(&self, surface: SurfaceId, visible: Rect) -> RenderResult<CompositeStats> {
        let set = logged("composite", self.layer_set(surface))?;
        let mut raster = self.raster.lock();
        let mut set = set.write();
        let mut sink = self.sink.lock();
        let mut tracer = tracer_for(&mut sink);
        logged(
            "composite",
            set.composite_traced(&mut *raster, visible, &self.config.compositor, &mut tracer)
                .map(|_| ()),
        )?;
        Ok(set.last_stats())
    }

    /// Runs `f` on a surface's composite buffer.
    ///
    /// Returns `Ok(None)` before the surface's first composite.
    pub fn read_buffer<T>(
        &self,
        surface: SurfaceId,
        f: impl FnOnce(&R::Surface) -> T,
    ) -> RenderResult<Option<T>> {
        let set = self.layer_set(surface)?;
        let set = set.read();
        Ok(set.buffer().map(f))
    }

    // -- Nodes -------------------------------------------------------------

    /// Creates a node as the last child of `parent`, or as a new root.
    pub fn create_node(
        &self,
        parent: Option<NodeId>,
        kind: NodeKind,
        buffer: Option<R::Surface>,
    ) -> RenderResult<NodeId> {
        let result = self.scene.write().create_node(parent, kind, buffer);
        logged("create_node", result.map_err(RenderError::from))
    }

    /// Moves `id` (with its subtree) under `parent`, or detaches it.
    pub fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> RenderResult<()> {
        self.mutate("set_parent", id, |scene| scene.set_parent(id, parent))
    }

    /// Removes `id` and its whole subtree, returning how many nodes went.
    pub fn remove(&self, id: NodeId) -> RenderResult<usize> {
        self.mutate("remove", id, |scene| {
            let mut sink = self.sink.lock();
            scene.remove_traced(id, &mut tracer_for(&mut sink))
        })
    }

    /// Shows or hides `id` and its subtree.
    pub fn set_visible(&self, id: NodeId, visible: bool) -> RenderResult<()> {
        self.mutate("set_visible", id, |scene| scene.set_visible(id, visible))
    }

    /// Sets the opacity of `id`, clamped to `0.0..=1.0`.
    pub fn set_opacity(&self, id: NodeId, opacity: f32) -> RenderResult<()> {
        self.mutate("set_opacity", id, |scene| scene.set_opacity(id, opacity))
    }

    /// Moves `id` relative to its parent.
    pub fn set_position(&self, id: NodeId, position: Point) -> RenderResult<()> {
        self.mutate("set_position", id, |scene| scene.set_position(id, position))
    }

    /// Resizes the content rectangle of `id`.
    pub fn set_size(&self, id: NodeId, size: Size) -> RenderResult<()> {
        self.mutate("set_size", id, |scene| scene.set_size(id, size))
    }

    /// Replaces the pixel buffer of `id`, returning the previous one.
    pub fn set_buffer(
        &self,
        id: NodeId,
        buffer: Option<R::Surface>,
    ) -> RenderResult<Option<R::Surface>> {
        self.mutate("set_buffer", id, |scene| scene.set_buffer(id, buffer))
    }

    /// Binds `id` and its unbound descendants to a surface.
    ///
    /// The surface must be registered with
    /// [`create_surface`](Self::create_surface).
    pub fn set_surface(&self, id: NodeId, surface: Option<SurfaceId>) -> RenderResult<()> {
        if let Some(surface) = surface {
            logged("set_surface", self.layer_set(surface))?;
        }
        self.mutate("set_surface", id, |scene| scene.set_surface(id, surface))
    }

    /// Reserves the next path key under `parent`, or at the top level.
    pub fn assign_next_path_key(&self, parent: Option<NodeId>) -> RenderResult<PathKey> {
        let result = self.scene.write().assign_next_path_key(parent);
        logged("assign_next_path_key", result.map_err(RenderError::from))
    }

    /// The back-to-front draw order, re-sorting only when stale.
    ///
    /// Also drains the scene's pending changes; read them afterwards with
    /// [`frame_changes`](Self::frame_changes).
    #[tracing::instrument(skip(self))]
    pub fn draw_order(&self) -> Vec<NodeId> {
        let scene = self.scene.upgradable_read();
        if !scene.is_sort_stale() && !scene.has_pending_changes() {
            self.frame.lock().clear();
            return scene.cached_draw_order().to_vec();
        }
        let mut scene = RwLockUpgradableReadGuard::upgrade(scene);
        let order = {
            let mut sink = self.sink.lock();
            scene.draw_order_traced(&mut tracer_for(&mut sink)).to_vec()
        };
        let mut frame = self.frame.lock();
        scene.take_changes_into(&mut *frame);
        tracing::trace!(
            added = frame.added.len(),
            removed = frame.removed.len(),
            "drained frame changes"
        );
        order
    }

    /// What changed between the last two [`draw_order`](Self::draw_order)
    /// calls.
    pub fn frame_changes(&self) -> NodeChanges {
        self.frame.lock().clone()
    }

    /// Drains the scene's pending changes now, without sorting.
    ///
    /// For callers that track changes but never ask for a draw order.
    pub fn take_changes(&self) -> NodeChanges {
        self.scene.write().take_changes()
    }

    /// Builds the render plan for the current draw order.
    pub fn render_plan(&self) -> RenderPlan {
        let order = self.draw_order();
        RenderPlan::from_order(&*self.scene.read(), &order)
    }

    /// Paints the buffers of every node bound to `surface` into one of its
    /// layers, replacing the layer's previous pixels.
    ///
    /// Returns the number of node buffers drawn.
    pub fn paint_nodes(&self, surface: SurfaceId, layer: LayerId) -> RenderResult<usize> {
        let order = self.draw_order();
        let scene = self.scene.read();
        let plan = RenderPlan::from_order(&*scene, &order);
        let set = logged("paint_nodes", self.layer_set(surface))?;
        let mut raster = self.raster.lock();
        let mut set = set.write();
        let origin = logged(
            "paint_nodes",
            set.get(layer)
                .map(|l| l.origin())
                .ok_or(RenderError::UnknownLayer(layer)),
        )?;
        let target = set.surface_mut(layer)?;
        let bounds = raster.bounds(target);
        raster.clear(target);
        // Plan bounds are in surface space; move them into the layer's.
        let plan = shift_plan(plan, origin);
        let clip = Rect::new(0.0, 0.0, f64::from(bounds.width), f64::from(bounds.height));
        Ok(paint_plan(&mut *raster, target, &*scene, &plan, surface, clip))
    }

    /// Read-only counts, answered under reader locks.
    pub fn stats(&self) -> StageStats {
        let (nodes, sort_stale) = {
            let scene = self.scene.read();
            (scene.count(), scene.is_sort_stale())
        };
        let surfaces = self.surfaces.read();
        let layers = surfaces.values().map(|set| set.read().len()).sum();
        StageStats {
            nodes,
            surfaces: surfaces.len(),
            layers,
            sort_stale,
        }
    }

    /// Runs `f` with shared access to the scene graph.
    pub fn with_scene<T>(&self, f: impl FnOnce(&SceneGraph<R::Surface>) -> T) -> T {
        f(&self.scene.read())
    }

    // -- Internals ---------------------------------------------------------

    fn layer_set(&self, id: SurfaceId) -> RenderResult<SharedSet<R::Surface>> {
        self.surfaces
            .read()
            .get(&id)
            .cloned()
            .ok_or(RenderError::UnknownSurface(id))
    }

    /// Applies a scene mutation and damages what `id` covered before and
    /// after it.
    fn mutate<T>(
        &self,
        op: &'static str,
        id: NodeId,
        f: impl FnOnce(&mut SceneGraph<R::Surface>) -> SceneResult<T>,
    ) -> RenderResult<T> {
        let (result, before, after) = {
            let mut scene = self.scene.write();
            let before = footprint(&*scene, id);
            let result = f(&mut *scene);
            let after = footprint(&*scene, id);
            (result, before, after)
        };
        let value = logged(op, result.map_err(RenderError::from))?;
        for (surface, rect) in before.into_iter().chain(after) {
            // A node may point at a surface that was removed.
            if let Ok(set) = self.layer_set(surface) {
                set.write().add_dirty_region(rect);
            }
        }
        Ok(value)
    }
}

/// The surface-space rectangles covered by `id`'s subtree, one per surface
/// its nodes draw into.
fn footprint<B>(scene: &SceneGraph<B>, id: NodeId) -> Vec<(SurfaceId, Rect)> {
    scene.subtree_bounds_by_surface(id).unwrap_or_default()
}

fn shift_plan(mut plan: RenderPlan, origin: Point) -> RenderPlan {
    let offset = origin.to_vec2();
    for item in &mut plan.items {
        item.bounds = item.bounds - offset;
    }
    plan
}

fn tracer_for(sink: &mut Option<BoxedSink>) -> Tracer<'_> {
    match sink {
        Some(sink) => Tracer::new(&mut **sink),
        None => Tracer::none(),
    }
}

fn logged<T>(op: &'static str, result: RenderResult<T>) -> RenderResult<T> {
    result.inspect_err(|error| tracing::warn!(op, %error, "stage operation failed"))
}
