// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface grouping of role-tagged layers with dirty tracking.

use kurbo::{Point, Rect};
use proscenium_core::node::SurfaceId;
use proscenium_core::sequence::SequenceAllocator;

use crate::compositor::CompositeStats;
use crate::damage::Damage;
use crate::error::{RenderError, RenderResult};
use crate::layer::{Layer, LayerId, LayerRole, sanitize_opacity};

/// The layers of one rendering surface plus its cached composite.
///
/// Draw order is fixed by role: the background, then the drawing layer,
/// then foreground and overlay layers merged by one shared z-order. The
/// z-order counter is shared between both element roles so that sprites and
/// text interleave in the order they were placed.
///
/// Every mutation records the affected rectangle in the set's [`Damage`];
/// [`composite`](Self::composite) redraws only that region.
#[derive(Debug)]
pub struct LayerSet<S> {
    surface: SurfaceId,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) background: Option<(LayerId, Layer<S>)>,
    pub(crate) drawing: Option<(LayerId, Layer<S>)>,
    /// Foreground and overlay layers, sorted by `(z, id)`.
    pub(crate) elements: Vec<(LayerId, Layer<S>)>,
    z_orders: SequenceAllocator<()>,
    next_id: u32,
    pub(crate) damage: Damage,
    pub(crate) buffer: Option<S>,
    pub(crate) buffer_size: (u32, u32),
    pub(crate) last_visible: Option<Rect>,
    pub(crate) stats: CompositeStats,
}

impl<S> LayerSet<S> {
    /// Creates an empty set for a `width` x `height` surface.
    pub fn new(surface: SurfaceId, width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        Ok(Self {
            surface,
            width,
            height,
            background: None,
            drawing: None,
            elements: Vec::new(),
            z_orders: SequenceAllocator::new(),
            next_id: 0,
            damage: Damage::Full,
            buffer: None,
            buffer_size: (0, 0),
            last_visible: None,
            stats: CompositeStats::default(),
        })
    }

    /// The surface this set composites.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The full surface rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Changes the surface size. The next composite reallocates the buffer
    /// and redraws everything.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.damage.mark_full();
        }
        Ok(())
    }

    // -- Z-order --

    /// Reserves the next z-order for a foreground element.
    pub fn next_foreground_order(&mut self) -> u32 {
        self.z_orders.next(())
    }

    /// Reserves the next z-order for an overlay element.
    ///
    /// Shares its counter with [`next_foreground_order`](Self::next_foreground_order).
    pub fn next_overlay_order(&mut self) -> u32 {
        self.z_orders.next(())
    }

    // -- Layer management --

    /// Adds a layer in the slot named by its role and returns its id.
    ///
    /// A background or drawing layer replaces the previous occupant of its
    /// slot. Element layers receive the next shared z-order and so draw in
    /// front of every element added before them.
    pub fn insert(&mut self, layer: Layer<S>) -> LayerId {
        let z = if layer.role.is_element() {
            self.z_orders.next(())
        } else {
            0
        };
        self.insert_at(layer, z)
    }

    /// Adds a layer with a z-order previously reserved through
    /// [`next_foreground_order`](Self::next_foreground_order) or
    /// [`next_overlay_order`](Self::next_overlay_order).
    ///
    /// `z` is ignored for background and drawing layers.
    pub fn insert_at(&mut self, mut layer: Layer<S>, z: u32) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        layer.dirty = true;
        match layer.role {
            LayerRole::Background => {
                layer.z = 0;
                self.background = Some((id, layer));
                self.damage.mark_full();
            }
            LayerRole::Drawing => {
                layer.z = 0;
                self.damage.add_rect(layer.bounds());
                if let Some((_, old)) = self.drawing.replace((id, layer)) {
                    self.damage.add_rect(old.bounds());
                }
            }
            LayerRole::Foreground | LayerRole::Overlay => {
                layer.z = z;
                self.damage.add_rect(layer.bounds());
                let at = self
                    .elements
                    .partition_point(|(other, l)| (l.z, *other) < (z, id));
                self.elements.insert(at, (id, layer));
            }
        }
        tracing::trace!(surface = ?self.surface, ?id, z, "inserted layer");
        id
    }

    /// Removes a layer, returning it.
    pub fn remove(&mut self, id: LayerId) -> RenderResult<Layer<S>> {
        let layer = if self.background.as_ref().is_some_and(|(b, _)| *b == id) {
            self.damage.mark_full();
            self.background.take().map(|(_, l)| l)
        } else if self.drawing.as_ref().is_some_and(|(d, _)| *d == id) {
            self.drawing.take().map(|(_, l)| l)
        } else {
            self.elements
                .iter()
                .position(|(e, _)| *e == id)
                .map(|pos| self.elements.remove(pos).1)
        };
        let layer = layer.ok_or(RenderError::UnknownLayer(id))?;
        self.damage.add_rect(layer.bounds());
        Ok(layer)
    }

    /// Returns a layer by id.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&Layer<S>> {
        self.slots().find(|(l, _)| *l == id).map(|(_, layer)| layer)
    }

    /// Moves a layer. Both the old and the new bounds become dirty.
    pub fn set_origin(&mut self, id: LayerId, origin: Point) -> RenderResult<()> {
        let layer = self.get_mut(id)?;
        let old = layer.bounds();
        layer.origin = origin.round();
        layer.dirty = true;
        let new = layer.bounds();
        self.damage.add_rect(old);
        self.damage.add_rect(new);
        Ok(())
    }

    /// Shows or hides a layer.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> RenderResult<()> {
        let layer = self.get_mut(id)?;
        if layer.visible != visible {
            layer.visible = visible;
            layer.dirty = true;
            let bounds = layer.bounds();
            self.damage.add_rect(bounds);
        }
        Ok(())
    }

    /// Sets a layer's opacity, clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) -> RenderResult<()> {
        let layer = self.get_mut(id)?;
        layer.opacity = sanitize_opacity(opacity);
        layer.dirty = true;
        let bounds = layer.bounds();
        self.damage.add_rect(bounds);
        Ok(())
    }

    /// Declares whether a layer's content is fully opaque.
    pub fn set_opaque(&mut self, id: LayerId, opaque: bool) -> RenderResult<()> {
        let layer = self.get_mut(id)?;
        layer.opaque = opaque;
        layer.dirty = true;
        let bounds = layer.bounds();
        self.damage.add_rect(bounds);
        Ok(())
    }

    /// Gives mutable access to a layer's pixels and marks the whole layer
    /// dirty.
    pub fn surface_mut(&mut self, id: LayerId) -> RenderResult<&mut S> {
        let bounds = self.get(id).map(Layer::bounds);
        self.damage.add_rect(bounds.ok_or(RenderError::UnknownLayer(id))?);
        let layer = self.get_mut(id)?;
        layer.dirty = true;
        Ok(&mut layer.surface)
    }

    /// Number of layers in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.background.is_some())
            + usize::from(self.drawing.is_some())
            + self.elements.len()
    }

    /// Returns `true` if the set holds no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layer ids in draw order, back to front.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.slots().map(|(id, _)| id).collect()
    }

    // -- Dirty tracking --

    /// Unions `rect` into the region redrawn by the next composite.
    pub fn add_dirty_region(&mut self, rect: Rect) {
        self.damage.add_rect(rect);
    }

    /// Forces the next composite to redraw the whole visible region.
    pub fn mark_fully_dirty(&mut self) {
        self.damage.mark_full();
    }

    /// Pending damage.
    #[must_use]
    pub fn damage(&self) -> Damage {
        self.damage
    }

    /// Returns `true` if the next composite has anything to redraw.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.damage.is_empty() || self.slots().any(|(_, l)| l.dirty)
    }

    /// The cached composite buffer, if one has been produced.
    #[must_use]
    pub fn buffer(&self) -> Option<&S> {
        self.buffer.as_ref()
    }

    /// Statistics of the most recent composite.
    #[must_use]
    pub fn last_stats(&self) -> CompositeStats {
        self.stats
    }

    // -- Internal helpers --

    /// Every layer with its id, in draw order.
    pub(crate) fn slots(&self) -> impl Iterator<Item = (LayerId, &Layer<S>)> + '_ {
        self.background
            .iter()
            .chain(self.drawing.iter())
            .chain(self.elements.iter())
            .map(|(id, layer)| (*id, layer))
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut Layer<S>> + '_ {
        self.background
            .iter_mut()
            .chain(self.drawing.iter_mut())
            .chain(self.elements.iter_mut())
            .map(|(_, layer)| layer)
    }

    fn get_mut(&mut self, id: LayerId) -> RenderResult<&mut Layer<S>> {
        self.background
            .iter_mut()
            .chain(self.drawing.iter_mut())
            .chain(self.elements.iter_mut())
            .find(|(l, _)| *l == id)
            .map(|(_, layer)| layer)
            .ok_or(RenderError::UnknownLayer(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(role: LayerRole, x: f64, y: f64, w: u32, h: u32) -> Layer<()> {
        Layer::from_surface(role, (), w, h).unwrap().with_origin(Point::new(x, y))
    }

    fn settled() -> LayerSet<()> {
        let mut set = LayerSet::new(SurfaceId(0), 100, 100).unwrap();
        set.damage.clear();
        set
    }

    #[test]
    fn zero_sized_set_is_rejected() {
        assert_eq!(
            LayerSet::<()>::new(SurfaceId(0), 0, 10).unwrap_err(),
            RenderError::InvalidDimensions {
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn roles_fix_draw_order() {
        let mut set = settled();
        let cast = set.insert(layer(LayerRole::Foreground, 0.0, 0.0, 5, 5));
        let text = set.insert(layer(LayerRole::Overlay, 0.0, 0.0, 5, 5));
        let cast2 = set.insert(layer(LayerRole::Foreground, 0.0, 0.0, 5, 5));
        let drawing = set.insert(layer(LayerRole::Drawing, 0.0, 0.0, 5, 5));
        let bg = set.insert(layer(LayerRole::Background, 0.0, 0.0, 100, 100));
        assert_eq!(set.layer_ids(), vec![bg, drawing, cast, text, cast2]);
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn element_orders_are_shared() {
        let mut set = settled();
        assert_eq!(set.next_foreground_order(), 0);
        assert_eq!(set.next_overlay_order(), 1);
        assert_eq!(set.next_foreground_order(), 2);

        // A reserved order slots in between later insertions.
        let mut set = settled();
        let reserved = set.next_overlay_order();
        let a = set.insert(layer(LayerRole::Foreground, 0.0, 0.0, 1, 1));
        let b = set.insert_at(layer(LayerRole::Overlay, 0.0, 0.0, 1, 1), reserved);
        assert_eq!(set.layer_ids(), vec![b, a]);
    }

    #[test]
    fn mutations_record_damage() {
        let mut set = settled();
        let id = set.insert(layer(LayerRole::Foreground, 10.0, 10.0, 10, 10));
        assert_eq!(set.damage(), Damage::Region(Rect::new(10.0, 10.0, 20.0, 20.0)));

        set.damage.clear();
        set.set_origin(id, Point::new(50.0, 10.0)).unwrap();
        assert_eq!(set.damage(), Damage::Region(Rect::new(10.0, 10.0, 60.0, 20.0)));

        set.damage.clear();
        set.remove(id).unwrap();
        assert_eq!(set.damage(), Damage::Region(Rect::new(50.0, 10.0, 60.0, 20.0)));
        assert_eq!(set.remove(id).unwrap_err(), RenderError::UnknownLayer(id));
    }

    #[test]
    fn background_changes_are_full() {
        let mut set = settled();
        let bg = set.insert(layer(LayerRole::Background, 0.0, 0.0, 10, 10));
        assert!(set.damage().is_full());
        set.damage.clear();
        set.remove(bg).unwrap();
        assert!(set.damage().is_full());
    }

    #[test]
    fn unknown_layers_are_reported() {
        let mut set = settled();
        let ghost = LayerId(42);
        assert!(set.get(ghost).is_none());
        assert_eq!(
            set.set_visible(ghost, false),
            Err(RenderError::UnknownLayer(ghost))
        );
        assert_eq!(
            set.surface_mut(ghost).unwrap_err(),
            RenderError::UnknownLayer(ghost)
        );
    }

    #[test]
    fn resize_forces_full_redraw() {
        let mut set = settled();
        set.resize(100, 100).unwrap();
        assert!(set.damage().is_empty());
        set.resize(200, 100).unwrap();
        assert!(set.damage().is_full());
        assert_eq!(set.size(), (200, 100));
        assert!(set.resize(0, 0).is_err());
    }
}
