// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage-clipped, occlusion-culled compositing of a layer set.
//!
//! A composite pass walks the set's layers back to front and, for each one:
//!
//! 1. skips it if it is invisible, fully transparent or empty;
//! 2. clips its bounds to the visible rect and to the damaged region,
//!    skipping it if nothing is left;
//! 3. skips it if a fully opaque layer above hides it entirely
//!    ([`is_overwrite_skippable`]);
//! 4. otherwise draws just the clipped part into the composite buffer.
//!
//! The region about to be redrawn is cleared first, so the result depends
//! only on the layers, never on what the buffer held before.

use kurbo::Rect;
use proscenium_core::geometry::{self, PixelRect};
use proscenium_core::node::SurfaceId;
use proscenium_core::trace::{CompositeEvent, Tracer};

use crate::config::CompositorConfig;
use crate::error::RenderResult;
use crate::layer::Layer;
use crate::layer_set::LayerSet;
use crate::raster::Rasterizer;

/// What the most recent composite of a layer set did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompositeStats {
    /// `true` if nothing was dirty and the cached buffer was returned.
    pub cached: bool,
    /// Region that was cleared and redrawn.
    pub redrawn: Option<Rect>,
    /// Layers that issued a draw.
    pub drawn: usize,
    /// Layers skipped for being invisible, transparent or empty.
    pub skipped_hidden: usize,
    /// Layers skipped for lying outside the visible or damaged region.
    pub skipped_clipped: usize,
    /// Layers skipped because an opaque layer above covers them.
    pub skipped_covered: usize,
}

impl CompositeStats {
    /// Converts to a trace event for `surface`.
    #[must_use]
    pub fn to_event(&self, surface: SurfaceId) -> CompositeEvent {
        CompositeEvent {
            surface,
            cached: self.cached,
            damage: self.redrawn,
            drawn: self.drawn,
            skipped_hidden: self.skipped_hidden,
            skipped_clipped: self.skipped_clipped,
            skipped_covered: self.skipped_covered,
        }
    }
}

/// Returns `true` if `layers[index]` is entirely hidden by a layer above it.
///
/// The layer is hidden when some later layer is visible, fully opaque, and
/// its bounds clipped to `visible` properly contain the lower layer's bounds
/// clipped to `visible`. Partial, translucent or invisible coverage never
/// hides anything, and neither does a cover that merely coincides with the
/// lower layer.
#[must_use]
pub fn is_overwrite_skippable<S>(layers: &[&Layer<S>], index: usize, visible: Rect) -> bool {
    let Some(lower) = layers.get(index) else {
        return false;
    };
    let Some(target) = geometry::intersect(lower.bounds(), visible) else {
        return false;
    };
    layers[index + 1..].iter().any(|upper| {
        upper.is_fully_opaque()
            && geometry::intersect(upper.bounds(), visible)
                .is_some_and(|cover| cover != target && geometry::contains(cover, target))
    })
}

impl<S> LayerSet<S> {
    /// Composites every layer into the set's buffer and returns it.
    ///
    /// - An empty `visible` rect (after clipping to the surface) returns the
    ///   current buffer untouched, which is `None` before the first composite.
    /// - A size change reallocates the buffer and redraws everything.
    /// - With nothing dirty the cached buffer is returned as is.
    ///
    /// Afterward every layer, the damage and the full-redraw flag are clean.
    pub fn composite<R>(
        &mut self,
        raster: &mut R,
        visible: Rect,
        config: &CompositorConfig,
    ) -> RenderResult<Option<&S>>
    where
        R: Rasterizer<Surface = S>,
    {
        self.composite_traced(raster, visible, config, &mut Tracer::none())
    }

    /// Like [`composite`](Self::composite), reporting the pass to `tracer`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "layer origins are whole pixels inside the i32 range"
    )]
    pub fn composite_traced<R>(
        &mut self,
        raster: &mut R,
        visible: Rect,
        config: &CompositorConfig,
        tracer: &mut Tracer<'_>,
    ) -> RenderResult<Option<&S>>
    where
        R: Rasterizer<Surface = S>,
    {
        let Some(visible) = geometry::intersect(visible, self.bounds()) else {
            return Ok(self.buffer.as_ref());
        };

        let size = (self.width, self.height);
        let mut buffer = match self.buffer.take() {
            Some(buffer) if self.buffer_size == size => buffer,
            _ => {
                self.damage.mark_full();
                let buffer = raster.new_surface(self.width, self.height)?;
                self.buffer_size = size;
                buffer
            }
        };
        if self.last_visible != Some(visible) {
            // Pixels outside the old visible rect were never drawn.
            self.damage.mark_full();
            self.last_visible = Some(visible);
        }
        let dirty_layers: Vec<Rect> = self
            .slots()
            .filter(|(_, layer)| layer.dirty)
            .map(|(_, layer)| layer.bounds())
            .collect();
        for bounds in dirty_layers {
            self.damage.add_rect(bounds);
        }

        if self.damage.is_empty() {
            self.stats = CompositeStats {
                cached: true,
                ..CompositeStats::default()
            };
            tracer.composite(&self.stats.to_event(self.surface_id()));
            self.buffer = Some(buffer);
            return Ok(self.buffer.as_ref());
        }

        let region = if config.clip_to_damage {
            self.damage.region_within(visible)
        } else {
            Some(visible)
        };
        let mut stats = CompositeStats {
            redrawn: region,
            ..CompositeStats::default()
        };

        if let Some(region) = region {
            if let Some(px) = PixelRect::from_rect(region) {
                raster.clear_region(&mut buffer, px);
            }
            let ordered: Vec<&Layer<S>> = self.slots().map(|(_, layer)| layer).collect();
            for (index, layer) in ordered.iter().enumerate() {
                let bounds = layer.bounds();
                if !layer.visible || layer.opacity <= 0.0 || geometry::is_empty(bounds) {
                    stats.skipped_hidden += 1;
                    continue;
                }
                let Some(clip) = geometry::intersect(bounds, visible)
                    .and_then(|clip| geometry::intersect(clip, region))
                else {
                    stats.skipped_clipped += 1;
                    continue;
                };
                if config.overwrite_skip && is_overwrite_skippable(&ordered, index, visible) {
                    tracing::trace!(index, ?bounds, "layer covered, skipping");
                    stats.skipped_covered += 1;
                    continue;
                }
                let Some(dst) = PixelRect::from_rect(clip) else {
                    stats.skipped_clipped += 1;
                    continue;
                };
                let src = PixelRect::new(
                    dst.x - layer.origin.x as i32,
                    dst.y - layer.origin.y as i32,
                    dst.width,
                    dst.height,
                );
                tracing::trace!(index, ?src, ?dst, "drawing layer");
                raster.draw_region(&mut buffer, &layer.surface, src, dst.x, dst.y, &layer.blit());
                stats.drawn += 1;
            }
        }

        for layer in self.slots_mut() {
            layer.dirty = false;
        }
        self.damage.clear();
        self.stats = stats;
        tracer.composite(&stats.to_event(self.surface_id()));
        tracing::debug!(
            surface = ?self.surface_id(),
            drawn = stats.drawn,
            covered = stats.skipped_covered,
            "composited"
        );
        self.buffer = Some(buffer);
        Ok(self.buffer.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;
    use crate::damage::Damage;
    use crate::layer::{LayerId, LayerRole};
    use crate::raster::Blit;

    /// A surface that only knows its size and a name.
    #[derive(Debug)]
    struct Tag {
        name: u32,
        width: u32,
        height: u32,
    }

    #[derive(Debug, PartialEq)]
    enum Call {
        New(u32, u32),
        Clear(PixelRect),
        Draw {
            src: u32,
            rect: PixelRect,
            x: i32,
            y: i32,
        },
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Recorder {
        fn draws(&self) -> Vec<(u32, PixelRect, i32, i32)> {
            self.calls
                .iter()
                .filter_map(|c| match *c {
                    Call::Draw { src, rect, x, y } => Some((src, rect, x, y)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Rasterizer for Recorder {
        type Surface = Tag;

        fn new_surface(&mut self, width: u32, height: u32) -> RenderResult<Tag> {
            self.calls.push(Call::New(width, height));
            Ok(Tag {
                name: u32::MAX,
                width,
                height,
            })
        }

        fn draw_region(
            &mut self,
            _dst: &mut Tag,
            src: &Tag,
            src_rect: PixelRect,
            dst_x: i32,
            dst_y: i32,
            _blit: &Blit,
        ) {
            self.calls.push(Call::Draw {
                src: src.name,
                rect: src_rect,
                x: dst_x,
                y: dst_y,
            });
        }

        fn bounds(&self, surface: &Tag) -> PixelRect {
            PixelRect::new(0, 0, surface.width, surface.height)
        }

        fn clear(&mut self, surface: &mut Tag) {
            self.calls
                .push(Call::Clear(PixelRect::new(0, 0, surface.width, surface.height)));
        }

        fn clear_region(&mut self, _surface: &mut Tag, rect: PixelRect) {
            self.calls.push(Call::Clear(rect));
        }
    }

    fn tagged(name: u32, role: LayerRole, x: f64, y: f64, w: u32, h: u32) -> Layer<Tag> {
        let tag = Tag {
            name,
            width: w,
            height: h,
        };
        Layer::from_surface(role, tag, w, h).unwrap().with_origin(Point::new(x, y))
    }

    const VISIBLE: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    #[test]
    fn coverage_scenario() {
        let lower = Layer::from_surface(LayerRole::Foreground, (), 50, 50)
            .unwrap()
            .with_origin(Point::new(25.0, 25.0))
            .with_opaque(true);
        let big = Layer::from_surface(LayerRole::Foreground, (), 100, 100)
            .unwrap()
            .with_opaque(true);
        assert!(is_overwrite_skippable(&[&lower, &big], 0, VISIBLE));

        let shrunk = Layer::from_surface(LayerRole::Foreground, (), 50, 50)
            .unwrap()
            .with_origin(Point::new(25.0, 25.0))
            .with_opaque(true);
        assert!(!is_overwrite_skippable(&[&lower, &shrunk], 0, VISIBLE));
    }

    #[test]
    fn coverage_requires_opaque_visible_full_cover() {
        let lower = Layer::from_surface(LayerRole::Foreground, (), 50, 50)
            .unwrap()
            .with_origin(Point::new(25.0, 25.0));
        let partial = Layer::from_surface(LayerRole::Foreground, (), 60, 100)
            .unwrap()
            .with_opaque(true);
        assert!(!is_overwrite_skippable(&[&lower, &partial], 0, VISIBLE));

        let translucent = Layer::from_surface(LayerRole::Foreground, (), 100, 100)
            .unwrap()
            .with_opaque(true)
            .with_opacity(0.9);
        assert!(!is_overwrite_skippable(&[&lower, &translucent], 0, VISIBLE));

        let mut hidden =
            Layer::from_surface(LayerRole::Foreground, (), 100, 100).unwrap().with_opaque(true);
        hidden.visible = false;
        assert!(!is_overwrite_skippable(&[&lower, &hidden], 0, VISIBLE));

        // Only layers above count.
        let big = Layer::from_surface(LayerRole::Foreground, (), 100, 100)
            .unwrap()
            .with_opaque(true);
        assert!(!is_overwrite_skippable(&[&big, &lower], 1, VISIBLE));
        assert!(!is_overwrite_skippable(&[&big], 3, VISIBLE));
    }

    #[test]
    fn coverage_is_judged_inside_the_visible_rect() {
        // The cover only spans the visible part of the lower layer.
        let lower = Layer::from_surface(LayerRole::Foreground, (), 50, 50)
            .unwrap()
            .with_origin(Point::new(60.0, 0.0));
        let cover = Layer::from_surface(LayerRole::Foreground, (), 60, 100)
            .unwrap()
            .with_origin(Point::new(40.0, 0.0))
            .with_opaque(true);
        let visible = Rect::new(0.0, 0.0, 80.0, 100.0);
        assert!(is_overwrite_skippable(&[&lower, &cover], 0, visible));
        let wide = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert!(!is_overwrite_skippable(&[&lower, &cover], 0, wide));
    }

    #[test]
    fn second_composite_returns_same_buffer() {
        let mut raster = Recorder::default();
        let mut set = LayerSet::new(SurfaceId(0), 100, 100).unwrap();
        set.insert(tagged(1, LayerRole::Background, 0.0, 0.0, 100, 100));
        let config = CompositorConfig::default();

        let first: *const Tag = set.composite(&mut raster, VISIBLE, &config).unwrap().unwrap();
        let calls = raster.calls.len();
        let second: *const Tag = set.composite(&mut raster, VISIBLE, &config).unwrap().unwrap();
        assert!(core::ptr::eq(first, second));
        assert_eq!(raster.calls.len(), calls, "cached composite issues no calls");
        assert!(set.last_stats().cached);
    }

    #[test]
    fn empty_visible_rect_returns_buffer_unchanged() {
        let mut raster = Recorder::default();
        let mut set = LayerSet::new(SurfaceId(0), 100, 100).unwrap();
        set.insert(tagged(1, LayerRole::Foreground, 0.0, 0.0, 10, 10));
        let config = CompositorConfig::default();
        assert!(set.composite(&mut raster, Rect::ZERO, &config).unwrap().is_none());
        assert!(raster.calls.is_empty());
        assert!(set.is_dirty());

        set.composite(&mut raster, VISIBLE, &config).unwrap();
        raster.calls.clear();
        let outside = Rect::new(500.0, 500.0, 600.0, 600.0);
        assert!(set.composite(&mut raster, outside, &config).unwrap().is_some());
        assert!(raster.calls.is_empty());
    }

    #[test]
    fn disjoint_layer_draws_nothing_and_partial_draws_intersection() {
        let mut raster = Recorder::default();
        let mut set = LayerSet::new(SurfaceId(0), 200, 200).unwrap();
        set.insert(tagged(1, LayerRole::Foreground, 150.0, 150.0, 20, 20));
        set.insert(tagged(2, LayerRole::Foreground, 90.0, 80.0, 20, 30));
        set.composite(&mut raster, VISIBLE, &CompositorConfig::default())
            .unwrap();

        assert_eq!(
            raster.draws(),
            vec![(2, PixelRect::new(0, 0, 10, 20), 90, 80)]
        );
        let stats = set.last_stats();
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.skipped_clipped, 1);
    }

    #[test]
    fn covered_layer_is_skipped_only_when_enabled() {
        let build = || {
            let mut set = LayerSet::new(SurfaceId(0), 100, 100).unwrap();
            set.insert(tagged(1, LayerRole::Foreground, 25.0, 25.0, 50, 50).with_opaque(true));
            set.insert(tagged(2, LayerRole::Foreground, 0.0, 0.0, 100, 100).with_opaque(true));
            set
        };

        let mut raster = Recorder::default();
        let mut set = build();
        set.composite(&mut raster, VISIBLE, &CompositorConfig::DEFAULT)
            .unwrap();
        let drawn: Vec<u32> = raster.draws().iter().map(|d| d.0).collect();
        assert_eq!(drawn, vec![2]);
        assert_eq!(set.last_stats().skipped_covered, 1);

        let mut raster = Recorder::default();
        let mut set = build();
        set.composite(&mut raster, VISIBLE, &CompositorConfig::new(false, true))
            .unwrap();
        let drawn: Vec<u32> = raster.draws().iter().map(|d| d.0).collect();
        assert_eq!(drawn, vec![1, 2]);
    }

    #[test]
    fn only_the_damaged_region_is_redrawn() {
        let mut raster = Recorder::default();
        let mut set = LayerSet::new(SurfaceId(0), 100, 100).unwrap();
        set.insert(tagged(1, LayerRole::Background, 0.0, 0.0, 100, 100));
        let sprite = set.insert(tagged(2, LayerRole::Foreground, 10.0, 10.0, 10, 10));
        let config = CompositorConfig::default();
        set.composite(&mut raster, VISIBLE, &config).unwrap();

        raster.calls.clear();
        set.set_origin(sprite, Point::new(30.0, 10.0)).unwrap();
        set.composite(&mut raster, VISIBLE, &config).unwrap();
        assert_eq!(raster.calls[0], Call::Clear(PixelRect::new(10, 10, 30, 10)));
        assert_eq!(
            raster.draws(),
            vec![
                (1, PixelRect::new(10, 10, 30, 10), 10, 10),
                (2, PixelRect::new(0, 0, 10, 10), 30, 10),
            ]
        );
        assert!(!set.is_dirty());
        assert_eq!(set.damage(), Damage::None);
    }

    #[test]
    fn resize_reallocates_and_redraws_everything() {
        let mut raster = Recorder::default();
        let mut set = LayerSet::new(SurfaceId(0), 100, 100).unwrap();
        set.insert(tagged(1, LayerRole::Background, 0.0, 0.0, 100, 100));
        let config = CompositorConfig::default();
        set.composite(&mut raster, VISIBLE, &config).unwrap();

        raster.calls.clear();
        set.resize(50, 50).unwrap();
        set.composite(&mut raster, VISIBLE, &config).unwrap();
        assert_eq!(raster.calls[0], Call::New(50, 50));
        assert_eq!(
            set.last_stats().redrawn,
            Some(Rect::new(0.0, 0.0, 50.0, 50.0))
        );
    }

    #[test]
    fn hidden_layers_are_counted() {
        let mut raster = Recorder::default();
        let mut set = LayerSet::new(SurfaceId(0), 100, 100).unwrap();
        let a = set.insert(tagged(1, LayerRole::Overlay, 0.0, 0.0, 10, 10));
        set.insert(tagged(2, LayerRole::Overlay, 0.0, 0.0, 10, 10).with_opacity(0.0));
        set.set_visible(a, false).unwrap();
        set.composite(&mut raster, VISIBLE, &CompositorConfig::default())
            .unwrap();
        assert!(raster.draws().is_empty());
        assert_eq!(set.last_stats().skipped_hidden, 2);
        assert!(set.get(LayerId(0)).is_some());
    }
}
