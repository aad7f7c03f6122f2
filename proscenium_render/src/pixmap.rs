// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU rasterizer backed by tiny-skia.

use proscenium_core::geometry::PixelRect;
use tiny_skia::{Color, IntRect, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

use crate::error::{RenderError, RenderResult};
use crate::raster::{Blit, Rasterizer};

/// A [`Rasterizer`] drawing on [`tiny_skia::Pixmap`] surfaces.
///
/// Region copies are pixel-aligned, so an opaque source drawn at full
/// opacity reproduces its pixels exactly.
#[derive(Clone, Copy, Debug, Default)]
pub struct PixmapRasterizer;

impl PixmapRasterizer {
    /// Creates the rasterizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for PixmapRasterizer {
    type Surface = Pixmap;

    fn new_surface(&mut self, width: u32, height: u32) -> RenderResult<Pixmap> {
        // Pixmap::new starts out transparent.
        Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })
    }

    fn draw_region(
        &mut self,
        dst: &mut Pixmap,
        src: &Pixmap,
        src_rect: PixelRect,
        dst_x: i32,
        dst_y: i32,
        blit: &Blit,
    ) {
        let Some(clipped) = clip_to(src_rect, src.width(), src.height()) else {
            return;
        };
        let dst_x = dst_x + (clipped.x - src_rect.x);
        let dst_y = dst_y + (clipped.y - src_rect.y);
        let Some(rect) = IntRect::from_xywh(clipped.x, clipped.y, clipped.width, clipped.height)
        else {
            return;
        };
        let Some(mut region) = src.clone_rect(rect) else {
            return;
        };
        if let Some(key) = blit.color_key {
            apply_color_key(&mut region, key);
        }
        let paint = PixmapPaint {
            opacity: blit.opacity.clamp(0.0, 1.0),
            ..PixmapPaint::default()
        };
        dst.draw_pixmap(
            dst_x,
            dst_y,
            region.as_ref(),
            &paint,
            Transform::identity(),
            None,
        );
    }

    fn bounds(&self, surface: &Pixmap) -> PixelRect {
        PixelRect::new(0, 0, surface.width(), surface.height())
    }

    fn clear(&mut self, surface: &mut Pixmap) {
        surface.fill(Color::TRANSPARENT);
    }

    fn clear_region(&mut self, surface: &mut Pixmap, rect: PixelRect) {
        let width = surface.width() as usize;
        let Some(clipped) = clip_to(rect, surface.width(), surface.height()) else {
            return;
        };
        let x0 = clipped.x as usize;
        let x1 = x0 + clipped.width as usize;
        let pixels = surface.pixels_mut();
        for y in clipped.y as usize..clipped.y as usize + clipped.height as usize {
            pixels[y * width + x0..y * width + x1].fill(PremultipliedColorU8::TRANSPARENT);
        }
    }
}

/// Intersects `rect` with a `width` x `height` surface anchored at the origin.
#[expect(
    clippy::cast_possible_truncation,
    reason = "both extents are bounded by u32 inputs"
)]
fn clip_to(rect: PixelRect, width: u32, height: u32) -> Option<PixelRect> {
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = (i64::from(rect.x) + i64::from(rect.width)).min(i64::from(width));
    let y1 = (i64::from(rect.y) + i64::from(rect.height)).min(i64::from(height));
    if x1 <= i64::from(x0) || y1 <= i64::from(y0) {
        return None;
    }
    Some(PixelRect::new(
        x0,
        y0,
        (x1 - i64::from(x0)) as u32,
        (y1 - i64::from(y0)) as u32,
    ))
}

/// Zeroes every pixel whose color matches `key`.
fn apply_color_key(pixmap: &mut Pixmap, key: [u8; 3]) {
    for px in pixmap.pixels_mut() {
        let c = px.demultiply();
        if c.alpha() > 0 && [c.red(), c.green(), c.blue()] == key {
            *px = PremultipliedColorU8::TRANSPARENT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, r: u8, g: u8, b: u8) -> Pixmap {
        let mut pm = Pixmap::new(width, height).unwrap();
        pm.fill(Color::from_rgba8(r, g, b, 255));
        pm
    }

    fn rgba(pm: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pm.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        let mut r = PixmapRasterizer::new();
        assert_eq!(
            r.new_surface(0, 10).unwrap_err(),
            RenderError::InvalidDimensions {
                width: 0,
                height: 10
            }
        );
        let pm = r.new_surface(3, 2).unwrap();
        assert_eq!(r.bounds(&pm), PixelRect::new(0, 0, 3, 2));
        assert_eq!(rgba(&pm, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn draw_region_copies_at_offset() {
        let mut r = PixmapRasterizer::new();
        let mut dst = r.new_surface(10, 10).unwrap();
        let src = solid(4, 4, 255, 0, 0);
        r.draw_region(&mut dst, &src, PixelRect::new(1, 1, 2, 2), 5, 6, &Blit::OPAQUE);
        assert_eq!(rgba(&dst, 5, 6), [255, 0, 0, 255]);
        assert_eq!(rgba(&dst, 6, 7), [255, 0, 0, 255]);
        assert_eq!(rgba(&dst, 7, 6), [0, 0, 0, 0]);
        assert_eq!(rgba(&dst, 4, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn draw_region_clips_source() {
        let mut r = PixmapRasterizer::new();
        let mut dst = r.new_surface(10, 10).unwrap();
        let src = solid(4, 4, 0, 255, 0);
        // Asks for 3 pixels left of the source; only the overlap is drawn,
        // shifted so source pixels keep their destination position.
        r.draw_region(&mut dst, &src, PixelRect::new(-3, 0, 5, 1), 0, 0, &Blit::OPAQUE);
        assert_eq!(rgba(&dst, 2, 0), [0, 0, 0, 0]);
        assert_eq!(rgba(&dst, 3, 0), [0, 255, 0, 255]);
        assert_eq!(rgba(&dst, 4, 0), [0, 255, 0, 255]);
        assert_eq!(rgba(&dst, 5, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn color_key_pixels_are_transparent() {
        let mut r = PixmapRasterizer::new();
        let mut dst = solid(2, 1, 0, 0, 255);
        let mut src = solid(2, 1, 255, 255, 255);
        src.pixels_mut()[1] = PremultipliedColorU8::from_rgba(10, 20, 30, 255).unwrap();
        let blit = Blit::new(1.0, Some([255, 255, 255]));
        r.draw_region(&mut dst, &src, PixelRect::new(0, 0, 2, 1), 0, 0, &blit);
        assert_eq!(rgba(&dst, 0, 0), [0, 0, 255, 255]);
        assert_eq!(rgba(&dst, 1, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn clear_region_leaves_outside_untouched() {
        let mut r = PixmapRasterizer::new();
        let mut pm = solid(4, 4, 9, 9, 9);
        r.clear_region(&mut pm, PixelRect::new(1, 1, 10, 1));
        assert_eq!(rgba(&pm, 0, 1), [9, 9, 9, 255]);
        assert_eq!(rgba(&pm, 1, 1), [0, 0, 0, 0]);
        assert_eq!(rgba(&pm, 3, 1), [0, 0, 0, 0]);
        assert_eq!(rgba(&pm, 1, 2), [9, 9, 9, 255]);
        r.clear(&mut pm);
        assert_eq!(rgba(&pm, 0, 0), [0, 0, 0, 0]);
    }
}
