// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rasterizing collaborator the compositor draws through.
//!
//! Pixel-level primitives live outside this crate. A [`Rasterizer`] only has
//! to allocate blank surfaces, copy rectangular regions between them, and
//! clear them. [`PixmapRasterizer`](crate::PixmapRasterizer) is a CPU
//! implementation on top of tiny-skia.

use proscenium_core::geometry::PixelRect;

use crate::error::RenderResult;

/// Per-draw options for [`Rasterizer::draw_region`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blit {
    /// Opacity multiplier applied to the source (0.0–1.0).
    pub opacity: f32,
    /// Source pixels of exactly this RGB color are treated as transparent.
    pub color_key: Option<[u8; 3]>,
}

impl Blit {
    /// A plain, fully opaque copy.
    pub const OPAQUE: Self = Self {
        opacity: 1.0,
        color_key: None,
    };

    /// Creates blit options.
    #[must_use]
    pub const fn new(opacity: f32, color_key: Option<[u8; 3]>) -> Self {
        Self { opacity, color_key }
    }
}

impl Default for Blit {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Allocates and draws pixel surfaces.
pub trait Rasterizer {
    /// The surface type this rasterizer draws on.
    type Surface;

    /// Allocates a blank, fully transparent surface.
    fn new_surface(&mut self, width: u32, height: u32) -> RenderResult<Self::Surface>;

    /// Source-over draws `src_rect` of `src` into `dst` with its top-left
    /// corner at `(dst_x, dst_y)`.
    ///
    /// Parts of `src_rect` outside `src`, or landing outside `dst`, are
    /// ignored.
    fn draw_region(
        &mut self,
        dst: &mut Self::Surface,
        src: &Self::Surface,
        src_rect: PixelRect,
        dst_x: i32,
        dst_y: i32,
        blit: &Blit,
    );

    /// The full extent of `surface`, anchored at the origin.
    fn bounds(&self, surface: &Self::Surface) -> PixelRect;

    /// Resets every pixel of `surface` to transparent.
    fn clear(&mut self, surface: &mut Self::Surface);

    /// Resets the pixels of `surface` inside `rect` to transparent, leaving
    /// everything outside it untouched.
    fn clear_region(&mut self, surface: &mut Self::Surface, rect: PixelRect);
}
