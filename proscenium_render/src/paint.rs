// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting node buffers from a render plan.

use kurbo::Rect;
use proscenium_core::geometry::{self, PixelRect};
use proscenium_core::node::{SceneGraph, SurfaceId};
use proscenium_core::plan::RenderPlan;

use crate::raster::{Blit, Rasterizer};

/// Draws the buffers of every `plan` item bound to `surface` into `target`,
/// back to front, limited to `clip`.
///
/// Items whose node has no buffer are skipped. Each buffer is drawn with its
/// top-left corner at the item's world origin and the item's effective
/// opacity. Returns the number of buffers drawn.
#[expect(
    clippy::cast_possible_truncation,
    reason = "item origins are rounded and lie inside the i32 range"
)]
pub fn paint_plan<R: Rasterizer>(
    raster: &mut R,
    target: &mut R::Surface,
    graph: &SceneGraph<R::Surface>,
    plan: &RenderPlan,
    surface: SurfaceId,
    clip: Rect,
) -> usize {
    let mut drawn = 0;
    for item in plan.for_surface(surface) {
        let Ok(Some(buffer)) = graph.buffer(item.node) else {
            continue;
        };
        let Some(area) = geometry::intersect(item.bounds, clip) else {
            continue;
        };
        let Some(dst) = PixelRect::from_rect(area) else {
            continue;
        };
        let origin = item.bounds.origin().round();
        let src = PixelRect::new(
            dst.x - origin.x as i32,
            dst.y - origin.y as i32,
            dst.width,
            dst.height,
        );
        raster.draw_region(target, buffer, src, dst.x, dst.y, &Blit::new(item.opacity, None));
        drawn += 1;
    }
    tracing::trace!(surface = surface.0, drawn, "painted plan");
    drawn
}
