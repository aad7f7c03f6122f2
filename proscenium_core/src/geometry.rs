// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned rectangle arithmetic shared by dirty tracking and culling.
//!
//! All rectangles are [`kurbo::Rect`] values in surface pixel space. A
//! rectangle with zero or negative area is treated as empty everywhere.

use kurbo::Rect;

/// Returns `true` if `rect` covers no pixels.
#[inline]
#[must_use]
pub fn is_empty(rect: Rect) -> bool {
    !(rect.x1 > rect.x0 && rect.y1 > rect.y0)
}

/// Intersects two rectangles, returning `None` when they do not overlap.
#[must_use]
pub fn intersect(a: Rect, b: Rect) -> Option<Rect> {
    let r = a.intersect(b);
    if is_empty(r) { None } else { Some(r) }
}

/// Returns `true` if `outer` fully contains `inner`.
///
/// An empty `inner` is contained by anything; an empty `outer` contains
/// nothing else.
#[must_use]
pub fn contains(outer: Rect, inner: Rect) -> bool {
    if is_empty(inner) {
        return true;
    }
    !is_empty(outer)
        && outer.x0 <= inner.x0
        && outer.y0 <= inner.y0
        && outer.x1 >= inner.x1
        && outer.y1 >= inner.y1
}

/// Unions `rect` into an optional running bound, ignoring empty input.
#[must_use]
pub fn union_into(acc: Option<Rect>, rect: Rect) -> Option<Rect> {
    if is_empty(rect) {
        return acc;
    }
    Some(match acc {
        Some(existing) => existing.union(rect),
        None => rect,
    })
}

/// An integer pixel rectangle, as consumed by rasterizers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Creates a pixel rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Snaps `rect` outward to whole pixels.
    ///
    /// Returns `None` for empty or non-finite input.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "surface coordinates are far inside the i32 range"
    )]
    #[must_use]
    pub fn from_rect(rect: Rect) -> Option<Self> {
        if is_empty(rect) || !rect.is_finite() {
            return None;
        }
        let r = rect.expand();
        Some(Self {
            x: r.x0 as i32,
            y: r.y0 as i32,
            width: r.width() as u32,
            height: r.height() as u32,
        })
    }

    /// Converts back to a [`Rect`].
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x) + f64::from(self.width),
            f64::from(self.y) + f64::from(self.height),
        )
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(intersect(a, b), None);
        // Touching edges share no pixels.
        let c = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert_eq!(intersect(a, c), None);
    }

    #[test]
    fn partial_overlap_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(intersect(a, b), Some(Rect::new(5.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn containment() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(25.0, 25.0, 75.0, 75.0);
        assert!(contains(outer, inner));
        assert!(!contains(inner, outer));
        assert!(contains(inner, inner));
        assert!(contains(Rect::ZERO, Rect::ZERO));
        assert!(!contains(Rect::ZERO, inner));
    }

    #[test]
    fn union_skips_empty() {
        let acc = union_into(None, Rect::ZERO);
        assert_eq!(acc, None);
        let acc = union_into(acc, Rect::new(0.0, 0.0, 5.0, 5.0));
        let acc = union_into(acc, Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(acc, Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
    }

    #[test]
    fn pixel_rect_snaps_outward() {
        let px = PixelRect::from_rect(Rect::new(0.5, 1.2, 10.1, 4.0));
        assert_eq!(px, Some(PixelRect::new(0, 1, 11, 3)));
        assert_eq!(PixelRect::from_rect(Rect::ZERO), None);
        assert_eq!(
            PixelRect::new(2, 3, 4, 5).to_rect(),
            Rect::new(2.0, 3.0, 6.0, 8.0)
        );
    }
}
