// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-compositing.

use kurbo::Rect;
use proscenium_core::geometry;

/// The part of a surface that needs re-compositing.
///
/// Dirty rectangles are unioned into a single bounding rectangle; overlap
/// between them is never deduplicated beyond that.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Damage {
    /// Nothing changed; the previous composite can be reused.
    #[default]
    None,
    /// The union of every dirty rectangle reported since the last composite.
    Region(Rect),
    /// The entire surface needs redrawing.
    Full,
}

impl Damage {
    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` if the whole surface is dirty.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Unions `rect` into the damage. Empty rectangles are ignored.
    pub fn add_rect(&mut self, rect: Rect) {
        *self = match *self {
            Self::Full => Self::Full,
            Self::None => match geometry::union_into(None, rect) {
                Some(r) => Self::Region(r),
                None => Self::None,
            },
            Self::Region(r) => Self::Region(geometry::union_into(Some(r), rect).unwrap_or(r)),
        };
    }

    /// Forces a full redraw.
    pub fn mark_full(&mut self) {
        *self = Self::Full;
    }

    /// Merges another damage value into this one.
    pub fn merge(&mut self, other: &Self) {
        match *other {
            Self::None => {}
            Self::Full => *self = Self::Full,
            Self::Region(r) => self.add_rect(r),
        }
    }

    /// The part of `bounds` that needs redrawing, or `None` if none of it
    /// does.
    #[must_use]
    pub fn region_within(&self, bounds: Rect) -> Option<Rect> {
        match *self {
            Self::None => None,
            Self::Full => geometry::intersect(bounds, bounds),
            Self::Region(r) => geometry::intersect(r, bounds),
        }
    }

    /// Resets to [`Damage::None`].
    pub fn clear(&mut self) {
        *self = Self::None;
    }
}
