// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composited layers and their roles.

use core::fmt;

use kurbo::{Point, Rect, Size};

use crate::error::{RenderError, RenderResult};
use crate::raster::{Blit, Rasterizer};

/// Identifies a layer within its [`LayerSet`](crate::LayerSet).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub(crate) u32);

impl LayerId {
    /// Returns the raw identifier.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

/// Which slot of a layer set a layer occupies.
///
/// Background and drawing layers are single slots drawn first, in that
/// order. Foreground and overlay layers are open-ended collections merged by
/// one shared z-order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// The window background picture.
    Background,
    /// Drawing primitives baked into one buffer.
    Drawing,
    /// Foreground elements such as cast sprites.
    Foreground,
    /// Overlay elements such as text.
    Overlay,
}

impl LayerRole {
    /// Returns `true` for roles that hold many layers ordered by z.
    #[must_use]
    pub const fn is_element(self) -> bool {
        matches!(self, Self::Foreground | Self::Overlay)
    }
}

/// One pixel surface placed on a layer set.
#[derive(Debug)]
pub struct Layer<S> {
    pub(crate) role: LayerRole,
    pub(crate) surface: S,
    pub(crate) size: Size,
    pub(crate) origin: Point,
    pub(crate) visible: bool,
    pub(crate) opacity: f32,
    pub(crate) opaque: bool,
    pub(crate) color_key: Option<[u8; 3]>,
    pub(crate) z: u32,
    pub(crate) dirty: bool,
}

impl<S> Layer<S> {
    /// Allocates a blank `width` x `height` layer through `raster`.
    ///
    /// Zero dimensions yield [`RenderError::InvalidDimensions`].
    pub fn new<R>(raster: &mut R, role: LayerRole, width: u32, height: u32) -> RenderResult<Self>
    where
        R: Rasterizer<Surface = S>,
    {
        check_dimensions(width, height)?;
        let surface = raster.new_surface(width, height)?;
        Self::from_surface(role, surface, width, height)
    }

    /// Wraps an existing surface of the given pixel size.
    ///
    /// Zero dimensions yield [`RenderError::InvalidDimensions`].
    pub fn from_surface(
        role: LayerRole,
        surface: S,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            role,
            surface,
            size: Size::new(f64::from(width), f64::from(height)),
            origin: Point::ZERO,
            visible: true,
            opacity: 1.0,
            opaque: false,
            color_key: None,
            z: 0,
            dirty: true,
        })
    }

    /// Places the layer with its top-left corner at `origin`, rounded to
    /// whole pixels.
    #[must_use]
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin.round();
        self
    }

    /// Declares whether every pixel of the surface is opaque.
    ///
    /// Only opaque layers can hide the layers beneath them.
    #[must_use]
    pub fn with_opaque(mut self, opaque: bool) -> Self {
        self.opaque = opaque;
        self
    }

    /// Treats source pixels of this color as transparent.
    #[must_use]
    pub fn with_color_key(mut self, key: Option<[u8; 3]>) -> Self {
        self.color_key = key;
        self
    }

    /// Sets the layer opacity, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = sanitize_opacity(opacity);
        self
    }

    /// The layer's role.
    #[must_use]
    pub fn role(&self) -> LayerRole {
        self.role
    }

    /// The layer's pixel surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Rectangle covered on the layer set's surface.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    /// Top-left corner on the layer set's surface.
    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Whether the layer is drawn at all.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Opacity applied when drawing.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Shared z-order among foreground and overlay layers.
    #[must_use]
    pub fn z(&self) -> u32 {
        self.z
    }

    /// Whether the layer changed since the last composite.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether drawing this layer overwrites every pixel of its bounds.
    #[must_use]
    pub fn is_fully_opaque(&self) -> bool {
        self.visible && self.opaque && self.opacity >= 1.0 && self.color_key.is_none()
    }

    pub(crate) fn blit(&self) -> Blit {
        Blit::new(self.opacity, self.color_key)
    }
}

pub(crate) fn sanitize_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        0.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

fn check_dimensions(width: u32, height: u32) -> RenderResult<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    Ok(())
}
