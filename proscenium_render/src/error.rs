// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-side errors.

use proscenium_core::SceneError;
use proscenium_core::node::SurfaceId;

use crate::layer::LayerId;

/// Result alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Failures reported by layer sets, rasterizers and the stage.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RenderError {
    /// A layer, surface or buffer was requested with a zero dimension, or
    /// the rasterizer refused to allocate it.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// No layer set is registered for the surface.
    #[error("unknown surface: {0:?}")]
    UnknownSurface(SurfaceId),

    /// The layer does not exist in the set.
    #[error("unknown layer: {0:?}")]
    UnknownLayer(LayerId),

    /// A scene graph operation failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
}
