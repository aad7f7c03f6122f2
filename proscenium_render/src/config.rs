// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor and stage configuration.

/// Tuning switches for [`LayerSet::composite`](crate::LayerSet::composite).
///
/// Both switches only trade work for simplicity; turning either off never
/// changes the composited pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Skip layers hidden behind a fully opaque layer above them.
    pub overwrite_skip: bool,
    /// Redraw only the damaged region instead of the whole visible rect.
    pub clip_to_damage: bool,
}

impl CompositorConfig {
    /// Every optimization enabled.
    pub const DEFAULT: Self = Self::new(true, true);

    /// Redraws the whole visible rect and every layer, every time.
    pub const EXHAUSTIVE: Self = Self::new(false, false);

    /// Creates a configuration.
    #[must_use]
    pub const fn new(overwrite_skip: bool, clip_to_damage: bool) -> Self {
        Self {
            overwrite_skip,
            clip_to_damage,
        }
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration for a [`Stage`](crate::Stage).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageConfig {
    /// Compositor switches applied to every surface.
    pub compositor: CompositorConfig,
    /// Number of node slots to reserve up front.
    pub node_capacity: usize,
}

impl StageConfig {
    /// Creates a configuration.
    #[must_use]
    pub const fn new(compositor: CompositorConfig, node_capacity: usize) -> Self {
        Self {
            compositor,
            node_capacity,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::new(CompositorConfig::DEFAULT, 256)
    }
}
