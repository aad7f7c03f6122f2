// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage-tracked layer compositing for proscenium.
//!
//! Each surface owns a [`LayerSet`]: a background, a baked drawing layer and
//! any number of foreground and overlay layers merged by one z-order. The
//! compositor redraws only the damaged part of the visible rect and skips
//! layers hidden behind fully opaque ones. The [`Stage`] ties a
//! [`SceneGraph`](proscenium_core::node::SceneGraph) to the layer sets and
//! guards both with locks.
//!
//! ```text
//!   Stage ── SceneGraph ──► RenderPlan ──► paint_plan ──► Layer
//!     │                                                    │
//!     └── LayerSet (per surface) ◄─────────────────────────┘
//!             │
//!             ▼
//!         composite ──► Rasterizer ──► composite buffer
//! ```
//!
//! Pixels are produced through the [`Rasterizer`] trait.
//! [`PixmapRasterizer`] implements it on tiny-skia.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): forwards frame events to the sink set
//!   with [`Stage::set_trace_sink`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod compositor;
pub mod config;
pub mod damage;
pub mod error;
pub mod layer;
pub mod layer_set;
pub mod paint;
pub mod pixmap;
pub mod raster;
pub mod stage;

pub use compositor::{CompositeStats, is_overwrite_skippable};
pub use config::{CompositorConfig, StageConfig};
pub use damage::Damage;
pub use error::{RenderError, RenderResult};
pub use layer::{Layer, LayerId, LayerRole};
pub use layer_set::LayerSet;
pub use paint::paint_plan;
pub use pixmap::PixmapRasterizer;
pub use raster::{Blit, Rasterizer};
pub use stage::{Stage, StageStats};
