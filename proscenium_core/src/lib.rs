// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and scene graph for a window-oriented 2D presentation engine.
//!
//! `proscenium_core` keeps a tree of visual elements (windows, pictures,
//! cast sprites, text overlays) and gives every element a hierarchical
//! sort key so that all of them, whatever their kind, fall into one global
//! back-to-front order determined purely by the sequence of operations that
//! created them.
//!
//! # Architecture
//!
//! ```text
//!   create / move / reparent / remove
//!       │
//!       ▼
//!   SceneGraph ──► PathKey (per-parent SequenceAllocator)
//!       │
//!       ├──► draw_order() ──► RenderPlan ──► renderer, per surface
//!       │
//!       └──► take_changes() ──► NodeChanges ──► damage tracking
//! ```
//!
//! **[`path`]**: [`PathKey`](path::PathKey), the comparable
//! hierarchical ordering key.
//!
//! **[`sequence`]**: Per-owner monotonic integer allocator used to derive
//! local orders.
//!
//! **[`node`]**: Struct-of-arrays node tree with generational handles.
//! Local properties are set by the caller; effective visibility and opacity
//! are computed by walking ancestors.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//!
//! **[`plan`]**: Back-to-front draw list grouped by destination surface.
//!
//! **[`geometry`]**: Rectangle arithmetic shared by damage tracking and
//! coverage tests.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod dirty;
pub mod error;
pub mod geometry;
pub mod node;
pub mod path;
pub mod plan;
pub mod sequence;
pub mod trace;

pub use error::{SceneError, SceneResult};
