// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual node tree and registry.
//!
//! A *node* is one visual element of the screen model: a window, a picture
//! transferred into it, a cast sprite, a text overlay, or a bare group. Each
//! node has:
//!
//! - An identity ([`NodeId`]), a generational handle that is reported as
//!   not found once the node is removed.
//! - Topology: a non-owning parent index plus an owned, ordered child list.
//! - **Local properties** set by the caller:
//!   [`position`](SceneGraph::set_position), [`size`](SceneGraph::set_size),
//!   [`visible`](SceneGraph::set_visible),
//!   [`opacity`](SceneGraph::set_opacity) and an optional pixel
//!   [`buffer`](SceneGraph::set_buffer).
//! - A [`PathKey`](crate::path::PathKey) that fixes its place in the global
//!   draw order.
//!
//! Effective visibility and opacity are computed on demand by walking the
//! ancestor chain.
//!
//! # Ordering
//!
//! Keys are derived from a per-parent
//! [`SequenceAllocator`](crate::sequence::SequenceAllocator) scoped to the
//! graph. [`SceneGraph::draw_order`] sorts every node of every surface into
//! one back-to-front list; renderers group it by destination surface.

mod changes;
mod id;
mod store;
mod traverse;

pub use changes::NodeChanges;
pub use id::{INVALID, NodeId, NodeKind, SurfaceId};
pub use store::SceneGraph;
pub use traverse::Children;
