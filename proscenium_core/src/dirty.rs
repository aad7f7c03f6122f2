// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for scene nodes.
//!
//! The scene graph uses multi-channel dirty tracking (via
//! [`understory_dirty`]) so a caller can ask, once per frame, which nodes
//! changed and in what way.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] and [`APPEARANCE`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. A parent move shifts every descendant's
//!   world position, and visibility or opacity changes alter every
//!   descendant's effective value.
//!
//! - **Local-only**: [`CONTENT`] is marked with the default policy; only
//!   the node whose pixel buffer or size changed is reported.
//!
//! - **Structural**: [`ORDER`] is marked on create, remove and reparent.
//!   It tells the caller the draw order must be re-read.
//!
//! # Consumption
//!
//! [`SceneGraph::take_changes`](crate::node::SceneGraph::take_changes)
//! drains every channel and reports the result as
//! [`NodeChanges`](crate::node::NodeChanges).

use understory_dirty::Channel;

/// Position changed, for the node and all of its descendants.
pub const GEOMETRY: Channel = Channel::new(0);

/// Visibility or opacity changed, for the node and all of its descendants.
pub const APPEARANCE: Channel = Channel::new(1);

/// Pixel buffer or size changed; not propagated.
pub const CONTENT: Channel = Channel::new(2);

/// Tree structure or keys changed.
pub const ORDER: Channel = Channel::new(3);
