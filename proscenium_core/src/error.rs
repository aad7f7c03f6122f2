// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph errors.

use crate::node::NodeId;

/// Result alias for scene graph operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Failures reported by [`SceneGraph`](crate::node::SceneGraph) operations.
///
/// None of these are fatal: the caller logs the failure, skips the
/// sub-operation and lets the frame proceed with whatever is registered.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SceneError {
    /// The handle does not refer to a live node (never created, or removed).
    #[error("node not found: {0:?}")]
    NotFound(NodeId),

    /// An argument was out of range, e.g. a NaN opacity or negative size.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Reparenting would make a node its own ancestor.
    #[error("cannot move {node:?} under its own descendant {parent:?}")]
    Cycle {
        /// The node being moved.
        node: NodeId,
        /// The requested parent, which lies in `node`'s subtree.
        parent: NodeId,
    },

    /// A key was requested under a parent that has no key of its own.
    #[error("node {0:?} has no path key to derive from")]
    Unordered(NodeId),
}

impl SceneError {
    /// Convenience constructor for [`SceneError::InvalidParameters`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }
}
