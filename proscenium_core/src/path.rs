// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical draw-order keys.
//!
//! A [`PathKey`] is the chain of local orders from a top-level node down to
//! the node it belongs to. Comparing two keys element by element, with a
//! strict prefix sorting first, yields the global back-to-front order: a
//! parent is drawn before its children, and siblings are drawn in creation
//! order regardless of what kind of element they are.

use core::cmp::Ordering;
use core::fmt;

/// An ordered, variable-length sequence of local orders.
///
/// The derived [`Ord`] is lexicographic over the elements, which is exactly
/// the draw-order relation: `[0] < [0, 0] < [0, 1] < [1]`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PathKey(Vec<u32>);

impl PathKey {
    /// Creates the key of a top-level node with the given order.
    #[must_use]
    pub fn from_root(order: u32) -> Self {
        Self(vec![order])
    }

    /// Returns the key of a child with `local_order` under `self`.
    #[must_use]
    pub fn append(&self, local_order: u32) -> Self {
        let mut path = Vec::with_capacity(self.0.len() + 1);
        path.extend_from_slice(&self.0);
        path.push(local_order);
        Self(path)
    }

    /// Returns the elements of the key, outermost first.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Number of elements, i.e. the node's depth plus one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty key, which no node is ever assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last element: the node's order among its siblings.
    #[must_use]
    pub fn local_order(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// Returns `true` if `self` is a strict prefix of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Replaces the leading `prefix_len` elements with `new_prefix`.
    ///
    /// Used when a subtree is moved: every descendant keeps its relative
    /// suffix under the moved node's new key.
    #[must_use]
    pub(crate) fn rebase(&self, prefix_len: usize, new_prefix: &Self) -> Self {
        let suffix = self.0.get(prefix_len..).unwrap_or(&[]);
        let mut path = Vec::with_capacity(new_prefix.0.len() + suffix.len());
        path.extend_from_slice(&new_prefix.0);
        path.extend_from_slice(suffix);
        Self(path)
    }
}

/// Compares two optional keys, sorting unset keys before every set key.
///
/// Nodes that have not been given a key yet are drawn furthest back; callers
/// break ties between them with their own creation sequence.
#[must_use]
pub fn compare_optional(a: Option<&PathKey>, b: Option<&PathKey>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathKey({self})")
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, order) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{order}")?;
        }
        f.write_str("]")
    }
}
