// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-owner monotonic sequence numbers.

use std::collections::HashMap;
use std::hash::Hash;

/// Hands out `0, 1, 2, ...` independently for each owner.
///
/// Values are never revisited for an owner, even when the things they were
/// handed to are destroyed, so survivors keep their relative order without
/// compaction. An allocator belongs to exactly one registry or layer set.
#[derive(Clone, Debug)]
pub struct SequenceAllocator<K> {
    next: HashMap<K, u32>,
}

impl<K> Default for SequenceAllocator<K> {
    fn default() -> Self {
        Self {
            next: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> SequenceAllocator<K> {
    /// Creates an allocator with no owners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused value for `owner` and advances its counter.
    pub fn next(&mut self, owner: K) -> u32 {
        let slot = self.next.entry(owner).or_insert(0);
        let value = *slot;
        *slot += 1;
        value
    }

    /// Returns the value the next call to [`next`](Self::next) would return.
    #[must_use]
    pub fn peek(&self, owner: &K) -> u32 {
        self.next.get(owner).copied().unwrap_or(0)
    }

    /// Drops the counter of an owner that no longer exists.
    pub fn forget(&mut self, owner: &K) {
        self.next.remove(owner);
    }

    /// Number of owners with a live counter.
    #[must_use]
    pub fn owners(&self) -> usize {
        self.next.len()
    }

    /// Resets every counter. Only valid when the owning registry is torn down.
    pub fn clear(&mut self) {
        self.next.clear();
    }
}
