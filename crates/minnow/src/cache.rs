// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory view of current key-value state
//!
//! The cache reflects Write Buffer + Append Log combined: it is updated
//! on every accepted write, so reads never have to touch the log. After
//! compaction it is replaced wholesale with the replayed state.

use serde_json::Value;
use std::collections::BTreeMap;

/// Mapping from key to current value, no disk access
#[derive(Debug, Default)]
pub struct ReadCache {
    map: BTreeMap<String, Value>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn put(&mut self, key: String, value: Value) {
        self.map.insert(key, value);
    }

    /// Remove a key, reporting whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// All live keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Replace the whole mapping, used when compaction re-anchors state
    pub fn replace_all(&mut self, map: BTreeMap<String, Value>) {
        self.map = map;
    }

    /// Clone of the underlying mapping
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.map.clone()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
