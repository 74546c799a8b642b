//! Window diffing.

use std::collections::BTreeMap;

use crate::cache::CacheKey;

/// Difference between two windows, each list in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowDiff {
    /// In the previous window only.
    pub to_cancel: Vec<CacheKey>,
    /// In the target window only.
    pub to_start: Vec<CacheKey>,
    /// In both.
    pub retained: Vec<CacheKey>,
}

impl WindowDiff {
    pub fn is_empty(&self) -> bool {
        self.to_cancel.is_empty() && self.to_start.is_empty() && self.retained.is_empty()
    }
}

/// Compares the key sets of two windows.
pub fn diff_windows<A, B>(
    previous: &BTreeMap<CacheKey, A>,
    target: &BTreeMap<CacheKey, B>,
) -> WindowDiff {
    let mut diff = WindowDiff::default();
    for key in previous.keys() {
        if target.contains_key(key) {
            diff.retained.push(key.clone());
        } else {
            diff.to_cancel.push(key.clone());
        }
    }
    diff.to_start = target
        .keys()
        .filter(|key| !previous.contains_key(*key))
        .cloned()
        .collect();
    diff
}
