//! Result cache keyed by input fingerprint
//!
//! A `CalculationResult` is fully determined by the normalized case, the
//! engine settings and the table version, so a result computed once can be
//! served again for the same key. The cache is owned by the caller.

use std::collections::HashMap;
use std::sync::Arc;

use crate::aggregate::CalculationResult;

/// Cached results for one engine's settings
#[derive(Debug, Default)]
pub struct CalculationCache {
    /// Results by `<settings digest>:<case fingerprint>`
    entries: HashMap<String, Arc<CalculationResult>>,

    /// Statistics
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl CalculationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<CalculationResult>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, result: Arc<CalculationResult>) {
        self.entries.insert(key, result);
    }

    /// Clear all cached results and statistics
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
