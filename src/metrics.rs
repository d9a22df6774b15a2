//! Cache Metrics
//!
//! Hit/miss counters for a memoized function and the [`CacheMetrics`]
//! reporting trait.
//!
//! Metrics are reported as a `BTreeMap` so the keys always come out in the same
//! order, which keeps printed reports and test expectations stable.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

/// Hit and miss counters owned by a memoized function.
///
/// Both counters only grow until [`reset`](Self::reset).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoMetrics {
    /// Calls answered from the cache.
    pub hits: u64,
    /// Calls that ran the computation and stored its result.
    pub misses: u64,
}

impl MemoMetrics {
    /// Records a call answered from the cache.
    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a call whose result was computed and stored.
    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Total recorded calls.
    #[inline]
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of calls answered from the cache, 0.0 before any call.
    pub fn hit_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }

    /// Zeroes both counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of a memoized function's cache state.
///
/// Field names follow the report a memoized function has always printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CacheInfo {
    /// Resident primary keys (inner caches), not cached values.
    pub cache_len: usize,
    /// Effective primary capacity after clamping.
    pub max_primary_size: usize,
    /// Effective secondary capacity after clamping.
    pub max_secondary_size: usize,
    /// Cumulative hits.
    pub cache_hit: u64,
    /// Cumulative misses.
    pub cache_miss: u64,
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'cache_len': {}, 'max_primary_size': {}, 'max_secondary_size': {}, \
             'cache_hit': {}, 'cache_miss': {}}}",
            self.cache_len,
            self.max_primary_size,
            self.max_secondary_size,
            self.cache_hit,
            self.cache_miss
        )
    }
}

impl CacheInfo {
    /// Converts the snapshot into the metric map used by [`CacheMetrics`].
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("cache_len".to_string(), self.cache_len as f64);
        metrics.insert("max_primary_size".to_string(), self.max_primary_size as f64);
        metrics.insert(
            "max_secondary_size".to_string(),
            self.max_secondary_size as f64,
        );
        metrics.insert("cache_hit".to_string(), self.cache_hit as f64);
        metrics.insert("cache_miss".to_string(), self.cache_miss as f64);
        metrics
    }
}

/// Uniform metrics reporting.
pub trait CacheMetrics {
    /// All metrics as name/value pairs, sorted by name.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short identifier of the caching scheme.
    fn algorithm_name(&self) -> &'static str;
}
