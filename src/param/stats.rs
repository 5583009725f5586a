//! Cache Statistics Module
//!
//! Tracks where parameter reads were served from, plus tier introspection.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Counters ==
/// Lock-free counters updated on every resolution path.
#[derive(Debug, Default)]
pub struct CacheCounters {
    memory_hits: AtomicU64,
    persistent_hits: AtomicU64,
    remote_fetches: AtomicU64,
    remote_failures: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistent_hit(&self) {
        self.persistent_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_fetch(&self) {
        self.remote_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_failure(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            persistent_hits: self.persistent_hits.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheCounters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Reads answered by the memory tier
    pub memory_hits: u64,
    /// Reads answered by the persistent tier (and promoted)
    pub persistent_hits: u64,
    /// Successful remote fetches
    pub remote_fetches: u64,
    /// Remote fetches that failed and fell back to the default
    pub remote_failures: u64,
    /// Memory entries dropped by batch eviction
    pub evictions: u64,
}

impl CounterSnapshot {
    /// Share of reads served without going remote, or 0.0 with no traffic.
    pub fn local_hit_rate(&self) -> f64 {
        let local = self.memory_hits + self.persistent_hits;
        let total = local + self.remote_fetches + self.remote_failures;
        if total == 0 {
            0.0
        } else {
            local as f64 / total as f64
        }
    }
}

// == Param Cache Stats ==
/// Introspection result of `get_cache_stats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParamCacheStats {
    /// Entries currently in the memory tier
    pub memory_count: usize,
    /// Prefixed keys currently in the persistent store
    pub persistent_count: usize,
    /// Codes held by the memory tier, sorted
    pub memory_keys: Vec<String>,
    pub counters: CounterSnapshot,
}
