//! Parameter Cache Module
//!
//! Resolves parameter codes through memory, persistent and remote tiers.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::param::entry::CacheEntry;
use crate::param::memory::{MemoryTier, TierLookup};
use crate::param::persistent::{PersistentStore, PersistentTier};
use crate::param::remote::RemoteParamSource;
use crate::param::stats::{CacheCounters, ParamCacheStats};

// == Configuration ==
/// Settings for one independent parameter pool.
#[derive(Debug, Clone)]
pub struct ParamCacheConfig {
    /// TTL applied when a call does not override it
    pub default_expire_time: Duration,
    /// Prefix for every key this pool writes to the persistent store
    pub storage_prefix: String,
    /// Memory tier capacity before batch eviction
    pub max_memory_cache_size: usize,
    /// When set, a fetch that raced a delete or clear is returned but not cached
    pub discard_stale_fetches: bool,
}

impl Default for ParamCacheConfig {
    fn default() -> Self {
        Self {
            default_expire_time: Duration::from_secs(30 * 60),
            storage_prefix: "param_cache_".to_string(),
            max_memory_cache_size: 100,
            discard_stale_fetches: false,
        }
    }
}

impl ParamCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_expire_time = ttl;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    pub fn with_max_memory(mut self, max: usize) -> Self {
        self.max_memory_cache_size = max;
        self
    }

    pub fn with_discard_stale(mut self, enabled: bool) -> Self {
        self.discard_stale_fetches = enabled;
        self
    }
}

/// Entry counts removed by `clear_all_cache`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearSummary {
    pub memory: usize,
    pub persistent: usize,
}

// == Param Cache ==
/// Three-tier parameter cache: memory, then persistent store, then remote.
///
/// Every tier honours expiry. Persistent-store failures are logged and read
/// as misses; remote failures yield the caller's default and are not cached.
pub struct ParamCache {
    memory: RwLock<MemoryTier>,
    persistent: PersistentTier,
    remote: Arc<dyn RemoteParamSource>,
    config: ParamCacheConfig,
    /// Bumped by every invalidation, tags in-flight fetches
    generation: AtomicU64,
    counters: CacheCounters,
}

impl ParamCache {
    // == Constructor ==
    pub fn new(
        config: ParamCacheConfig,
        store: Arc<dyn PersistentStore>,
        remote: Arc<dyn RemoteParamSource>,
    ) -> Self {
        Self {
            memory: RwLock::new(MemoryTier::new(config.max_memory_cache_size)),
            persistent: PersistentTier::new(store, config.storage_prefix.clone()),
            remote,
            config,
            generation: AtomicU64::new(0),
            counters: CacheCounters::new(),
        }
    }

    pub fn config(&self) -> &ParamCacheConfig {
        &self.config
    }

    // == Get Param ==
    /// Resolves `code`, first hit wins: memory, persistent store, remote.
    ///
    /// A persistent hit is promoted into memory with a fresh expiry of
    /// `ttl` (or the pool default). A remote hit is written to both tiers.
    /// If the remote fails, `default` is returned and nothing is cached.
    pub async fn get_param(
        &self,
        code: &str,
        default: Option<&str>,
        ttl: Option<Duration>,
    ) -> Option<String> {
        let ttl = ttl.unwrap_or(self.config.default_expire_time);

        match self.memory.write().await.get(code) {
            TierLookup::Hit(value) => {
                self.counters.record_memory_hit();
                return Some(value);
            }
            TierLookup::Expired => debug!("Memory entry for '{}' expired", code),
            TierLookup::Miss => {}
        }

        match self.persistent.get(code) {
            TierLookup::Hit(value) => {
                self.counters.record_persistent_hit();
                self.write_memory(code, CacheEntry::new(value.clone(), ttl))
                    .await;
                debug!("Promoted '{}' from persistent tier", code);
                return Some(value);
            }
            TierLookup::Expired => debug!("Persistent entry for '{}' expired", code),
            TierLookup::Miss => {}
        }

        let started_at = self.generation.load(Ordering::SeqCst);
        match self.remote.get_param_by_code(code).await {
            Ok(value) => {
                self.counters.record_remote_fetch();
                if self.config.discard_stale_fetches
                    && self.generation.load(Ordering::SeqCst) != started_at
                {
                    debug!("Not caching '{}': invalidated while fetching", code);
                } else {
                    self.write_through(code, CacheEntry::new(value.clone(), ttl))
                        .await;
                }
                Some(value)
            }
            Err(err) => {
                self.counters.record_remote_failure();
                warn!("Remote fetch of '{}' failed, using default: {}", code, err);
                default.map(str::to_string)
            }
        }
    }

    // == Get Params ==
    /// Resolves several codes concurrently.
    ///
    /// The result holds exactly one entry per distinct requested code.
    pub async fn get_params<S: AsRef<str>>(
        &self,
        codes: &[S],
        default: Option<&str>,
        ttl: Option<Duration>,
    ) -> HashMap<String, Option<String>> {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = codes
            .iter()
            .map(|code| code.as_ref())
            .filter(|code| seen.insert(*code))
            .collect();

        let lookups = distinct.into_iter().map(|code| async move {
            let value = self.get_param(code, default, ttl).await;
            (code.to_string(), value)
        });

        join_all(lookups).await.into_iter().collect()
    }

    // == Update Cache ==
    /// Writes a known-authoritative value through both tiers without fetching.
    pub async fn update_cache(&self, code: &str, value: &str, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.config.default_expire_time);
        self.write_through(code, CacheEntry::new(value, ttl)).await;
        debug!("Updated '{}' in both tiers", code);
    }

    // == Delete Cache ==
    /// Removes a code from both tiers. Absent codes are ignored.
    pub async fn delete_cache(&self, code: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.memory.write().await.remove(code);
        self.persistent.remove(code);
    }

    // == Clear All ==
    /// Empties the memory tier and every persistent key under this pool's prefix.
    pub async fn clear_all_cache(&self) -> ClearSummary {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let memory = self.memory.write().await.clear();
        let persistent = self.persistent.clear();

        info!(
            "Cleared parameter cache: {} memory, {} persistent entries",
            memory, persistent
        );
        ClearSummary { memory, persistent }
    }

    // == Stats ==
    /// Reports tier sizes, memory keys and counters. Has no side effects.
    pub async fn get_cache_stats(&self) -> ParamCacheStats {
        let memory = self.memory.read().await;

        ParamCacheStats {
            memory_count: memory.len(),
            persistent_count: self.persistent.count(),
            memory_keys: memory.keys(),
            counters: self.counters.snapshot(),
        }
    }

    // == Purge Expired ==
    /// Sweeps expired entries out of both tiers, returning the total removed.
    pub async fn purge_expired(&self) -> usize {
        let memory = self.memory.write().await.purge_expired();
        let persistent = self.persistent.purge_expired();
        memory + persistent
    }

    async fn write_memory(&self, code: &str, entry: CacheEntry) {
        let evicted = self.memory.write().await.insert(code.to_string(), entry);
        if evicted > 0 {
            self.counters.record_evictions(evicted);
            debug!("Memory tier full, evicted {} oldest entries", evicted);
        }
    }

    async fn write_through(&self, code: &str, entry: CacheEntry) {
        self.persistent.set(code, &entry);
        self.write_memory(code, entry).await;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::persistent::MemoryStore;
    use crate::param::testing::{FakeRemote, SpyStore};

    const TTL: Duration = Duration::from_secs(300);

    fn pool(
        config: ParamCacheConfig,
        store: Arc<dyn PersistentStore>,
        remote: Arc<FakeRemote>,
    ) -> ParamCache {
        ParamCache::new(config, store, remote)
    }

    fn seed_persistent(store: &dyn PersistentStore, code: &str, entry: &CacheEntry) {
        let raw = serde_json::to_string(entry).unwrap();
        store.set_item(&format!("param_cache_{}", code), &raw).unwrap();
    }

    #[tokio::test]
    async fn test_remote_hit_writes_both_tiers() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::with_values(&[("sys.name", "Console")]));
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        let value = cache.get_param("sys.name", None, None).await;

        assert_eq!(value.as_deref(), Some("Console"));
        assert_eq!(remote.calls(), 1);
        assert!(store.get_item("param_cache_sys.name").unwrap().is_some());

        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.memory_keys, vec!["sys.name".to_string()]);
        assert_eq!(stats.persistent_count, 1);

        // Second read never leaves memory
        cache.get_param("sys.name", None, None).await;
        assert_eq!(remote.calls(), 1);
        assert_eq!(cache.get_cache_stats().await.counters.memory_hits, 1);
    }

    #[tokio::test]
    async fn test_persistent_hit_promotes_once() {
        let store = Arc::new(SpyStore::new());
        seed_persistent(store.as_ref(), "theme", &CacheEntry::new("dark", TTL));
        let remote = Arc::new(FakeRemote::new());
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        assert_eq!(cache.get_param("theme", None, None).await.as_deref(), Some("dark"));
        assert_eq!(cache.get_param("theme", None, None).await.as_deref(), Some("dark"));

        assert_eq!(store.reads(), 1);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_promotion_rederives_expiry() {
        let store = Arc::new(MemoryStore::new());
        seed_persistent(
            store.as_ref(),
            "k",
            &CacheEntry::new("v", Duration::from_millis(80)),
        );
        let remote = Arc::new(FakeRemote::new());
        remote.fail(true);
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        cache.get_param("k", None, Some(TTL)).await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        // Persisted copy has expired, promoted copy carries the fresh TTL
        assert_eq!(cache.get_param("k", None, None).await.as_deref(), Some("v"));
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_entries_take_cold_path() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::with_values(&[("k", "old")]));
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        cache.get_param("k", None, Some(Duration::from_millis(30))).await;
        remote.set("k", "new");
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(cache.get_param("k", None, None).await.as_deref(), Some("new"));
        assert_eq!(remote.calls(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure_returns_default_uncached() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::new());
        remote.fail(true);
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        let first = cache.get_param("missing", Some("fallback"), None).await;
        let second = cache.get_param("missing", None, None).await;

        assert_eq!(first.as_deref(), Some("fallback"));
        assert_eq!(second, None);
        assert_eq!(remote.calls(), 2, "failures must not be memoized");

        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.memory_count, 0);
        assert_eq!(stats.persistent_count, 0);
        assert_eq!(stats.counters.remote_failures, 2);
    }

    #[tokio::test]
    async fn test_update_cache_is_write_through() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::new());
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        cache.update_cache("banner", "hello", None).await;

        assert_eq!(cache.get_param("banner", None, None).await.as_deref(), Some("hello"));
        assert_eq!(remote.calls(), 0);
        assert!(store.get_item("param_cache_banner").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_cache_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::new());
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());
        cache.update_cache("keep", "1", None).await;
        cache.update_cache("drop", "2", None).await;

        cache.delete_cache("drop").await;
        cache.delete_cache("drop").await;
        cache.delete_cache("never-existed").await;

        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.memory_keys, vec!["keep".to_string()]);
        assert_eq!(stats.persistent_count, 1);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_foreign_keys() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("auth_token", "secret").unwrap();
        let remote = Arc::new(FakeRemote::new());
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());
        cache.update_cache("a", "1", None).await;
        cache.update_cache("b", "2", None).await;

        let summary = cache.clear_all_cache().await;

        assert_eq!(summary, ClearSummary { memory: 2, persistent: 2 });
        assert_eq!(store.keys().unwrap(), vec!["auth_token".to_string()]);
    }

    #[tokio::test]
    async fn test_pools_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::new());
        let left = pool(ParamCacheConfig::new().with_prefix("left_"), store.clone(), remote.clone());
        let right = pool(ParamCacheConfig::new().with_prefix("right_"), store.clone(), remote.clone());

        left.update_cache("k", "L", None).await;
        right.update_cache("k", "R", None).await;
        left.clear_all_cache().await;

        assert_eq!(right.get_param("k", None, None).await.as_deref(), Some("R"));
        assert_eq!(store.keys().unwrap(), vec!["right_k".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_tier_bounded() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::new());
        let cache = pool(ParamCacheConfig::new().with_max_memory(10), store.clone(), remote.clone());

        for i in 0..11 {
            cache.update_cache(&format!("p{:02}", i), "v", None).await;
        }

        let stats = cache.get_cache_stats().await;
        assert!(stats.memory_count <= 10);
        let expected: Vec<String> = (5..11).map(|i| format!("p{:02}", i)).collect();
        assert_eq!(stats.memory_keys, expected);
        assert_eq!(stats.counters.evictions, 5);
        // Evicted codes are still answered from the persistent tier
        assert_eq!(stats.persistent_count, 11);
        assert_eq!(cache.get_param("p00", None, None).await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_get_params_one_entry_per_code() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::with_values(&[("a", "1"), ("b", "2")]));
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        let values = cache
            .get_params(&["a", "b", "a", "missing"], Some("none"), None)
            .await;

        assert_eq!(values.len(), 3);
        assert_eq!(values["a"].as_deref(), Some("1"));
        assert_eq!(values["b"].as_deref(), Some("2"));
        assert_eq!(values["missing"].as_deref(), Some("none"));
        assert_eq!(remote.calls(), 3);
    }

    #[tokio::test]
    async fn test_stale_fetch_last_write_wins_by_default() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::with_values(&[("k", "v")]));
        remote.delay(Duration::from_millis(50));
        let cache = Arc::new(pool(ParamCacheConfig::new(), store.clone(), remote.clone()));

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_param("k", None, None).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.delete_cache("k").await;

        assert_eq!(reader.await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.get_cache_stats().await.memory_count, 1);
    }

    #[tokio::test]
    async fn test_stale_fetch_discarded_when_enabled() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::with_values(&[("k", "v")]));
        remote.delay(Duration::from_millis(50));
        let config = ParamCacheConfig::new().with_discard_stale(true);
        let cache = Arc::new(pool(config, store.clone(), remote.clone()));

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_param("k", None, None).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.delete_cache("k").await;

        assert_eq!(reader.await.unwrap().as_deref(), Some("v"));
        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.memory_count, 0);
        assert_eq!(stats.persistent_count, 0);
    }

    #[tokio::test]
    async fn test_store_quota_does_not_break_memory_tier() {
        let store = Arc::new(MemoryStore::with_quota(8));
        let remote = Arc::new(FakeRemote::with_values(&[("long.code", "value")]));
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());

        assert_eq!(cache.get_param("long.code", None, None).await.as_deref(), Some("value"));

        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.memory_count, 1);
        assert_eq!(stats.persistent_count, 0);
    }

    #[tokio::test]
    async fn test_purge_expired_sweeps_both_tiers() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::new());
        let cache = pool(ParamCacheConfig::new(), store.clone(), remote.clone());
        cache.update_cache("short", "v", Some(Duration::from_millis(20))).await;
        cache.update_cache("long", "v", None).await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.purge_expired().await, 2);
        let stats = cache.get_cache_stats().await;
        assert_eq!(stats.memory_keys, vec!["long".to_string()]);
        assert_eq!(stats.persistent_count, 1);
    }
}
