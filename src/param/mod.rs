//! Parameter Cache Module
//!
//! Tiered resolution of console parameters: memory, persistent store, remote
//! service, each tier with TTL expiry.

mod cache;
mod entry;
mod global;
mod memory;
mod persistent;
mod remote;
mod stats;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types
pub use cache::{ClearSummary, ParamCache, ParamCacheConfig};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use global::{
    clear_all_cache, default_pool, delete_cache, get_cache_stats, get_param, get_params,
    install_default, update_cache,
};
pub use memory::{MemoryTier, TierLookup};
pub use persistent::{FileStore, MemoryStore, PersistentStore, PersistentTier};
pub use remote::{HttpParamSource, ParamPayload, RemoteParamSource};
pub use stats::{CacheCounters, CounterSnapshot, ParamCacheStats};
