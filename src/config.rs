//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::param::ParamCacheConfig;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for cached parameters
    pub default_ttl_ms: u64,
    /// Key prefix for entries in the persistent store
    pub storage_prefix: String,
    /// Maximum number of entries held in the memory tier
    pub max_memory_entries: usize,
    /// Drop fetch results that raced an invalidation instead of caching them
    pub discard_stale_fetches: bool,
    /// Location of the persistent store file; in-memory store when unset
    pub store_path: Option<PathBuf>,
    /// Base URL of the remote parameter service
    pub remote_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PARAM_DEFAULT_TTL_MS` - Parameter TTL in ms (default: 1800000)
    /// - `PARAM_STORAGE_PREFIX` - Persistent key prefix (default: `param_cache_`)
    /// - `PARAM_MAX_MEMORY` - Memory tier capacity (default: 100)
    /// - `PARAM_DISCARD_STALE` - `true` to drop racing fetch results (default: false)
    /// - `PARAM_STORE_PATH` - Persistent store file (default: in-memory)
    /// - `PARAM_REMOTE_URL` - Remote service base URL (default: `http://127.0.0.1:8080/api`)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_ttl_ms: parse_var("PARAM_DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            storage_prefix: env::var("PARAM_STORAGE_PREFIX").unwrap_or(defaults.storage_prefix),
            max_memory_entries: parse_var("PARAM_MAX_MEMORY")
                .unwrap_or(defaults.max_memory_entries),
            discard_stale_fetches: parse_var("PARAM_DISCARD_STALE")
                .unwrap_or(defaults.discard_stale_fetches),
            store_path: env::var("PARAM_STORE_PATH").ok().map(PathBuf::from),
            remote_url: env::var("PARAM_REMOTE_URL").unwrap_or(defaults.remote_url),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }

    /// Builds the parameter pool configuration from the service settings.
    pub fn param_cache_config(&self) -> ParamCacheConfig {
        ParamCacheConfig {
            default_expire_time: Duration::from_millis(self.default_ttl_ms),
            storage_prefix: self.storage_prefix.clone(),
            max_memory_cache_size: self.max_memory_entries,
            discard_stale_fetches: self.discard_stale_fetches,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: 30 * 60 * 1000,
            storage_prefix: "param_cache_".to_string(),
            max_memory_entries: 100,
            discard_stale_fetches: false,
            store_path: None,
            remote_url: "http://127.0.0.1:8080/api".to_string(),
            server_port: 3000,
            sweep_interval: 60,
        }
    }
}
