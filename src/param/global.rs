//! Default Pool Module
//!
//! Free-function access to one process-wide parameter pool, installed once at
//! startup. Independent pools are plain [`ParamCache`] values.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::warn;

use crate::error::{CacheError, Result};
use crate::param::cache::{ClearSummary, ParamCache};
use crate::param::stats::ParamCacheStats;

static DEFAULT_POOL: OnceLock<Arc<ParamCache>> = OnceLock::new();

/// Installs the pool used by the free functions. Only the first call succeeds.
pub fn install_default(cache: Arc<ParamCache>) -> Result<()> {
    DEFAULT_POOL
        .set(cache)
        .map_err(|_| CacheError::Internal("default parameter cache already installed".into()))
}

/// The installed default pool.
pub fn default_pool() -> Result<Arc<ParamCache>> {
    DEFAULT_POOL.get().cloned().ok_or(CacheError::Uninitialized)
}

/// [`ParamCache::get_param`] on the default pool.
///
/// Without an installed pool this logs a warning and returns `default`.
pub async fn get_param(code: &str, default: Option<&str>, ttl: Option<Duration>) -> Option<String> {
    match default_pool() {
        Ok(pool) => pool.get_param(code, default, ttl).await,
        Err(err) => {
            warn!("Reading '{}' without a parameter cache: {}", code, err);
            default.map(str::to_string)
        }
    }
}

/// [`ParamCache::get_params`] on the default pool.
pub async fn get_params<S: AsRef<str>>(
    codes: &[S],
    default: Option<&str>,
    ttl: Option<Duration>,
) -> Result<HashMap<String, Option<String>>> {
    Ok(default_pool()?.get_params(codes, default, ttl).await)
}

/// [`ParamCache::update_cache`] on the default pool.
pub async fn update_cache(code: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
    default_pool()?.update_cache(code, value, ttl).await;
    Ok(())
}

/// [`ParamCache::delete_cache`] on the default pool.
pub async fn delete_cache(code: &str) -> Result<()> {
    default_pool()?.delete_cache(code).await;
    Ok(())
}

/// [`ParamCache::clear_all_cache`] on the default pool.
pub async fn clear_all_cache() -> Result<ClearSummary> {
    Ok(default_pool()?.clear_all_cache().await)
}

/// [`ParamCache::get_cache_stats`] on the default pool.
pub async fn get_cache_stats() -> Result<ParamCacheStats> {
    Ok(default_pool()?.get_cache_stats().await)
}
