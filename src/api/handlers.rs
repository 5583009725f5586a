//! API Handlers
//!
//! HTTP request handlers for each parameter cache endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_code, BatchQuery, BatchResponse, DeleteResponse, HealthResponse, ParamQuery,
    ParamResponse, StatsResponse, UpdateParamRequest, UpdateResponse,
};
use crate::param::{
    ClearSummary, FileStore, HttpParamSource, MemoryStore, ParamCache, PersistentStore,
};

/// Application state shared across all handlers.
///
/// The parameter cache synchronizes internally, so handlers share it through
/// a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ParamCache>,
}

impl AppState {
    /// Creates a new AppState around an existing pool.
    pub fn new(cache: Arc<ParamCache>) -> Self {
        Self { cache }
    }

    /// Builds the pool described by the configuration.
    ///
    /// Uses a file store when `store_path` is set, an in-memory store otherwise,
    /// and the HTTP parameter service at `remote_url`. A store file that cannot
    /// be opened is left untouched and the in-memory store is used instead.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn PersistentStore> = match &config.store_path {
            Some(path) => match FileStore::open(path) {
                Ok(store) => Arc::new(store),
                Err(err) => {
                    warn!(
                        "Cannot open store {}: {}; falling back to in-memory store",
                        path.display(),
                        err
                    );
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };

        let remote = HttpParamSource::new(config.remote_url.clone())
            .map_err(|err| CacheError::Internal(format!("cannot build HTTP client: {}", err)))?;

        let cache = ParamCache::new(config.param_cache_config(), store, Arc::new(remote));
        Ok(Self::new(Arc::new(cache)))
    }
}

fn check_code(code: &str) -> Result<()> {
    match validate_code(code) {
        Some(message) => Err(CacheError::InvalidRequest(message)),
        None => Ok(()),
    }
}

/// Handler for GET /params/:code
///
/// Resolves a parameter through the tiers; 404 when unresolved and no
/// default was supplied.
pub async fn get_param_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ParamQuery>,
) -> Result<Json<ParamResponse>> {
    check_code(&code)?;
    if let Some(message) = query.validate() {
        return Err(CacheError::InvalidRequest(message));
    }

    let value = state
        .cache
        .get_param(&code, query.default.as_deref(), query.ttl())
        .await
        .ok_or_else(|| CacheError::NotFound(code.clone()))?;

    Ok(Json(ParamResponse::new(code, value)))
}

/// Handler for GET /params?codes=a,b,c
pub async fn get_params_handler(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<BatchResponse>> {
    if let Some(message) = query.validate() {
        return Err(CacheError::InvalidRequest(message));
    }

    let codes = query.codes();
    debug!("Batch read of {} codes", codes.len());
    let values = state
        .cache
        .get_params(&codes, query.default.as_deref(), query.ttl())
        .await;

    Ok(Json(BatchResponse::from(values)))
}

/// Handler for PUT /params/:code
///
/// Writes a known-authoritative value through both tiers.
pub async fn update_param_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<UpdateParamRequest>,
) -> Result<Json<UpdateResponse>> {
    check_code(&code)?;
    if let Some(message) = req.validate() {
        return Err(CacheError::InvalidRequest(message));
    }

    state.cache.update_cache(&code, &req.value, req.ttl()).await;
    Ok(Json(UpdateResponse::new(code)))
}

/// Handler for DELETE /params/:code
///
/// Idempotent: removing an uncached code succeeds.
pub async fn delete_param_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<DeleteResponse>> {
    check_code(&code)?;
    state.cache.delete_cache(&code).await;
    Ok(Json(DeleteResponse::new(code)))
}

/// Handler for DELETE /params
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearSummary> {
    Json(state.cache.clear_all_cache().await)
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.get_cache_stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
