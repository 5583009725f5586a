//! API Module
//!
//! HTTP handlers and routing for the parameter cache REST API.
//!
//! # Endpoints
//! - `GET /params/:code` - Resolve a parameter through the cache tiers
//! - `PUT /params/:code` - Write-through update
//! - `DELETE /params/:code` - Invalidate a parameter
//! - `GET /params?codes=...` - Batch resolve
//! - `DELETE /params` - Clear the pool
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
