//! Console Cache - client-side caches of an admin console
//!
//! Provides a tiered parameter cache (memory, persistent store, remote service)
//! and a tab/view session cache that keeps one view per open tab.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod param;
pub mod tabs;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, RemoteError, StoreError};
pub use param::{ParamCache, ParamCacheConfig};
pub use tabs::{spawn_view_session, TabStore, ViewCache, ViewCacheHandle};
pub use tasks::spawn_sweep_task;
