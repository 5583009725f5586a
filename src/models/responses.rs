//! Response DTOs for the parameter cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::param::{CounterSnapshot, ParamCacheStats};

/// Response body for a single read (GET /params/:code)
#[derive(Debug, Clone, Serialize)]
pub struct ParamResponse {
    /// The requested code
    pub code: String,
    /// The resolved value
    pub value: String,
}

impl ParamResponse {
    pub fn new(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// Response body for a batch read (GET /params?codes=...)
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    /// One entry per distinct requested code; `null` when unresolved
    pub values: BTreeMap<String, Option<String>>,
}

impl From<HashMap<String, Option<String>>> for BatchResponse {
    fn from(values: HashMap<String, Option<String>>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

/// Response body for a write-through update (PUT /params/:code)
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    /// Success message
    pub message: String,
    /// The code that was updated
    pub code: String,
}

impl UpdateResponse {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            message: format!("Parameter '{}' updated", code),
            code,
        }
    }
}

/// Response body for an invalidation (DELETE /params/:code)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The code that was invalidated
    pub code: String,
}

impl DeleteResponse {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            message: format!("Parameter '{}' removed from cache", code),
            code,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Entries in the memory tier
    pub memory_count: usize,
    /// Prefixed entries in the persistent store
    pub persistent_count: usize,
    /// Codes held in memory
    pub memory_keys: Vec<String>,
    pub counters: CounterSnapshot,
    /// Share of reads served without a remote fetch
    pub local_hit_rate: f64,
}

impl From<ParamCacheStats> for StatsResponse {
    fn from(stats: ParamCacheStats) -> Self {
        let local_hit_rate = stats.counters.local_hit_rate();
        Self {
            memory_count: stats.memory_count,
            persistent_count: stats.persistent_count,
            memory_keys: stats.memory_keys,
            counters: stats.counters,
            local_hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_response_serialize() {
        let resp = ParamResponse::new("sys.name", "Console");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"code":"sys.name","value":"Console"}"#);
    }

    #[test]
    fn test_batch_response_is_sorted() {
        let mut values = HashMap::new();
        values.insert("b".to_string(), None);
        values.insert("a".to_string(), Some("1".to_string()));

        let json = serde_json::to_string(&BatchResponse::from(values)).unwrap();
        assert_eq!(json, r#"{"values":{"a":"1","b":null}}"#);
    }

    #[test]
    fn test_update_and_delete_messages() {
        assert!(UpdateResponse::new("k").message.contains("'k' updated"));
        assert!(DeleteResponse::new("k").message.contains("removed"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = ParamCacheStats {
            memory_count: 1,
            persistent_count: 1,
            memory_keys: vec!["k".to_string()],
            counters: CounterSnapshot {
                memory_hits: 3,
                remote_fetches: 1,
                ..CounterSnapshot::default()
            },
        };

        let resp = StatsResponse::from(stats);
        assert!((resp.local_hit_rate - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
