//! Request DTOs for the parameter cache API
//!
//! Defines the structure of incoming query strings and request bodies.

use std::time::Duration;

use serde::Deserialize;

/// Maximum allowed parameter code length in bytes
pub const MAX_CODE_LENGTH: usize = 256;

/// Maximum allowed parameter value size in bytes
pub const MAX_VALUE_SIZE: usize = 64 * 1024;

/// Maximum number of codes accepted by one batch read
pub const MAX_BATCH_CODES: usize = 100;

/// Validates a parameter code taken from the path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_code(code: &str) -> Option<String> {
    if code.is_empty() {
        return Some("Code cannot be empty".to_string());
    }
    if code.len() > MAX_CODE_LENGTH {
        return Some(format!(
            "Code exceeds maximum length of {} bytes",
            MAX_CODE_LENGTH
        ));
    }
    None
}

/// Query for a single read (GET /params/:code)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamQuery {
    /// Value returned when the remote service fails
    #[serde(default)]
    pub default: Option<String>,
    /// TTL override in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl ParamQuery {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Option<String> {
        validate_ttl(self.ttl_ms)
    }
}

/// Rejects a zero TTL, which would cache an entry that is already expired.
fn validate_ttl(ttl_ms: Option<u64>) -> Option<String> {
    match ttl_ms {
        Some(0) => Some("TTL must be greater than zero".to_string()),
        _ => None,
    }
}

/// Query for a batch read (GET /params?codes=a,b,c)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchQuery {
    /// Comma-separated parameter codes
    pub codes: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl BatchQuery {
    /// Non-empty, trimmed codes in request order.
    pub fn codes(&self) -> Vec<String> {
        self.codes
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Option<String> {
        let codes = self.codes();
        if codes.is_empty() {
            return Some("At least one code is required".to_string());
        }
        if codes.len() > MAX_BATCH_CODES {
            return Some(format!(
                "Batch exceeds maximum of {} codes",
                MAX_BATCH_CODES
            ));
        }
        codes
            .iter()
            .find_map(|code| validate_code(code))
            .or_else(|| validate_ttl(self.ttl_ms))
    }
}

/// Request body for a write-through update (PUT /params/:code)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateParamRequest {
    /// The authoritative value
    pub value: String,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl UpdateParamRequest {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Option<String> {
        if self.value.len() > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        validate_ttl(self.ttl_ms)
    }
}
