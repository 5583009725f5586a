//! Remote Source Module
//!
//! The slowest tier: the parameter service that owns the authoritative values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::error::RemoteError;

// == Remote Source Trait ==
/// Fetches a parameter value by code from the authoritative service.
#[async_trait]
pub trait RemoteParamSource: Send + Sync {
    /// Resolves `code` to its value; fails on network or HTTP errors.
    async fn get_param_by_code(&self, code: &str) -> Result<String, RemoteError>;
}

/// Body returned by the parameter service for a single code.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamPayload {
    pub code: String,
    pub value: Option<String>,
}

// == HTTP Source ==
/// [`RemoteParamSource`] backed by `GET {base_url}/params/{code}`.
#[derive(Debug, Clone)]
pub struct HttpParamSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpParamSource {
    /// Creates a source with a 10 second request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{base_url}/params/{code}` with `code` percent-encoded as one path segment.
    fn url_for(&self, code: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| RemoteError::InvalidUrl(format!("{}: {}", self.base_url, err)))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("params")
            .push(code);
        Ok(url)
    }
}

#[async_trait]
impl RemoteParamSource for HttpParamSource {
    async fn get_param_by_code(&self, code: &str) -> Result<String, RemoteError> {
        let url = self.url_for(code)?;
        debug!("Fetching parameter from {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                code: code.to_string(),
                status: status.as_u16(),
            });
        }

        let payload: ParamPayload = response.json().await?;
        payload
            .value
            .ok_or_else(|| RemoteError::Missing(payload.code))
    }
}
