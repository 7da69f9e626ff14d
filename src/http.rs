//! Shared plumbing for the REST adapters

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::types::{Result, ScaffoldError};

/// Connection settings for an external REST service
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl HttpServiceConfig {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub(crate) fn build_client(config: &HttpServiceConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| ScaffoldError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success status into the caller's error kind
pub(crate) async fn check_status(response: Response, fail: fn(String) -> ScaffoldError) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(fail(format!("status {}: {}", status, body)))
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    fail: fn(String) -> ScaffoldError,
) -> Result<T> {
    let response = check_status(response, fail).await?;
    response
        .json()
        .await
        .map_err(|e| fail(format!("invalid response body: {}", e)))
}
