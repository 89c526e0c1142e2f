//! Fetch seam.
//!
//! Ingestion is written against a trait so tests can drive the
//! pipeline with canned responses. The production implementation is a
//! thin reqwest wrapper with a per-request timeout; a timeout surfaces
//! as an ordinary fetch failure under the active mode's error policy.

use crate::IngestError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Fetch a URL and decode the body as JSON. Non-2xx statuses are
    /// fetch failures.
    async fn fetch_json(&self, url: &str) -> Result<Value, IngestError>;
}

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, IngestError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, IngestError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Client(e.to_string()))?;
        Ok(HttpClient { inner })
    }
}

#[async_trait]
impl FetchClient for HttpClient {
    async fn fetch_json(&self, url: &str) -> Result<Value, IngestError> {
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }
        response.json().await.map_err(|e| IngestError::Fetch {
            url: url.to_string(),
            message: format!("invalid JSON body: {}", e),
        })
    }
}
