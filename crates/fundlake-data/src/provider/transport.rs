//! HTTP transport seam.
//!
//! Fetch code talks to [`JsonTransport`] so tests can substitute a fake
//! that counts in-flight requests or scripts failures.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// Minimal GET transport.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    /// GET `url` and decode the body as JSON. A blank body decodes to `null`.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;

    /// GET `url` and return the body as text.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed transport with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self { client })
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        // Body read failures (including truncated bodies) map to Network.
        Ok(response.text().await?)
    }
}

#[async_trait]
impl JsonTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let body = self.get_body(url).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get_body(url).await
    }
}
