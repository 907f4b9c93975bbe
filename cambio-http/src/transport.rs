use std::time::Duration;

use async_trait::async_trait;
use cambio_core::{CambioError, RawResponse, Transport, TransportFailure};
use url::Url;

/// Production transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with a per-request `timeout`.
    ///
    /// # Errors
    /// Returns `Config` if the TLS backend or client cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, CambioError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cambio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CambioError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportFailure> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(send_failure)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportFailure::Timeout
            } else {
                TransportFailure::Body(e.without_url().to_string())
            }
        })?;
        Ok(RawResponse { status, body })
    }
}

// reqwest errors embed the full URL, API key included; strip it before it can be logged.
fn send_failure(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Connect(e.without_url().to_string())
    }
}
