use async_trait::async_trait;
use url::Url;

use crate::classify::{Classified, ErrorMarkers, classify};
use crate::connector::FetchOutcome;
use crate::table::PayloadFormat;

/// Status and body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Failure below the HTTP layer. Always classified as transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
    /// The connection could not be established or was reset.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// One-shot HTTP GET.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one GET round trip.
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportFailure>;
}

/// Perform one round trip and turn the response into a [`FetchOutcome`].
///
/// Never retries and never returns an error: transport failures, provider error
/// markers and undecodable payloads all become `FetchOutcome::Failure`.
pub async fn fetch(
    transport: &dyn Transport,
    provider: &'static str,
    url: &Url,
    markers: &ErrorMarkers,
    format: &PayloadFormat,
) -> FetchOutcome {
    let resp = match transport.get(url).await {
        Ok(resp) => resp,
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(provider, url = %redacted(url), error = %_err, "transport failure");
            return FetchOutcome::Failure(crate::ErrorKind::TransientNetwork);
        }
    };
    match classify(&resp, markers) {
        Classified::Failure(kind) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(provider, url = %redacted(url), status = resp.status, kind = %kind, "provider signaled failure");
            FetchOutcome::Failure(kind)
        }
        Classified::Body(body) => match format.decode(body) {
            Ok(table) => FetchOutcome::Success { table, provider },
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(provider, url = %redacted(url), error = %_err, "undecodable payload");
                FetchOutcome::Failure(crate::ErrorKind::NotAvailable)
            }
        },
    }
}

/// URL without its query string, so API keys never reach the logs.
#[must_use]
pub fn redacted(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}
