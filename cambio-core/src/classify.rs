use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ErrorKind;
use crate::transport::RawResponse;

/// JSON keys whose presence on an object body marks the response as an error envelope.
const ERROR_KEYS: [&str; 4] = ["Error Message", "error", "Note", "Information"];

/// Case-insensitive body markers mapped to error kinds.
///
/// Markers are matched in insertion order; the first hit wins. The default table
/// lists rate-limit markers before credential, subscription and region markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMarkers {
    entries: Vec<(ErrorKind, String)>,
}

impl Default for ErrorMarkers {
    fn default() -> Self {
        Self::empty()
            .with(ErrorKind::RateLimited, "Limit Reach")
            .with(ErrorKind::RateLimited, "rate limit")
            .with(ErrorKind::RateLimited, "quota exceeded")
            .with(ErrorKind::InvalidCredential, "Invalid API KEY")
            .with(ErrorKind::SubscriptionRequired, "Exclusive Endpoint")
            .with(ErrorKind::SubscriptionRequired, "Premium Query Parameter")
            .with(ErrorKind::SubscriptionRequired, "Special Endpoint")
            .with(ErrorKind::SubscriptionRequired, "higher subscription")
            .with(ErrorKind::RegionRestricted, "not available in your region")
            .with(ErrorKind::RegionRestricted, "region restricted")
    }
}

impl ErrorMarkers {
    /// A table without markers; classification falls back to HTTP status only.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a marker for `kind`.
    #[must_use]
    pub fn with(mut self, kind: ErrorKind, marker: impl AsRef<str>) -> Self {
        self.entries
            .push((kind, marker.as_ref().to_ascii_lowercase()));
        self
    }

    /// Number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no marker is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kind of the first marker found in `body`.
    #[must_use]
    pub fn match_body(&self, body: &str) -> Option<ErrorKind> {
        if self.entries.is_empty() {
            return None;
        }
        let lowered = body.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(_, marker)| lowered.contains(marker.as_str()))
            .map(|(kind, _)| *kind)
    }
}

/// Result of classifying one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    /// Successful response; the body still needs decoding.
    Body(&'a str),
    /// Provider-signaled or status-derived failure.
    Failure(ErrorKind),
}

/// Classify a raw response.
///
/// Body markers are consulted first for non-2xx responses and for 2xx bodies that
/// carry a JSON error envelope; otherwise the HTTP status decides.
#[must_use]
pub fn classify<'a>(resp: &'a RawResponse, markers: &ErrorMarkers) -> Classified<'a> {
    let ok = (200..300).contains(&resp.status);
    let envelope = ok && is_error_envelope(&resp.body);
    if (!ok || envelope)
        && let Some(kind) = markers.match_body(&resp.body)
    {
        return Classified::Failure(kind);
    }
    if envelope {
        return Classified::Failure(ErrorKind::NotAvailable);
    }
    if ok {
        return Classified::Body(&resp.body);
    }
    Classified::Failure(status_kind(resp.status))
}

/// Fallback mapping from HTTP status to error kind.
#[must_use]
pub const fn status_kind(status: u16) -> ErrorKind {
    match status {
        429 => ErrorKind::RateLimited,
        401 => ErrorKind::InvalidCredential,
        402 => ErrorKind::SubscriptionRequired,
        451 => ErrorKind::RegionRestricted,
        408 | 500..=599 => ErrorKind::TransientNetwork,
        _ => ErrorKind::NotAvailable,
    }
}

fn is_error_envelope(body: &str) -> bool {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return false;
    }
    if !ERROR_KEYS.iter().any(|k| trimmed.contains(k)) && !trimmed.contains("\"message\"") {
        return false;
    }
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(trimmed) else {
        return false;
    };
    ERROR_KEYS.iter().any(|k| obj.contains_key(*k))
        || (obj.len() == 1 && obj.contains_key("message"))
}
