use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified reason a single fetch did not yield usable data.
///
/// Kinds are carried as data inside `FetchOutcome::Failure` rather than
/// raised, so every branch on them is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The provider does not serve this entity or endpoint, or its payload could not be decoded.
    NotAvailable,
    /// The provider's rate limit or quota was exceeded.
    RateLimited,
    /// The endpoint requires a higher subscription tier than the credential holds.
    SubscriptionRequired,
    /// The endpoint is not available from the caller's region.
    RegionRestricted,
    /// The API credential was rejected.
    InvalidCredential,
    /// Connection failure, timeout or server-side error.
    TransientNetwork,
    /// Every configured provider returned nothing usable.
    NoData,
    /// The request was aborted through a cancellation signal.
    Cancelled,
}

impl ErrorKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 8] = [
        Self::NotAvailable,
        Self::RateLimited,
        Self::SubscriptionRequired,
        Self::RegionRestricted,
        Self::InvalidCredential,
        Self::TransientNetwork,
        Self::NoData,
        Self::Cancelled,
    ];

    /// Whether another attempt against the same provider may succeed.
    ///
    /// `TransientNetwork` is always retryable. `RateLimited` is retryable only
    /// when the caller opted into backoff. Everything else is terminal.
    #[must_use]
    pub const fn is_retryable(self, backoff_on_rate_limit: bool) -> bool {
        match self {
            Self::TransientNetwork => true,
            Self::RateLimited => backoff_on_rate_limit,
            Self::NotAvailable
            | Self::SubscriptionRequired
            | Self::RegionRestricted
            | Self::InvalidCredential
            | Self::NoData
            | Self::Cancelled => false,
        }
    }

    /// Whether the kind points at caller configuration (credential, plan, region)
    /// rather than at the entity or the network.
    #[must_use]
    pub const fn is_configuration(self) -> bool {
        matches!(
            self,
            Self::InvalidCredential | Self::SubscriptionRequired | Self::RegionRestricted
        )
    }

    /// Stable snake-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAvailable => "not_available",
            Self::RateLimited => "rate_limited",
            Self::SubscriptionRequired => "subscription_required",
            Self::RegionRestricted => "region_restricted",
            Self::InvalidCredential => "invalid_credential",
            Self::TransientNetwork => "transient_network",
            Self::NoData => "no_data",
            Self::Cancelled => "cancelled",
        }
    }

    /// One-line explanation suitable for a batch failure summary.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::NotAvailable => "the provider does not serve the requested data",
            Self::RateLimited => "the provider rate limit was reached",
            Self::SubscriptionRequired => "the endpoint requires a higher subscription tier",
            Self::RegionRestricted => "the endpoint is not available in this region",
            Self::InvalidCredential => "the API credential was rejected",
            Self::TransientNetwork => "the network or the provider was unavailable",
            Self::NoData => "no provider returned usable data",
            Self::Cancelled => "the request was cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the cambio workspace.
///
/// Only configuration problems, cancellation and deadlines surface as
/// `CambioError`; per-entity fetch failures travel as [`ErrorKind`] data.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CambioError {
    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Provider or orchestrator configuration is incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Issues with returned data (undecodable payload, missing date field, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// The requested capability is not offered by any registered provider.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability label, e.g. "income_statement".
        capability: String,
    },

    /// An individual provider failed in a way that is not a classified fetch failure.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Provider name.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The request was cancelled before completion.
    #[error("request cancelled: {what}")]
    Cancelled {
        /// Operation that was cancelled.
        what: String,
    },

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {capability}")]
    RequestTimeout {
        /// Capability label for which the request timed out.
        capability: String,
    },
}

impl CambioError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Connector` error with the provider name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Cancelled` error.
    pub fn cancelled(what: impl Into<String>) -> Self {
        Self::Cancelled { what: what.into() }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(capability: impl Into<String>) -> Self {
        Self::RequestTimeout {
            capability: capability.into(),
        }
    }

    /// Returns true for errors caused by the caller's own setup, which are
    /// raised before any network activity starts.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidArg(_) | Self::Config(_))
    }
}
