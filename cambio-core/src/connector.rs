use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::request::{Dataset, RequestSpec};
use crate::retry::RetryOutcome;
use crate::table::Table;
use crate::{Entity, ErrorKind, Provenance, ProviderKey, RetryPolicy};

/// Typed result of one provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Decoded payload (possibly empty) and the provider that produced it.
    Success {
        /// Decoded rows.
        table: Table,
        /// Name of the provider that served the payload.
        provider: &'static str,
    },
    /// Provider-signaled, status-derived or transport failure.
    Failure(ErrorKind),
}

impl FetchOutcome {
    /// True for a success carrying at least one row.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Success { table, .. } if !table.is_empty())
    }

    /// Failure kind, if this is a failure.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure(kind) => Some(*kind),
            Self::Success { .. } => None,
        }
    }

    /// Payload, if this is a success.
    #[must_use]
    pub const fn table(&self) -> Option<&Table> {
        match self {
            Self::Success { table, .. } => Some(table),
            Self::Failure(_) => None,
        }
    }
}

/// Outcome of resolving one entity, with the provenance of the data.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityResult {
    /// Requested entity.
    pub entity: Entity,
    /// Final outcome after the fallback chain.
    pub outcome: FetchOutcome,
    /// Which provider served the data and what it cost.
    pub provenance: Provenance,
}

impl EntityResult {
    /// Successful result served by `provider`.
    #[must_use]
    pub fn success(entity: Entity, table: Table, provider: &'static str) -> Self {
        Self {
            entity,
            outcome: FetchOutcome::Success { table, provider },
            provenance: Provenance {
                provider: Some(provider),
                attempts: 1,
                total_attempts: 1,
                skipped: Vec::new(),
            },
        }
    }

    /// Failed result.
    #[must_use]
    pub fn failure(entity: Entity, kind: ErrorKind) -> Self {
        Self {
            entity,
            outcome: FetchOutcome::Failure(kind),
            provenance: Provenance::default(),
        }
    }
}

/// Per-call settings handed to providers by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    /// Retry budget for this call.
    pub retry: RetryPolicy,
    /// Cancellation observed by transport calls and retry waits.
    pub cancel: CancelSignal,
}

impl FetchContext {
    /// Build a context.
    #[must_use]
    pub const fn new(retry: RetryPolicy, cancel: CancelSignal) -> Self {
        Self { retry, cancel }
    }
}

/// One upstream data provider.
///
/// Implementations own their transport, endpoint layout and error markers, and
/// apply the retry budget from [`FetchContext`] themselves (usually through
/// [`crate::retry::fetch_with_retry`]). `fetch` never raises: every failure is
/// returned as `FetchOutcome::Failure`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider name used in provenance, logs and priority lists.
    fn name(&self) -> &'static str;

    /// Key used to address this provider in priority lists.
    fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name())
    }

    /// Human-readable vendor name.
    fn vendor(&self) -> &'static str {
        self.name()
    }

    /// Whether this provider can serve `dataset`. Unsupported providers are skipped
    /// without an attempt.
    fn supports(&self, dataset: Dataset) -> bool;

    /// Fetch `spec`, retrying under `ctx.retry`.
    async fn fetch(&self, spec: &RequestSpec, ctx: &FetchContext) -> RetryOutcome;
}
