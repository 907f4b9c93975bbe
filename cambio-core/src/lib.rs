//! cambio-core
//!
//! Core types, traits, and engines shared across the cambio workspace.
//!
//! - `transport` / `classify`: one HTTP round trip turned into a typed outcome.
//! - `retry`: the retrying fetcher with kind-specific budgets.
//! - `connector`: the `Provider` trait and the `FetchOutcome` / `EntityResult` data model.
//! - `timeseries`: calendar bucketing and the aggregator producing `AggregateDataset`.
//! - `currency`: FX alignment and currency normalization.
//!
//! Async runtime (Tokio)
//! ---------------------
//! Retry waits and cancellation are built on Tokio timers and `tokio::sync::watch`,
//! so every async API here must run under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Cooperative cancellation signal shared by fetchers and the orchestrator.
pub mod cancel;
/// Response classification against provider error markers.
pub mod classify;
/// Provider capability trait and per-entity result types.
pub mod connector;
/// FX alignment and currency normalization of aggregated datasets.
pub mod currency;
/// Immutable request descriptions.
pub mod request;
/// Retrying fetcher.
pub mod retry;
/// Tabular provider payloads and their wire decoders.
pub mod table;
/// Calendar bucketing and aggregation.
pub mod timeseries;
/// HTTP transport abstraction and the single-shot `fetch`.
pub mod transport;

pub use cambio_types::*;
pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use classify::{Classified, ErrorMarkers, classify};
pub use connector::{EntityResult, FetchContext, FetchOutcome, Provider};
pub use currency::{CurrencyLink, FxRates, normalize_currency, required_pairs};
pub use request::{Dataset, Interval, RequestSpec, RequestSpecBuilder};
pub use retry::{RetryOutcome, fetch_url_with_retry, fetch_with_retry};
pub use table::{PayloadFormat, PayloadKind, Row, Table};
pub use timeseries::aggregate::{AggregateDataset, AggregateOptions, aggregate};
pub use transport::{RawResponse, Transport, TransportFailure, fetch};
