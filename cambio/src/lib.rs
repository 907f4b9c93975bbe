//! Cambio resolves financial datasets for many entities across multiple providers.
//!
//! Overview
//! - Providers implement [`cambio_core::Provider`] and are registered in priority order.
//! - Each entity walks its own fallback chain: the first provider returning a
//!   non-empty table wins, failures and empty payloads move on to the next one.
//! - Batches run on a bounded worker pool with a fixed stagger between launches.
//!   Results are aligned into one [`AggregateDataset`] in request order; failures
//!   are reported once per [`ErrorKind`] in a [`FailureReport`].
//! - [`Cambio::normalize_currency`] fetches the needed FX pairs through the same
//!   providers and rescales every entity into one target currency.
//!
//! Key behaviors and trade-offs
//! - Retries: `TransientNetwork` is always retried with a fixed delay; `RateLimited`
//!   only when backoff is enabled, otherwise the next provider is tried at once.
//!   Credential, subscription and region errors are terminal on first occurrence.
//! - Configuration errors (no providers, empty or duplicate entity lists, inverted
//!   windows) are raised before any request is sent. Everything else is data.
//! - Cancellation and an optional batch deadline return an error instead of a
//!   partial dataset.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use cambio::{Cambio, Dataset, Interval};
//! use cambio_http::{Endpoint, RestProvider};
//!
//! let primary = RestProvider::builder("primary")
//!     .base_url("https://api.example.com/v3/")
//!     .api_key_from_env("PRIMARY_API_KEY")
//!     .endpoint(Dataset::IncomeStatement, Endpoint::new("income-statement/{entity}")
//!         .query("period", "{period}"))
//!     .build()?;
//!
//! let cambio = Cambio::builder()
//!     .with_provider(Arc::new(primary))
//!     .backoff_on_rate_limit(true)
//!     .build()?;
//!
//! let report = cambio
//!     .download()
//!     .symbols(&["AAPL", "SAP", "TM"])?
//!     .dataset(Dataset::IncomeStatement)
//!     .interval(Interval::Yearly)
//!     .run()
//!     .await?;
//!
//! let usd = cambio::Currency::new("USD")?;
//! let (in_usd, fx_report) = cambio
//!     .normalize_currency(&report.dataset, &usd, &["eps"])
//!     .await?;
//! for line in report.failures.summary_lines() {
//!     eprintln!("{line}");
//! }
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod router;

pub use core::{Cambio, CambioBuilder};
pub use router::batch::BatchReport;
pub use router::download::DownloadBuilder;
pub use router::entity::resolve_entity;

pub use cambio_middleware::{BlacklistingMiddleware, ProviderBuilder};

// Re-export core types for convenience
pub use cambio_core::{
    AggregateDataset, AggregateOptions, BatchConfig, CambioConfig, CambioError, CancelHandle,
    CancelSignal, Currency, CurrencyReport, Dataset, Entity, EntityResult, ErrorKind,
    FailureEntry, FailureReport, FetchContext, FetchOutcome, FxRates, Interval, Provenance,
    Provider, ProviderKey, RequestSpec, RequestSpecBuilder, RetryOutcome, RetryPolicy, Row, Table,
    cancel_pair,
};
