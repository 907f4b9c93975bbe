//! cambio-http
//!
//! Configurable REST provider adapter implementing `cambio_core::Provider`.
//!
//! A [`RestProvider`] describes one upstream HTTP API as data: a base URL, an API
//! key passed as a query parameter, one [`Endpoint`] template per supported
//! dataset and the provider's error-marker table. Any number of providers can be
//! registered with the orchestrator without provider-specific branching.
//!
//! ```rust,ignore
//! use cambio_core::{Dataset, PayloadFormat};
//! use cambio_http::{Endpoint, RestProvider};
//!
//! let provider = RestProvider::builder("fmp")
//!     .base_url("https://financialmodelingprep.com/api/v3/")
//!     .api_key_from_env("FMP_API_KEY")
//!     .endpoint(
//!         Dataset::IncomeStatement,
//!         Endpoint::new("income-statement/{entity}")
//!             .query("period", "{period}")
//!             .format(PayloadFormat::json("date").currency_field("reportedCurrency")),
//!     )
//!     .build()?;
//! ```
#![warn(missing_docs)]

/// Endpoint path and query templates.
pub mod endpoint;
/// The generic REST provider and its builder.
pub mod provider;
/// `reqwest`-backed transport.
pub mod transport;

pub use endpoint::Endpoint;
pub use provider::{RestProvider, RestProviderBuilder};
pub use transport::ReqwestTransport;
