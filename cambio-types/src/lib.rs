//! Cambio-specific identifiers, error taxonomy, configuration primitives and reports.
#![warn(missing_docs)]

mod config;
mod connector;
mod error;
mod provenance;
mod reports;
mod symbols;

pub use config::{BatchConfig, CambioConfig, RetryPolicy};
pub use connector::ProviderKey;
pub use error::{CambioError, ErrorKind};
pub use provenance::Provenance;
pub use reports::{CurrencyReport, FailureEntry, FailureReport};
pub use symbols::{Currency, Entity};
