//! cambio-mock
//!
//! Scriptable provider for CI-safe tests and demos.
//!
//! [`MockProvider`] defers every decision to a [`MockController`]: per-entity
//! behaviors (data, empty payload, classified failure, hang, or a per-attempt
//! script), optional random latency, and counters for attempts and peak
//! concurrency. Retries go through the real `cambio_core::fetch_with_retry`, so
//! retry budgets observed through the mock match production providers.
#![warn(missing_docs)]

mod dynamic;
/// Deterministic fixture tables.
pub mod fixtures;

pub use dynamic::{MockBehavior, MockController, MockProvider};
