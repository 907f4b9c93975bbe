//! Time-series utilities shared by providers and the orchestrator.
//!
//! Modules include:
//! - `bucket`: map dates onto calendar buckets of an `Interval`
//! - `aggregate`: merge per-entity tables into one aligned dataset
/// Aggregation of per-entity results into an `AggregateDataset`.
pub mod aggregate;
/// Calendar bucketing helpers on `Interval`.
pub mod bucket;
