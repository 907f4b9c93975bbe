//! cambio-middleware
//!
//! Middleware wrappers for cambio providers and a builder to compose them.
#![warn(missing_docs)]

mod blacklist;
pub mod builder;

pub use crate::blacklist::BlacklistingMiddleware;
pub use crate::builder::ProviderBuilder;
