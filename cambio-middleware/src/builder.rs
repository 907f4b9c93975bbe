//! Builder for composing providers with middleware layers.
//!
//! Layers form an onion around the raw provider; the last layer added is the
//! outermost and sees each call first.

use std::sync::Arc;
use std::time::Duration;

use cambio_core::{ErrorKind, Provider};

use crate::blacklist::BlacklistingMiddleware;

enum Layer {
    Blacklist {
        duration: Duration,
        also_on: Vec<ErrorKind>,
    },
}

/// Generic builder wrapping a raw provider in middleware layers.
pub struct ProviderBuilder {
    raw: Arc<dyn Provider>,
    /// Layers in application order, innermost first.
    layers: Vec<Layer>,
}

impl ProviderBuilder {
    /// Start from a raw, unwrapped provider.
    #[must_use]
    pub fn new(raw: Arc<dyn Provider>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Blacklist the provider for `duration` after an `InvalidCredential` failure.
    #[must_use]
    pub fn with_blacklist(self, duration: Duration) -> Self {
        self.with_blacklist_on(duration, &[])
    }

    /// Blacklist the provider for `duration` after `InvalidCredential` or any of `also_on`.
    #[must_use]
    pub fn with_blacklist_on(mut self, duration: Duration, also_on: &[ErrorKind]) -> Self {
        self.layers.push(Layer::Blacklist {
            duration,
            also_on: also_on.to_vec(),
        });
        self
    }

    /// Number of configured layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Apply every layer and return the wrapped provider.
    #[must_use]
    pub fn build(self) -> Arc<dyn Provider> {
        self.layers
            .into_iter()
            .fold(self.raw, |inner, layer| match layer {
                Layer::Blacklist { duration, also_on } => {
                    let wrapped = also_on
                        .into_iter()
                        .fold(BlacklistingMiddleware::new(inner, duration), |m, kind| {
                            m.also_on(kind)
                        });
                    Arc::new(wrapped) as Arc<dyn Provider>
                }
            })
    }
}
