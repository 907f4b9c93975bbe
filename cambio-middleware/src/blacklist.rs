use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cambio_core::{
    Dataset, ErrorKind, FetchContext, FetchOutcome, Provider, RequestSpec, RetryOutcome,
};
use tokio::time::Instant;

/// Middleware that takes its inner provider out of rotation for a period after a
/// provider-wide terminal failure.
///
/// A rejected credential fails every entity the same way, so once it is observed
/// the remaining entities of a batch skip this provider without a network call
/// and move straight to the next one in the fallback chain. While blacklisted,
/// `fetch` returns the triggering kind with zero attempts.
pub struct BlacklistingMiddleware {
    inner: Arc<dyn Provider>,
    state: Mutex<Option<(Instant, ErrorKind)>>,
    duration: Duration,
    triggers: Vec<ErrorKind>,
}

impl BlacklistingMiddleware {
    /// Wrap `inner`, blacklisting it for `duration` after an `InvalidCredential` failure.
    #[must_use]
    pub fn new(inner: Arc<dyn Provider>, duration: Duration) -> Self {
        Self {
            inner,
            state: Mutex::new(None),
            duration,
            triggers: vec![ErrorKind::InvalidCredential],
        }
    }

    /// Also blacklist after failures of `kind` (e.g. `SubscriptionRequired`).
    #[must_use]
    pub fn also_on(mut self, kind: ErrorKind) -> Self {
        if kind != ErrorKind::Cancelled && !self.triggers.contains(&kind) {
            self.triggers.push(kind);
        }
        self
    }

    /// Kind that caused the active blacklist, if any.
    #[must_use]
    pub fn blacklisted_for(&self) -> Option<ErrorKind> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *guard {
            Some((until, kind)) if Instant::now() < until => Some(kind),
            Some(_) => {
                // expired
                *guard = None;
                None
            }
            None => None,
        }
    }

    fn blacklist(&self, kind: ErrorKind) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some((Instant::now() + self.duration, kind));
    }
}

#[async_trait]
impl Provider for BlacklistingMiddleware {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    fn supports(&self, dataset: Dataset) -> bool {
        self.inner.supports(dataset)
    }

    async fn fetch(&self, spec: &RequestSpec, ctx: &FetchContext) -> RetryOutcome {
        if let Some(kind) = self.blacklisted_for() {
            return RetryOutcome {
                outcome: FetchOutcome::Failure(kind),
                attempts: 0,
            };
        }
        let out = self.inner.fetch(spec, ctx).await;
        if let Some(kind) = out.outcome.failure_kind()
            && self.triggers.contains(&kind)
        {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                provider = self.inner.name(),
                kind = %kind,
                duration_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
                "blacklisting provider"
            );
            self.blacklist(kind);
        }
        out
    }
}
