use std::future::Future;
use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::cancel::CancelSignal;
use crate::classify::ErrorMarkers;
use crate::connector::FetchOutcome;
use crate::table::PayloadFormat;
use crate::transport::{Transport, fetch};
use crate::{ErrorKind, RetryPolicy};

/// Final outcome of a retried call and the number of attempts it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    /// Outcome of the last attempt, or `Failure(Cancelled)`.
    pub outcome: FetchOutcome,
    /// Attempts performed, including the first.
    pub attempts: u32,
}

impl RetryOutcome {
    /// Outcome of a single attempt.
    #[must_use]
    pub const fn once(outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            attempts: 1,
        }
    }

    const fn cancelled(attempts: u32) -> Self {
        Self {
            outcome: FetchOutcome::Failure(ErrorKind::Cancelled),
            attempts,
        }
    }
}

/// Run `attempt` until it succeeds, fails terminally, or exhausts `policy`.
///
/// `attempt` receives the 1-based attempt number. `TransientNetwork` is always
/// retried; `RateLimited` only when the policy opts into backoff. Every wait, and
/// every in-flight attempt, is raced against `cancel`.
pub async fn fetch_with_retry<F, Fut>(
    provider: &'static str,
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    mut attempt: F,
) -> RetryOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = FetchOutcome>,
{
    let mut attempts = 0;
    loop {
        if cancel.is_cancelled() {
            return RetryOutcome::cancelled(attempts);
        }
        attempts += 1;
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return RetryOutcome::cancelled(attempts),
            out = attempt(attempts) => out,
        };
        let Some(kind) = outcome.failure_kind() else {
            return RetryOutcome { outcome, attempts };
        };
        if !policy.allows_retry(kind, attempts) {
            return RetryOutcome { outcome, attempts };
        }
        let wait = jittered(policy.delay, policy.jitter_percent);
        #[cfg(feature = "tracing")]
        tracing::warn!(
            provider,
            attempt = attempts,
            max_attempts = policy.max_attempts,
            kind = %kind,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            "retrying provider call"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = provider;
        tokio::select! {
            biased;
            () = cancel.cancelled() => return RetryOutcome::cancelled(attempts),
            () = tokio::time::sleep(wait) => {}
        }
    }
}

/// [`fetch_with_retry`] over a single URL through a [`Transport`].
pub async fn fetch_url_with_retry(
    transport: &dyn Transport,
    provider: &'static str,
    url: &Url,
    markers: &ErrorMarkers,
    format: &PayloadFormat,
    policy: &RetryPolicy,
    cancel: &CancelSignal,
) -> RetryOutcome {
    fetch_with_retry(provider, policy, cancel, |_| {
        fetch(transport, provider, url, markers, format)
    })
    .await
}

/// `delay` plus a random extra in `[0, delay * jitter_percent / 100)`.
#[must_use]
pub fn jittered(delay: Duration, jitter_percent: u8) -> Duration {
    if jitter_percent == 0 || delay.is_zero() {
        return delay;
    }
    let base_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let range = std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100);
    let extra = rand::rng().random_range(0..range);
    delay.saturating_add(Duration::from_millis(extra))
}
