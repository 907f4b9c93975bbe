//! Configuration types shared across the orchestrator and provider adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CambioError, ErrorKind};

/// Retry budget applied by the retrying fetcher to every provider call.
///
/// Both retryable kinds share one attempt cap and one fixed delay:
/// - `TransientNetwork` is always retried.
/// - `RateLimited` is retried only when `backoff_on_rate_limit` is set; otherwise it
///   is terminal after the first attempt.
/// - Every other kind is terminal on first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per provider call, including the first one.
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub delay: Duration,
    /// Opt into waiting out provider rate limits.
    pub backoff_on_rate_limit: bool,
    /// Random jitter percentage [0, 100] added on top of `delay`. Zero keeps the delay fixed.
    pub jitter_percent: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            delay: Duration::from_secs(5),
            backoff_on_rate_limit: false,
            jitter_percent: 0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt per provider.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            backoff_on_rate_limit: false,
            jitter_percent: 0,
        }
    }

    /// Toggle waiting out rate limits.
    #[must_use]
    pub const fn with_backoff(mut self, yes: bool) -> Self {
        self.backoff_on_rate_limit = yes;
        self
    }

    /// Replace the attempt cap.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Replace the inter-attempt delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Whether a failure of `kind` after `attempts` attempts earns another attempt.
    #[must_use]
    pub const fn allows_retry(&self, kind: ErrorKind, attempts: u32) -> bool {
        attempts < self.max_attempts && kind.is_retryable(self.backoff_on_rate_limit)
    }

    /// Validate the policy.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `max_attempts` is zero or `jitter_percent` exceeds 100.
    pub fn validate(&self) -> Result<(), CambioError> {
        if self.max_attempts == 0 {
            return Err(CambioError::InvalidArg(
                "retry policy must allow at least one attempt".into(),
            ));
        }
        if self.jitter_percent > 100 {
            return Err(CambioError::InvalidArg(format!(
                "jitter_percent must be within [0, 100], got {}",
                self.jitter_percent
            )));
        }
        Ok(())
    }
}

/// Fan-out settings for multi-entity requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of workers resolving entities concurrently.
    pub concurrency: usize,
    /// Pause before each job launch after the first, to avoid bursting provider rate limiters.
    pub stagger: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            stagger: Duration::from_millis(100),
        }
    }
}

impl BatchConfig {
    /// Validate the batch settings.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `concurrency` is zero.
    pub fn validate(&self) -> Result<(), CambioError> {
        if self.concurrency == 0 {
            return Err(CambioError::InvalidArg(
                "batch concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Global configuration for the `Cambio` orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CambioConfig {
    /// Retry budget applied to every provider call.
    pub retry: RetryPolicy,
    /// Fan-out settings.
    pub batch: BatchConfig,
    /// Optional deadline for a whole batch. When exceeded the batch returns `RequestTimeout`.
    pub request_timeout: Option<Duration>,
    /// Field of an FX pair's price table used as the conversion rate.
    pub fx_field: String,
}

impl Default for CambioConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            batch: BatchConfig::default(),
            request_timeout: None,
            fx_field: "close".to_string(),
        }
    }
}

impl CambioConfig {
    /// Validate every nested section.
    ///
    /// # Errors
    /// Returns the first validation error found.
    pub fn validate(&self) -> Result<(), CambioError> {
        self.retry.validate()?;
        self.batch.validate()?;
        if self.fx_field.trim().is_empty() {
            return Err(CambioError::InvalidArg("fx_field must not be empty".into()));
        }
        Ok(())
    }
}
