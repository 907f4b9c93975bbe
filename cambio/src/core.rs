use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use cambio_core::{
    BatchConfig, CambioConfig, CambioError, CancelSignal, Entity, FetchContext, Provider,
    ProviderKey, RetryPolicy,
};

/// Orchestrator that resolves entities across an ordered list of providers.
pub struct Cambio {
    pub(crate) providers: Vec<Arc<dyn Provider>>,
    pub(crate) per_entity_priority: HashMap<Entity, Vec<ProviderKey>>,
    pub(crate) cfg: CambioConfig,
}

/// Builder for constructing a [`Cambio`] orchestrator.
pub struct CambioBuilder {
    providers: Vec<Arc<dyn Provider>>,
    per_entity_priority: HashMap<Entity, Vec<ProviderKey>>,
    cfg: CambioConfig,
}

impl Default for CambioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CambioBuilder {
    /// Create a builder with the default configuration and no providers.
    ///
    /// Defaults: 12 attempts per provider with a fixed 5 s delay, no rate-limit
    /// backoff, 8 workers, 100 ms stagger between launches, no batch deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: vec![],
            per_entity_priority: HashMap::new(),
            cfg: CambioConfig::default(),
        }
    }

    /// Register a provider.
    ///
    /// Registration order is the default fallback order: the first provider is
    /// tried first for every entity unless [`prefer_entity`](Self::prefer_entity)
    /// says otherwise.
    #[must_use]
    pub fn with_provider(mut self, p: Arc<dyn Provider>) -> Self {
        self.providers.push(p);
        self
    }

    /// Set the preferred provider order for one entity.
    ///
    /// Listed providers are tried first, in the given order. Unlisted providers are
    /// still tried afterwards in registration order.
    #[must_use]
    pub fn prefer_entity(mut self, entity: &Entity, providers_desc: &[Arc<dyn Provider>]) -> Self {
        let keys: Vec<ProviderKey> = providers_desc.iter().map(|p| p.key()).collect();
        self.per_entity_priority.insert(entity.clone(), keys);
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.cfg.retry = policy;
        self
    }

    /// Opt into waiting out provider rate limits.
    ///
    /// Without backoff a `RateLimited` answer moves straight to the next provider.
    #[must_use]
    pub const fn backoff_on_rate_limit(mut self, yes: bool) -> Self {
        self.cfg.retry.backoff_on_rate_limit = yes;
        self
    }

    /// Total attempts per provider call, including the first.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.cfg.retry.max_attempts = attempts;
        self
    }

    /// Fixed wait between attempts.
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.cfg.retry.delay = delay;
        self
    }

    /// Replace the fan-out settings.
    #[must_use]
    pub const fn batch(mut self, batch: BatchConfig) -> Self {
        self.cfg.batch = batch;
        self
    }

    /// Number of entities resolved concurrently.
    #[must_use]
    pub const fn concurrency(mut self, workers: usize) -> Self {
        self.cfg.batch.concurrency = workers;
        self
    }

    /// Pause between job launches.
    #[must_use]
    pub const fn stagger(mut self, stagger: Duration) -> Self {
        self.cfg.batch.stagger = stagger;
        self
    }

    /// Deadline for a whole batch. When exceeded the batch returns `RequestTimeout`.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Price field used as the FX rate when normalizing currencies.
    #[must_use]
    pub fn fx_field(mut self, field: impl Into<String>) -> Self {
        self.cfg.fx_field = field.into();
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: CambioConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no provider is registered or the configuration is invalid.
    pub fn build(mut self) -> Result<Cambio, CambioError> {
        if self.providers.is_empty() {
            return Err(CambioError::InvalidArg(
                "no providers registered; add at least one via with_provider(...)".to_string(),
            ));
        }
        self.cfg.validate()?;

        // Drop unknown keys and duplicates from the priority lists.
        let known: HashSet<&'static str> = self.providers.iter().map(|p| p.name()).collect();
        for keys in self.per_entity_priority.values_mut() {
            let mut seen: HashSet<&'static str> = HashSet::new();
            keys.retain(|k| known.contains(k.as_str()) && seen.insert(k.as_str()));
        }

        Ok(Cambio {
            providers: self.providers,
            per_entity_priority: self.per_entity_priority,
            cfg: self.cfg,
        })
    }
}

impl Cambio {
    /// Start building a new `Cambio` instance.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let primary = Arc::new(primary_rest_provider);
    /// let secondary = Arc::new(secondary_rest_provider);
    ///
    /// let cambio = cambio::Cambio::builder()
    ///     .with_provider(primary)
    ///     .with_provider(secondary)
    ///     .backoff_on_rate_limit(true)
    ///     .concurrency(4)
    ///     .request_timeout(Duration::from_secs(600))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> CambioBuilder {
        CambioBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CambioConfig {
        &self.cfg
    }

    /// Registered provider names, in registration order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Providers in the order they are tried for `entity`.
    pub(crate) fn ordered(&self, entity: &Entity) -> Vec<Arc<dyn Provider>> {
        let Some(pref) = self.per_entity_priority.get(entity) else {
            return self.providers.clone();
        };
        let pos: HashMap<&'static str, usize> = pref
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_str(), i))
            .collect();
        let mut out: Vec<(usize, Arc<dyn Provider>)> =
            self.providers.iter().cloned().enumerate().collect();
        out.sort_by_key(|(orig_i, p)| (pos.get(p.name()).copied().unwrap_or(usize::MAX), *orig_i));
        out.into_iter().map(|(_, p)| p).collect()
    }

    pub(crate) fn context(&self, cancel: &CancelSignal) -> FetchContext {
        FetchContext::new(self.cfg.retry, cancel.clone())
    }
}
