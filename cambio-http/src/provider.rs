use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cambio_core::{
    CambioError, Dataset, ErrorKind, ErrorMarkers, FetchContext, FetchOutcome, Provider,
    RequestSpec, RetryOutcome, Transport, fetch_url_with_retry,
};
use url::Url;

use crate::endpoint::Endpoint;
use crate::transport::ReqwestTransport;

/// Generic REST provider configured entirely through its builder.
pub struct RestProvider {
    name: &'static str,
    vendor: &'static str,
    base: Url,
    api_key: String,
    key_param: String,
    endpoints: HashMap<Dataset, Endpoint>,
    markers: ErrorMarkers,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RestProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestProvider")
            .field("name", &self.name)
            .field("base", &self.base.as_str())
            .field("datasets", &self.endpoints.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RestProvider {
    /// Start building a provider named `name`.
    #[must_use]
    pub fn builder(name: &'static str) -> RestProviderBuilder {
        RestProviderBuilder {
            name,
            vendor: None,
            base_url: None,
            api_key: None,
            key_param: "apikey".to_string(),
            endpoints: HashMap::new(),
            markers: ErrorMarkers::default(),
            transport: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Rendered URL for `spec`, or `None` when the dataset has no endpoint.
    ///
    /// # Errors
    /// Propagates template rendering failures.
    pub fn url_for(&self, spec: &RequestSpec) -> Result<Option<Url>, CambioError> {
        self.endpoints
            .get(&spec.dataset())
            .map(|ep| ep.render(&self.base, spec, &self.key_param, &self.api_key))
            .transpose()
    }
}

#[async_trait]
impl Provider for RestProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        self.vendor
    }

    fn supports(&self, dataset: Dataset) -> bool {
        self.endpoints.contains_key(&dataset)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "cambio_http::fetch",
            skip(self, spec, ctx),
            fields(provider = self.name, entity = %spec.entity(), dataset = spec.dataset().as_str()),
        )
    )]
    async fn fetch(&self, spec: &RequestSpec, ctx: &FetchContext) -> RetryOutcome {
        let Some(endpoint) = self.endpoints.get(&spec.dataset()) else {
            return RetryOutcome::once(FetchOutcome::Failure(ErrorKind::NotAvailable));
        };
        let url = match endpoint.render(&self.base, spec, &self.key_param, &self.api_key) {
            Ok(url) => url,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(provider = self.name, error = %_err, "endpoint template failed to render");
                return RetryOutcome::once(FetchOutcome::Failure(ErrorKind::NotAvailable));
            }
        };
        fetch_url_with_retry(
            self.transport.as_ref(),
            self.name,
            &url,
            &self.markers,
            endpoint.payload_format(),
            &ctx.retry,
            &ctx.cancel,
        )
        .await
    }
}

/// Builder for [`RestProvider`].
pub struct RestProviderBuilder {
    name: &'static str,
    vendor: Option<&'static str>,
    base_url: Option<String>,
    api_key: Option<String>,
    key_param: String,
    endpoints: HashMap<Dataset, Endpoint>,
    markers: ErrorMarkers,
    transport: Option<Arc<dyn Transport>>,
    timeout: Duration,
}

impl RestProviderBuilder {
    /// Human-readable vendor name; defaults to the provider name.
    #[must_use]
    pub const fn vendor(mut self, vendor: &'static str) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// Base URL every endpoint path is joined onto.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// API key sent with every request.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Read the API key from environment variable `var`. A missing or empty variable
    /// leaves the key unset, which fails at [`Self::build`].
    #[must_use]
    pub fn api_key_from_env(mut self, var: &str) -> Self {
        if let Ok(key) = std::env::var(var) {
            self.api_key = Some(key);
        }
        self
    }

    /// Query parameter carrying the API key (default `apikey`).
    #[must_use]
    pub fn api_key_param(mut self, param: impl Into<String>) -> Self {
        self.key_param = param.into();
        self
    }

    /// Serve `dataset` from `endpoint`.
    #[must_use]
    pub fn endpoint(mut self, dataset: Dataset, endpoint: Endpoint) -> Self {
        self.endpoints.insert(dataset, endpoint);
        self
    }

    /// Replace the error-marker table.
    #[must_use]
    pub fn markers(mut self, markers: ErrorMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Use a custom transport instead of the default `reqwest` client.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Per-request timeout of the default transport (default 30 s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// Returns `Config` when the API key or base URL is missing or malformed, or when
    /// no endpoint is configured.
    pub fn build(self) -> Result<RestProvider, CambioError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CambioError::Config(format!("provider '{}' requires an API key", self.name))
            })?;
        let raw = self.base_url.ok_or_else(|| {
            CambioError::Config(format!("provider '{}' requires a base URL", self.name))
        })?;
        let raw = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        let base = Url::parse(&raw).map_err(|e| {
            CambioError::Config(format!("provider '{}' has invalid base URL: {e}", self.name))
        })?;
        if self.endpoints.is_empty() {
            return Err(CambioError::Config(format!(
                "provider '{}' has no endpoints",
                self.name
            )));
        }
        if self.key_param.trim().is_empty() {
            return Err(CambioError::Config(format!(
                "provider '{}' has an empty API key parameter",
                self.name
            )));
        }
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(self.timeout)?),
        };
        Ok(RestProvider {
            name: self.name,
            vendor: self.vendor.unwrap_or(self.name),
            base,
            api_key,
            key_param: self.key_param,
            endpoints: self.endpoints,
            markers: self.markers,
            transport,
        })
    }
}
