use cambio_core::{CambioError, PayloadFormat, RequestSpec};
use chrono::NaiveDate;
use url::Url;
use url::form_urlencoded::byte_serialize;

/// Path and query template for one dataset of a REST provider.
///
/// Templates may reference `{entity}`, `{start}`, `{end}`, `{period}`
/// (`annual`/`quarter`) and `{interval}`. `{start}` renders the fetch start, which
/// reaches one period further back on lookback requests. Query parameters whose value renders
/// empty (for example `{start}` on an unbounded request) are omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: String,
    query: Vec<(String, String)>,
    format: PayloadFormat,
}

impl Endpoint {
    /// Endpoint at `path`, relative to the provider's base URL, decoding JSON records
    /// dated by a `date` field.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            format: PayloadFormat::default(),
        }
    }

    /// Append a query parameter template.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Replace the payload format.
    #[must_use]
    pub fn format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }

    /// Payload format of responses from this endpoint.
    #[must_use]
    pub const fn payload_format(&self) -> &PayloadFormat {
        &self.format
    }

    /// Render the request URL for `spec`, appending the API key last.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the rendered path cannot be joined onto `base`.
    pub fn render(
        &self,
        base: &Url,
        spec: &RequestSpec,
        key_param: &str,
        api_key: &str,
    ) -> Result<Url, CambioError> {
        let entity: String = byte_serialize(spec.entity().as_str().as_bytes()).collect();
        let path = substitute(&self.path, spec, &entity);
        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| CambioError::InvalidArg(format!("invalid endpoint path '{path}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, template) in &self.query {
                let value = substitute(template, spec, spec.entity().as_str());
                if !value.is_empty() {
                    pairs.append_pair(name, &value);
                }
            }
            pairs.append_pair(key_param, api_key);
        }
        Ok(url)
    }
}

fn substitute(template: &str, spec: &RequestSpec, entity: &str) -> String {
    let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    template
        .replace("{entity}", entity)
        .replace("{start}", &date(spec.fetch_start()))
        .replace("{end}", &date(spec.end()))
        .replace("{period}", spec.interval().statement_period())
        .replace("{interval}", spec.interval().as_str())
}
