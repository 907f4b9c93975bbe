use std::collections::HashSet;

use cambio_core::{CambioError, CancelSignal, Dataset, Entity, Interval, RequestSpec};
use chrono::NaiveDate;

use crate::Cambio;
use crate::router::batch::BatchReport;

/// Builder for one dataset across many entities.
pub struct DownloadBuilder<'a> {
    pub(crate) cambio: &'a Cambio,
    pub(crate) entities: Vec<Entity>,
    pub(crate) dataset: Dataset,
    pub(crate) interval: Interval,
    pub(crate) start: Option<NaiveDate>,
    pub(crate) end: Option<NaiveDate>,
    pub(crate) forward_fill: bool,
    pub(crate) lookback: bool,
}

impl<'a> DownloadBuilder<'a> {
    /// Create a builder bound to a `Cambio` instance.
    ///
    /// Starts with no entities, `Prices` at a daily interval and an unbounded window.
    /// The window is validated in [`run`](Self::run).
    #[must_use]
    pub const fn new(cambio: &'a Cambio) -> Self {
        Self {
            cambio,
            entities: Vec::new(),
            dataset: Dataset::Prices,
            interval: Interval::Daily,
            start: None,
            end: None,
            forward_fill: false,
            lookback: false,
        }
    }

    /// Replace the entity list.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the list contains the same entity twice.
    pub fn entities(mut self, entities: &[Entity]) -> Result<Self, CambioError> {
        let mut seen = HashSet::new();
        for e in entities {
            if !seen.insert(e) {
                return Err(CambioError::InvalidArg(format!(
                    "duplicate entity '{e}' in entities list"
                )));
            }
        }
        self.entities = entities.to_vec();
        Ok(self)
    }

    /// Replace the entity list from raw identifiers.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an invalid or duplicate identifier.
    pub fn symbols(self, ids: &[&str]) -> Result<Self, CambioError> {
        let parsed = ids
            .iter()
            .map(Entity::new)
            .collect::<Result<Vec<_>, _>>()?;
        self.entities(&parsed)
    }

    /// Append one entity.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the entity is already listed.
    pub fn add_entity(mut self, entity: Entity) -> Result<Self, CambioError> {
        if self.entities.contains(&entity) {
            return Err(CambioError::InvalidArg(format!(
                "duplicate entity '{entity}' already exists in entities list"
            )));
        }
        self.entities.push(entity);
        Ok(self)
    }

    /// Select the dataset.
    #[must_use]
    pub const fn dataset(mut self, dataset: Dataset) -> Self {
        self.dataset = dataset;
        self
    }

    /// Select the period interval.
    #[must_use]
    pub const fn interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Set the inclusive visible window.
    #[must_use]
    pub const fn window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Forward-fill holes after each entity's first observation.
    #[must_use]
    pub const fn forward_fill(mut self, yes: bool) -> Self {
        self.forward_fill = yes;
        self
    }

    /// Keep one hidden period before the window start for period-over-period deltas.
    #[must_use]
    pub const fn lookback(mut self, yes: bool) -> Self {
        self.lookback = yes;
        self
    }

    fn specs(&self) -> Result<Vec<RequestSpec>, CambioError> {
        let Some(first) = self.entities.first() else {
            return Err(CambioError::InvalidArg(
                "no entities specified for download".into(),
            ));
        };
        let template = RequestSpec::builder(first.clone())
            .dataset(self.dataset)
            .interval(self.interval)
            .window(self.start, self.end)
            .forward_fill(self.forward_fill)
            .lookback(self.lookback)
            .build()?;
        Ok(self
            .entities
            .iter()
            .map(|e| template.for_entity(e.clone()))
            .collect())
    }

    /// Execute the download.
    ///
    /// # Errors
    /// Returns configuration errors (no entities, inverted window), `Unsupported`
    /// when no provider serves the dataset, or `RequestTimeout`.
    pub async fn run(self) -> Result<BatchReport, CambioError> {
        self.run_with_cancel(&CancelSignal::never()).await
    }

    /// Execute the download, observing `cancel`.
    ///
    /// # Errors
    /// As [`run`](Self::run), plus `Cancelled`.
    pub async fn run_with_cancel(self, cancel: &CancelSignal) -> Result<BatchReport, CambioError> {
        let specs = self.specs()?;
        self.cambio.resolve_all_with_cancel(&specs, cancel).await
    }
}

impl Cambio {
    /// Begin building a multi-entity download.
    #[must_use]
    pub const fn download(&'_ self) -> DownloadBuilder<'_> {
        DownloadBuilder::new(self)
    }
}
