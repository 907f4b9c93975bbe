use cambio_core::{
    AggregateDataset, CambioError, CancelSignal, Currency, CurrencyReport, Dataset, Entity,
    FxRates, Interval, RequestSpec, normalize_currency, required_pairs,
};

use crate::Cambio;

impl Cambio {
    /// Convert `dataset` into `target`, fetching the needed FX pairs through the
    /// registered providers.
    ///
    /// Behavior:
    /// - Pairs are named `{reporting}{target}` (e.g. `EURUSD`) and requested as daily
    ///   `Prices` over every period held, the hidden lookback period included; the configured `fx_field` (default
    ///   `close`) is the rate.
    /// - A pair that fails to resolve only leaves its entities unconverted; they are
    ///   listed in [`CurrencyReport::unresolved`].
    /// - Fields named in `exempt` are never rescaled.
    ///
    /// # Errors
    /// Returns `Cancelled` or `RequestTimeout` from the FX batch.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "cambio::router::normalize_currency",
            skip(self, dataset, exempt),
            fields(target = %target, entities = dataset.entity_count()),
        )
    )]
    pub async fn normalize_currency(
        &self,
        dataset: &AggregateDataset,
        target: &Currency,
        exempt: &[&str],
    ) -> Result<(AggregateDataset, CurrencyReport), CambioError> {
        self.normalize_currency_with_cancel(dataset, target, exempt, &CancelSignal::never())
            .await
    }

    /// Like [`normalize_currency`](Self::normalize_currency), observing `cancel`.
    ///
    /// # Errors
    /// Returns `Cancelled` or `RequestTimeout` from the FX batch.
    pub async fn normalize_currency_with_cancel(
        &self,
        dataset: &AggregateDataset,
        target: &Currency,
        exempt: &[&str],
        cancel: &CancelSignal,
    ) -> Result<(AggregateDataset, CurrencyReport), CambioError> {
        let rates = self.fx_rates(dataset, target, cancel).await?;
        Ok(normalize_currency(dataset, &rates, target, exempt))
    }

    async fn fx_rates(
        &self,
        dataset: &AggregateDataset,
        target: &Currency,
        cancel: &CancelSignal,
    ) -> Result<FxRates, CambioError> {
        let pairs = required_pairs(dataset, target);
        let periods = dataset.all_periods();
        let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
            return Ok(FxRates::new());
        };
        if pairs.is_empty() {
            return Ok(FxRates::new());
        }
        let start = *first;
        let end = dataset.interval().bucket_end(*last);

        let mut specs = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            let spec = RequestSpec::builder(Entity::new(pair)?)
                .dataset(Dataset::Prices)
                .interval(Interval::Daily)
                .window(Some(start), Some(end))
                .build()?;
            specs.push(spec);
        }

        match self.resolve_all_with_cancel(&specs, cancel).await {
            Ok(report) => Ok(FxRates::from_dataset(&report.dataset, &self.cfg.fx_field)),
            // No provider serves prices: every pair stays unresolved.
            Err(CambioError::Unsupported { .. }) => Ok(FxRates::new()),
            Err(e) => Err(e),
        }
    }
}
