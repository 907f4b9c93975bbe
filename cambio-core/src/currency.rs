use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::request::Interval;
use crate::timeseries::aggregate::AggregateDataset;
use crate::{Currency, CurrencyReport, Entity};

/// Read-only FX rate table keyed by pair symbol (e.g. `EURUSD`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FxRates {
    series: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl FxRates {
    /// Empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            series: BTreeMap::new(),
        }
    }

    /// Record one rate. Non-finite and non-positive rates are ignored.
    pub fn insert(&mut self, pair: impl Into<String>, date: NaiveDate, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.series.entry(pair.into()).or_default().insert(date, rate);
        }
    }

    /// Builder-style bulk insert of one pair's series.
    #[must_use]
    pub fn with_series<I>(mut self, pair: &str, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        for (date, rate) in points {
            self.insert(pair, date, rate);
        }
        self
    }

    /// Build the table from a dataset whose entities are FX pair symbols, reading
    /// rates from `field` (usually `close`).
    #[must_use]
    pub fn from_dataset(dataset: &AggregateDataset, field: &str) -> Self {
        let mut rates = Self::new();
        for entry in &dataset.entries {
            let Some(column) = entry.fields.get(field) else {
                continue;
            };
            for (date, value) in dataset.all_periods().iter().zip(column) {
                if let Some(rate) = value {
                    rates.insert(entry.entity.as_str(), *date, *rate);
                }
            }
        }
        rates
    }

    /// Whether any rate is known for `pair`.
    #[must_use]
    pub fn contains(&self, pair: &str) -> bool {
        self.series.contains_key(pair)
    }

    /// Known pair symbols.
    pub fn pairs(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Rate for the bucket starting at `period`: the last observation on or before
    /// the bucket's end, else the first observation after it.
    #[must_use]
    pub fn rate_for(&self, pair: &str, interval: Interval, period: NaiveDate) -> Option<f64> {
        let series = self.series.get(pair)?;
        let end = interval.bucket_end(period);
        series
            .range(..=end)
            .next_back()
            .or_else(|| series.range(end..).next())
            .map(|(_, r)| *r)
    }
}

/// Conversion of one entity from its reporting currency into the target currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyLink {
    /// Converted entity.
    pub entity: Entity,
    /// Currency the entity reports in.
    pub reporting: Currency,
    /// Currency to convert into.
    pub target: Currency,
    /// FX pair symbol, `{reporting}{target}`.
    pub pair: String,
    /// Multiplier per period of the dataset axis.
    pub multipliers: Vec<f64>,
}

impl CurrencyLink {
    /// Resolve the multiplier series over `periods`.
    ///
    /// Returns `None` when the reporting currency differs from the target and no rate
    /// for the pair is known. Same-currency links carry a multiplier of 1 everywhere.
    #[must_use]
    pub fn resolve(
        entity: &Entity,
        reporting: &Currency,
        target: &Currency,
        fx: &FxRates,
        interval: Interval,
        periods: &[NaiveDate],
    ) -> Option<Self> {
        let pair = reporting.pair_symbol(target);
        let multipliers = if reporting == target {
            vec![1.0; periods.len()]
        } else {
            periods
                .iter()
                .map(|p| fx.rate_for(&pair, interval, *p))
                .collect::<Option<Vec<f64>>>()?
        };
        Some(Self {
            entity: entity.clone(),
            reporting: reporting.clone(),
            target: target.clone(),
            pair,
            multipliers,
        })
    }

    /// True when no conversion is needed.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.reporting == self.target
    }
}

/// FX pair symbols needed to bring every entity of `dataset` into `target`.
#[must_use]
pub fn required_pairs(dataset: &AggregateDataset, target: &Currency) -> BTreeSet<String> {
    dataset
        .entries
        .iter()
        .filter_map(|e| e.currency.as_ref())
        .filter(|c| *c != target)
        .map(|c| c.pair_symbol(target))
        .collect()
}

/// Convert every entity of `dataset` into `target`.
///
/// Fields listed in `exempt` (per-share figures, ratios) are never rescaled.
/// Entities without a reporting currency, or whose FX pair has no rates, are
/// returned unconverted and listed once in the report's `unresolved` set.
#[must_use]
pub fn normalize_currency(
    dataset: &AggregateDataset,
    fx: &FxRates,
    target: &Currency,
    exempt: &[&str],
) -> (AggregateDataset, CurrencyReport) {
    let mut out = dataset.clone();
    let mut report = CurrencyReport::new(target.clone());
    let interval = out.interval();
    let axis = out.all_periods().to_vec();

    for entry in &mut out.entries {
        let link = entry.currency.as_ref().and_then(|reporting| {
            CurrencyLink::resolve(&entry.entity, reporting, target, fx, interval, &axis)
        });
        let Some(link) = link else {
            report.unresolved.push(entry.entity.clone());
            continue;
        };
        if link.is_identity() {
            report.unchanged.push(entry.entity.clone());
            continue;
        }
        for (name, column) in &mut entry.fields {
            if exempt.contains(&name.as_str()) {
                continue;
            }
            for (value, m) in column.iter_mut().zip(&link.multipliers) {
                if let Some(x) = value {
                    *x *= m;
                }
            }
        }
        entry.currency = Some(target.clone());
        report.converted.push(entry.entity.clone());
    }

    #[cfg(feature = "tracing")]
    if !report.unresolved.is_empty() {
        tracing::warn!(
            target_currency = %target,
            count = report.unresolved.len(),
            entities = ?report.unresolved.iter().map(Entity::as_str).collect::<Vec<_>>(),
            "currency unresolved; entities returned unconverted"
        );
    }
    (out, report)
}
