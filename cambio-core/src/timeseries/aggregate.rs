use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::connector::{EntityResult, FetchOutcome};
use crate::request::{Interval, RequestSpec};
use crate::{Currency, Entity};

/// Shape hints applied while assembling an [`AggregateDataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateOptions {
    /// Calendar bucket used to align periods.
    pub interval: Interval,
    /// Inclusive start of the visible window.
    pub start: Option<NaiveDate>,
    /// Inclusive end of the visible window.
    pub end: Option<NaiveDate>,
    /// Fill holes after each entity's first observation with the last known value.
    pub forward_fill: bool,
    /// Keep one hidden period before `start` for period-over-period deltas.
    pub lookback: bool,
}

impl AggregateOptions {
    /// Options matching the shape of `spec`.
    #[must_use]
    pub const fn from_spec(spec: &RequestSpec) -> Self {
        Self {
            interval: spec.interval(),
            start: spec.start(),
            end: spec.end(),
            forward_fill: spec.forward_fill(),
            lookback: spec.lookback(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EntitySeries {
    pub(crate) entity: Entity,
    pub(crate) currency: Option<Currency>,
    /// Columns aligned with `AggregateDataset::axis`.
    pub(crate) fields: BTreeMap<String, Vec<Option<f64>>>,
}

/// Entities × chronological periods × fields.
///
/// The period axis is strictly increasing and holds one calendar bucket per
/// entry, keyed by the bucket's first day. Entities appear in request order.
/// Values are `None` where an entity has no observation for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDataset {
    interval: Interval,
    /// Internal axis; the first `hidden` entries precede the visible window.
    axis: Vec<NaiveDate>,
    hidden: usize,
    pub(crate) entries: Vec<EntitySeries>,
}

impl AggregateDataset {
    /// A dataset without entities or periods.
    #[must_use]
    pub const fn empty(interval: Interval) -> Self {
        Self {
            interval,
            axis: Vec::new(),
            hidden: 0,
            entries: Vec::new(),
        }
    }

    /// Bucket granularity of the period axis.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Entities in request order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entries.iter().map(|e| &e.entity)
    }

    /// Number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether `entity` is present.
    #[must_use]
    pub fn contains(&self, entity: &Entity) -> bool {
        self.entry(entity).is_some()
    }

    /// Visible periods, chronological and duplicate free.
    #[must_use]
    pub fn periods(&self) -> &[NaiveDate] {
        &self.axis[self.hidden..]
    }

    /// Labels of the visible periods, e.g. `2023Q4`.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.periods()
            .iter()
            .map(|p| self.interval.label(*p))
            .collect()
    }

    /// Field names recorded for `entity`, sorted.
    #[must_use]
    pub fn fields(&self, entity: &Entity) -> Vec<&str> {
        self.entry(entity)
            .map(|e| e.fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Value of `field` for `entity` in the bucket containing `period`.
    #[must_use]
    pub fn value(&self, entity: &Entity, field: &str, period: NaiveDate) -> Option<f64> {
        let bucket = self.interval.bucket_start(period);
        let idx = self.periods().binary_search(&bucket).ok()? + self.hidden;
        self.entry(entity)?.fields.get(field)?.get(idx).copied().flatten()
    }

    /// Visible column of `field` for `entity`, aligned with [`Self::periods`].
    #[must_use]
    pub fn series(&self, entity: &Entity, field: &str) -> Option<&[Option<f64>]> {
        self.entry(entity)?
            .fields
            .get(field)
            .map(|col| &col[self.hidden..])
    }

    /// Reporting currency of `entity`, if known.
    #[must_use]
    pub fn currency(&self, entity: &Entity) -> Option<&Currency> {
        self.entry(entity)?.currency.as_ref()
    }

    /// Change of `field` from the previous period, aligned with [`Self::periods`].
    ///
    /// The first visible period is compared against the hidden lookback period when
    /// one was retained, otherwise it has no delta.
    #[must_use]
    pub fn period_over_period(&self, entity: &Entity, field: &str) -> Option<Vec<Option<f64>>> {
        let column = self.entry(entity)?.fields.get(field)?;
        let deltas = (self.hidden..column.len())
            .map(|i| {
                let prev = i.checked_sub(1).and_then(|p| column[p])?;
                column[i].map(|cur| cur - prev)
            })
            .collect();
        Some(deltas)
    }

    /// True when there is no entity or no visible period.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() || self.periods().is_empty()
    }

    /// Every period held, the hidden lookback period included.
    #[must_use]
    pub fn all_periods(&self) -> &[NaiveDate] {
        &self.axis
    }

    fn entry(&self, entity: &Entity) -> Option<&EntitySeries> {
        self.entries.iter().find(|e| &e.entity == entity)
    }
}

type Buckets = BTreeMap<NaiveDate, BTreeMap<String, f64>>;

/// Merge per-entity results into one aligned dataset.
///
/// - Failed results are skipped; the first success per entity wins.
/// - Rows are bucketed by `options.interval`; within one entity the first row of a
///   bucket wins and later rows in the same bucket are dropped.
/// - The period axis is the sorted union of every entity's buckets.
/// - Forward fill (optional) runs over the full axis, before truncation.
/// - Truncation to `[start, end]` happens last; with `lookback` the closest bucket
///   before `start` is retained as a hidden period.
#[must_use]
pub fn aggregate<I>(results: I, options: &AggregateOptions) -> AggregateDataset
where
    I: IntoIterator<Item = EntityResult>,
{
    let interval = options.interval;
    let mut staged: Vec<(Entity, Option<Currency>, Buckets)> = Vec::new();
    let mut union: BTreeSet<NaiveDate> = BTreeSet::new();

    for result in results {
        let FetchOutcome::Success { table, .. } = result.outcome else {
            continue;
        };
        if staged.iter().any(|(e, ..)| *e == result.entity) {
            continue;
        }
        let currency = table.currency().cloned();
        let mut buckets = Buckets::new();
        for row in table.into_rows() {
            buckets
                .entry(interval.bucket_start(row.date))
                .or_insert(row.values);
        }
        union.extend(buckets.keys().copied());
        staged.push((result.entity, currency, buckets));
    }

    let axis: Vec<NaiveDate> = union.into_iter().collect();
    let (lo, hi, hidden) = window_bounds(&axis, options);

    let entries = staged
        .into_iter()
        .map(|(entity, currency, buckets)| {
            let names: BTreeSet<&String> = buckets.values().flat_map(BTreeMap::keys).collect();
            let fields = names
                .into_iter()
                .map(|name| {
                    let mut column: Vec<Option<f64>> = axis
                        .iter()
                        .map(|p| buckets.get(p).and_then(|v| v.get(name)).copied())
                        .collect();
                    if options.forward_fill {
                        forward_fill(&mut column);
                    }
                    (name.clone(), column[lo..hi].to_vec())
                })
                .collect();
            EntitySeries {
                entity,
                currency,
                fields,
            }
        })
        .collect();

    AggregateDataset {
        interval,
        axis: axis[lo..hi].to_vec(),
        hidden,
        entries,
    }
}

/// Index range `[lo, hi)` of the kept axis and the number of hidden periods.
fn window_bounds(axis: &[NaiveDate], options: &AggregateOptions) -> (usize, usize, usize) {
    let first_visible = options.start.map_or(0, |s| {
        let bucket = options.interval.bucket_start(s);
        axis.partition_point(|p| *p < bucket)
    });
    let hi = options
        .end
        .map_or(axis.len(), |e| axis.partition_point(|p| *p <= e))
        .max(first_visible);
    let hidden = usize::from(options.lookback && first_visible > 0 && first_visible < hi);
    (first_visible - hidden, hi, hidden)
}

fn forward_fill(column: &mut [Option<f64>]) {
    let mut last = None;
    for slot in column.iter_mut() {
        match slot {
            Some(v) => last = Some(*v),
            None => *slot = last,
        }
    }
}
