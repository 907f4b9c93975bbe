use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CambioError, Entity};

/// Period granularity of a request; also the calendar bucket used to align periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    /// One bucket per calendar day.
    #[default]
    Daily,
    /// One bucket per ISO week (Monday start).
    Weekly,
    /// One bucket per calendar month.
    Monthly,
    /// One bucket per calendar quarter.
    Quarterly,
    /// One bucket per calendar year.
    Yearly,
}

impl Interval {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Statement period label used by fundamentals endpoints: `quarter` or `annual`.
    #[must_use]
    pub const fn statement_period(self) -> &'static str {
        match self {
            Self::Quarterly => "quarter",
            Self::Daily | Self::Weekly | Self::Monthly | Self::Yearly => "annual",
        }
    }
}

/// Kind of table requested from providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dataset {
    /// Historical prices (open/high/low/close/volume and friends).
    #[default]
    Prices,
    /// Income statements.
    IncomeStatement,
    /// Balance sheet statements.
    BalanceSheet,
    /// Cash flow statements.
    CashFlow,
}

impl Dataset {
    /// Stable lowercase label, also used as capability name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prices => "prices",
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
        }
    }
}

/// Immutable description of what to fetch for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestSpec {
    entity: Entity,
    dataset: Dataset,
    interval: Interval,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    forward_fill: bool,
    lookback: bool,
}

impl RequestSpec {
    /// Start building a request for `entity`.
    #[must_use]
    pub const fn builder(entity: Entity) -> RequestSpecBuilder {
        RequestSpecBuilder {
            entity,
            dataset: Dataset::Prices,
            interval: Interval::Daily,
            start: None,
            end: None,
            forward_fill: false,
            lookback: false,
        }
    }

    /// Requested entity.
    #[must_use]
    pub const fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Requested dataset.
    #[must_use]
    pub const fn dataset(&self) -> Dataset {
        self.dataset
    }

    /// Requested interval.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Inclusive start of the visible window, if bounded.
    #[must_use]
    pub const fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    /// Inclusive end of the visible window, if bounded.
    #[must_use]
    pub const fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Whether the aggregator should forward-fill holes for this request.
    #[must_use]
    pub const fn forward_fill(&self) -> bool {
        self.forward_fill
    }

    /// Whether one period before `start` should be retained for period-over-period deltas.
    #[must_use]
    pub const fn lookback(&self) -> bool {
        self.lookback
    }

    /// First date a provider must be asked for.
    ///
    /// Equals `start`, widened to the start of the previous bucket when `lookback`
    /// is set so the hidden period is actually fetched.
    #[must_use]
    pub fn fetch_start(&self) -> Option<NaiveDate> {
        self.start.map(|start| {
            if self.lookback {
                self.interval.previous_bucket_start(start)
            } else {
                start
            }
        })
    }

    /// Same request shape for another entity.
    #[must_use]
    pub fn for_entity(&self, entity: Entity) -> Self {
        Self {
            entity,
            ..self.clone()
        }
    }

    /// True when `other` differs from `self` only by entity.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.dataset == other.dataset
            && self.interval == other.interval
            && self.start == other.start
            && self.end == other.end
            && self.forward_fill == other.forward_fill
            && self.lookback == other.lookback
    }
}

/// Builder for [`RequestSpec`]; validation is deferred to [`RequestSpecBuilder::build`].
#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    entity: Entity,
    dataset: Dataset,
    interval: Interval,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    forward_fill: bool,
    lookback: bool,
}

impl RequestSpecBuilder {
    /// Select the dataset.
    #[must_use]
    pub const fn dataset(mut self, dataset: Dataset) -> Self {
        self.dataset = dataset;
        self
    }

    /// Select the interval.
    #[must_use]
    pub const fn interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Set an inclusive start date.
    #[must_use]
    pub const fn start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Set an inclusive end date.
    #[must_use]
    pub const fn end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// Set both window bounds.
    #[must_use]
    pub const fn window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Forward-fill holes during aggregation.
    #[must_use]
    pub const fn forward_fill(mut self, yes: bool) -> Self {
        self.forward_fill = yes;
        self
    }

    /// Keep one hidden period before `start` for period-over-period deltas.
    #[must_use]
    pub const fn lookback(mut self, yes: bool) -> Self {
        self.lookback = yes;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `start` is after `end`.
    pub fn build(self) -> Result<RequestSpec, CambioError> {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start > end
        {
            return Err(CambioError::InvalidArg(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(RequestSpec {
            entity: self.entity,
            dataset: self.dataset,
            interval: self.interval,
            start: self.start,
            end: self.end,
            forward_fill: self.forward_fill,
            lookback: self.lookback,
        })
    }
}
