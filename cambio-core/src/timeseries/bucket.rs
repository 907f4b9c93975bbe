use chrono::{Datelike, Days, Months, NaiveDate};

use crate::request::Interval;

impl Interval {
    /// First day of the calendar bucket containing `date`.
    ///
    /// Weeks start on Monday (ISO 8601).
    #[must_use]
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => date - Days::new(u64::from(date.weekday().num_days_from_monday())),
            Self::Monthly => date - Days::new(u64::from(date.day0())),
            Self::Quarterly => {
                let month = date.month0() / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
            }
            Self::Yearly => date - Days::new(u64::from(date.ordinal0())),
        }
    }

    /// Last day of the calendar bucket containing `date`.
    #[must_use]
    pub fn bucket_end(self, date: NaiveDate) -> NaiveDate {
        let start = self.bucket_start(date);
        let next = match self {
            Self::Daily => start.checked_add_days(Days::new(1)),
            Self::Weekly => start.checked_add_days(Days::new(7)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
            Self::Quarterly => start.checked_add_months(Months::new(3)),
            Self::Yearly => start.checked_add_months(Months::new(12)),
        };
        next.and_then(|n| n.pred_opt()).unwrap_or(NaiveDate::MAX)
    }

    /// First day of the bucket just before the one containing `date`.
    #[must_use]
    pub fn previous_bucket_start(self, date: NaiveDate) -> NaiveDate {
        let start = self.bucket_start(date);
        start.pred_opt().map_or(start, |prev| self.bucket_start(prev))
    }

    /// Human-readable label of the bucket containing `date`:
    /// `2024-03-15`, `2024-W11`, `2024-03`, `2024Q1`, `2024`.
    #[must_use]
    pub fn label(self, date: NaiveDate) -> String {
        match self {
            Self::Daily => date.format("%Y-%m-%d").to_string(),
            Self::Weekly => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Monthly => date.format("%Y-%m").to_string(),
            Self::Quarterly => format!("{}Q{}", date.year(), date.month0() / 3 + 1),
            Self::Yearly => date.year().to_string(),
        }
    }
}
