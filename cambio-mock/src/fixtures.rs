use std::ops::RangeInclusive;

use cambio_core::{Currency, Row, Table};
use chrono::{Days, NaiveDate};

fn seed(entity: &str) -> f64 {
    let sum: u32 = entity.bytes().map(u32::from).sum();
    f64::from(sum % 97 + 3)
}

fn currency(code: &str) -> Option<Currency> {
    Currency::new(code).ok()
}

/// Annual income statements dated December 31 of each year in `years`, newest first.
///
/// Values are derived from the entity name so different entities get different,
/// but reproducible, numbers.
#[must_use]
pub fn income_statements(entity: &str, currency_code: &str, years: RangeInclusive<i32>) -> Table {
    let base = seed(entity) * 1e9;
    let first = *years.start();
    let mut rows: Vec<Row> = years
        .filter_map(|year| {
            let date = NaiveDate::from_ymd_opt(year, 12, 31)?;
            let growth = 1.0 + 0.05 * f64::from(year - first);
            let revenue = base * growth;
            let net_income = revenue * 0.2;
            Some(
                Row::new(date)
                    .with("revenue", revenue)
                    .with("netIncome", net_income)
                    .with("eps", net_income / 1e9),
            )
        })
        .collect();
    rows.reverse();
    let table = Table::from_rows(rows);
    match currency(currency_code) {
        Some(c) => table.with_currency(c),
        None => table,
    }
}

/// Daily closes starting at `start`, one row per calendar day.
#[must_use]
pub fn daily_closes(start: NaiveDate, days: u32, first: f64, step: f64) -> Table {
    let rows = (0..days)
        .filter_map(|i| {
            let date = start.checked_add_days(Days::new(u64::from(i)))?;
            let close = first + step * f64::from(i);
            Some(
                Row::new(date)
                    .with("close", close)
                    .with("volume", 1_000_000.0 + f64::from(i)),
            )
        })
        .collect();
    Table::from_rows(rows)
}

/// Constant FX closes for a pair, one row per calendar day.
#[must_use]
pub fn fx_closes(start: NaiveDate, days: u32, rate: f64) -> Table {
    daily_closes(start, days, rate, 0.0)
}
