use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CambioError, Currency};

/// One dated record of numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Observation or statement date as reported by the provider.
    pub date: NaiveDate,
    /// Numeric fields keyed by provider field name.
    pub values: BTreeMap<String, f64>,
}

impl Row {
    /// Create an empty row for `date`.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert of one field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: f64) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Value of `field`, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }
}

/// Tabular payload returned by one provider for one entity.
///
/// Rows keep provider order; the aggregator is responsible for ordering and
/// de-duplication.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Row>,
    currency: Option<Currency>,
}

impl Table {
    /// Empty table without a currency.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: Vec::new(),
            currency: None,
        }
    }

    /// Table holding `rows`.
    #[must_use]
    pub const fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            currency: None,
        }
    }

    /// Attach the reporting currency.
    #[must_use]
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Append a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Rows in provider order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume the table into its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Reporting currency, if the provider declared one.
    #[must_use]
    pub const fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    /// True when the provider returned no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Wire encoding of a provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PayloadKind {
    /// JSON array of records, or a single record object.
    #[default]
    Json,
    /// CSV with a header line.
    Csv,
}

/// How to turn a successful response body into a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFormat {
    /// Wire encoding.
    pub kind: PayloadKind,
    /// Dot-separated path to the records inside a JSON document (e.g. `historical`).
    pub records_path: Option<String>,
    /// Field holding the record date.
    pub date_field: String,
    /// Field holding the reporting currency, looked up per record then on the JSON root.
    pub currency_field: Option<String>,
}

impl Default for PayloadFormat {
    fn default() -> Self {
        Self::json("date")
    }
}

impl PayloadFormat {
    /// JSON payload with records at the document root.
    pub fn json(date_field: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Json,
            records_path: None,
            date_field: date_field.into(),
            currency_field: None,
        }
    }

    /// CSV payload with a header line.
    pub fn csv(date_field: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Csv,
            records_path: None,
            date_field: date_field.into(),
            currency_field: None,
        }
    }

    /// Read records from a nested JSON path.
    #[must_use]
    pub fn records_at(mut self, path: impl Into<String>) -> Self {
        self.records_path = Some(path.into());
        self
    }

    /// Read the reporting currency from `field`.
    #[must_use]
    pub fn currency_field(mut self, field: impl Into<String>) -> Self {
        self.currency_field = Some(field.into());
        self
    }

    /// Decode a response body.
    ///
    /// Records without a parseable date or without any numeric field are dropped.
    /// A JSON `null`, `{}` or missing records path decodes to an empty table.
    ///
    /// # Errors
    /// Returns `Data` when the body is not valid JSON/CSV, when the records node has an
    /// unexpected shape, or when a CSV header lacks the date column.
    pub fn decode(&self, body: &str) -> Result<Table, CambioError> {
        match self.kind {
            PayloadKind::Json => self.decode_json(body),
            PayloadKind::Csv => self.decode_csv(body),
        }
    }

    fn decode_json(&self, body: &str) -> Result<Table, CambioError> {
        if body.trim().is_empty() {
            return Ok(Table::new());
        }
        let root: Value = serde_json::from_str(body)
            .map_err(|e| CambioError::Data(format!("invalid JSON payload: {e}")))?;

        let node = match &self.records_path {
            Some(path) => path.split('.').try_fold(&root, |v, key| v.get(key)),
            None => Some(&root),
        };
        let records: Vec<&Map<String, Value>> = match node {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            Some(Value::Object(obj)) if obj.is_empty() => Vec::new(),
            Some(Value::Object(obj)) => vec![obj],
            Some(other) => {
                return Err(CambioError::Data(format!(
                    "expected records array or object, found {}",
                    json_type(other)
                )));
            }
        };

        let mut table = Table::new();
        let mut currency: Option<Currency> = None;
        for rec in records {
            let Some(date) = rec.get(&self.date_field).and_then(json_date) else {
                continue;
            };
            if currency.is_none() {
                currency = self.currency_of(rec);
            }
            let mut row = Row::new(date);
            for (k, v) in rec {
                if self.is_meta(k) {
                    continue;
                }
                if let Some(x) = v.as_f64().filter(|x| x.is_finite()) {
                    row.values.insert(k.clone(), x);
                }
            }
            if !row.values.is_empty() {
                table.push(row);
            }
        }
        if currency.is_none() {
            currency = root.as_object().and_then(|obj| self.currency_of(obj));
        }
        table.currency = currency;
        Ok(table)
    }

    fn decode_csv(&self, body: &str) -> Result<Table, CambioError> {
        if body.trim().is_empty() {
            return Ok(Table::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| CambioError::Data(format!("CSV header error: {e}")))?
            .clone();
        let date_idx = headers
            .iter()
            .position(|h| h == self.date_field)
            .ok_or_else(|| {
                CambioError::Data(format!("CSV payload lacks date column '{}'", self.date_field))
            })?;
        let currency_idx = self
            .currency_field
            .as_deref()
            .and_then(|f| headers.iter().position(|h| h == f));

        let mut table = Table::new();
        for record in reader.records() {
            let record = record.map_err(|e| CambioError::Data(format!("CSV parse error: {e}")))?;
            let Some(date) = record.get(date_idx).and_then(parse_date_str) else {
                continue;
            };
            if table.currency.is_none() {
                table.currency = currency_idx
                    .and_then(|i| record.get(i))
                    .and_then(|c| Currency::new(c).ok());
            }
            let mut row = Row::new(date);
            for (i, (name, raw)) in headers.iter().zip(record.iter()).enumerate() {
                if i == date_idx || Some(i) == currency_idx {
                    continue;
                }
                if let Some(x) = raw.parse::<f64>().ok().filter(|x| x.is_finite()) {
                    row.values.insert(name.to_string(), x);
                }
            }
            if !row.values.is_empty() {
                table.push(row);
            }
        }
        Ok(table)
    }

    fn is_meta(&self, key: &str) -> bool {
        key == self.date_field || self.currency_field.as_deref() == Some(key)
    }

    fn currency_of(&self, obj: &Map<String, Value>) -> Option<Currency> {
        let field = self.currency_field.as_deref()?;
        obj.get(field)
            .and_then(Value::as_str)
            .and_then(|c| Currency::new(c).ok())
    }
}

const fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn json_date(v: &Value) -> Option<NaiveDate> {
    match v {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Millisecond epochs are larger than any plausible second epoch.
            let secs = if raw.unsigned_abs() > 100_000_000_000 {
                raw / 1000
            } else {
                raw
            };
            DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let head = s.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
