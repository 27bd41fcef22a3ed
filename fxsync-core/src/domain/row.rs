//! Rate rows and in-memory row batches.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;
use super::DomainError;

/// Name of the date column every rate table starts with.
pub const DATE_COLUMN: &str = "exchange_date";

/// Storage format of `exchange_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ordered currency columns of a rate table (the date column is implicit).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    currencies: Vec<CurrencyCode>,
}

impl ColumnSet {
    pub fn new(currencies: Vec<CurrencyCode>) -> Self {
        Self { currencies }
    }

    pub fn currencies(&self) -> &[CurrencyCode] {
        &self.currencies
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.currencies.contains(code)
    }

    pub fn position(&self, code: &CurrencyCode) -> Option<usize> {
        self.currencies.iter().position(|c| c == code)
    }

    /// Columns present in both sets, in `target`'s order.
    pub fn intersect(&self, target: &ColumnSet) -> ColumnSet {
        ColumnSet::new(
            target
                .currencies
                .iter()
                .filter(|c| self.contains(c))
                .cloned()
                .collect(),
        )
    }
}

/// One day of rates: the date plus one value per column (`None` = missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl RateRow {
    /// `exchange_date` as stored in the rate table.
    pub fn date_text(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Rows sharing one column layout.
///
/// Produced by the catch-up fetcher, consumed by the append writer, and
/// returned by table reads for reporting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowBatch {
    columns: ColumnSet,
    rows: Vec<RateRow>,
}

impl RowBatch {
    pub fn new(columns: ColumnSet) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: RateRow) -> Result<(), DomainError> {
        if row.values.len() != self.columns.len() {
            return Err(DomainError::RowWidthMismatch {
                date: row.date,
                expected: self.columns.len(),
                actual: row.values.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Values of one currency column, paired with row dates. Nulls are kept.
    pub fn column_values(&self, code: &CurrencyCode) -> Option<Vec<(NaiveDate, Option<f64>)>> {
        let idx = self.columns.position(code)?;
        Some(self.rows.iter().map(|r| (r.date, r.values[idx])).collect())
    }

    /// Reshape onto `target`: keep only columns `target` also has, in
    /// `target`'s order. Columns missing from `target` are dropped silently.
    pub fn project(&self, target: &ColumnSet) -> RowBatch {
        let columns = self.columns.intersect(target);
        let indices: Vec<usize> = columns
            .currencies()
            .iter()
            .filter_map(|c| self.columns.position(c))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|r| RateRow {
                date: r.date,
                values: indices.iter().map(|&i| r.values[i]).collect(),
            })
            .collect();

        RowBatch { columns, rows }
    }
}
