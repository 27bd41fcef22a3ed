//! Domain types: currency codes, catalogs, table ids, rate rows and batches.

pub mod currency;
pub mod row;
pub mod table;

pub use currency::{CurrencyCatalog, CurrencyCode};
pub use row::{ColumnSet, RateRow, RowBatch, DATE_COLUMN, DATE_FORMAT};
pub use table::TableId;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid currency code '{0}' (expected ASCII letters/digits)")]
    InvalidCurrencyCode(String),

    #[error("invalid table name '{0}' (expected a plain SQL identifier)")]
    InvalidTableId(String),

    #[error("row for {date} has {actual} values, batch has {expected} columns")]
    RowWidthMismatch {
        date: NaiveDate,
        expected: usize,
        actual: usize,
    },
}
