//! Rate table store: one relational table per base currency.
//!
//! The RateStore trait is the only way the sync components touch persisted
//! data. `table_exists` is an explicit capability so "no table yet" is a
//! normal branch rather than an error to be caught.

pub mod lock;
pub mod sqlite;

pub use lock::SyncLock;
pub use sqlite::SqliteStore;

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{ColumnSet, DomainError, RowBatch, TableId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("table '{table}' holds an unreadable exchange_date '{value}'")]
    InvalidDate { table: String, value: String },

    #[error("table '{table}' has column '{column}' that is not a currency code")]
    UnexpectedColumn { table: String, column: String },

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("sync lock {} is held by another run (remove it if no run is active)", path.display())]
    Locked { path: PathBuf },
}

pub trait RateStore {
    fn table_exists(&self, table: &TableId) -> Result<bool, StoreError>;

    /// Create `table` with `exchange_date` plus one nullable float column per
    /// currency. Fails with `TableAlreadyExists` if it is already there.
    fn create_table(&self, table: &TableId, columns: &ColumnSet) -> Result<(), StoreError>;

    /// Currency columns of an existing table, in table order.
    fn table_columns(&self, table: &TableId) -> Result<ColumnSet, StoreError>;

    /// Latest stored `exchange_date`; `None` for an empty table.
    fn max_exchange_date(&self, table: &TableId) -> Result<Option<NaiveDate>, StoreError>;

    /// Insert every row of `batch` as new records. The batch's columns must
    /// exist in the table. Returns the number of rows written.
    fn append_rows(&self, table: &TableId, batch: &RowBatch) -> Result<usize, StoreError>;

    /// Whole table, ascending by date.
    fn read_table(&self, table: &TableId) -> Result<RowBatch, StoreError>;

    fn row_count(&self, table: &TableId) -> Result<usize, StoreError>;
}
