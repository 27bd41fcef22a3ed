//! Loading rate tables for reporting.

use fxsync_core::domain::{CurrencyCode, RowBatch, TableId};
use fxsync_core::store::RateStore;
use fxsync_core::sync::SyncTarget;

use crate::ReportError;

/// One base currency's full table, labelled for display.
#[derive(Debug, Clone)]
pub struct BaseTable {
    pub base: CurrencyCode,
    pub table: TableId,
    /// Title-cased table prefix (`dollar_based_currency` -> `Dollar`).
    pub label: String,
    pub rows: RowBatch,
}

impl BaseTable {
    pub fn new(base: CurrencyCode, table: TableId, rows: RowBatch) -> Self {
        let label = title_case(table.prefix());
        Self {
            base,
            table,
            label,
            rows,
        }
    }

    /// Values of `code` with their dates, ascending; `UnknownCurrency` if the
    /// table has no such column.
    pub fn series(&self, code: &CurrencyCode) -> Result<Vec<(chrono::NaiveDate, Option<f64>)>, ReportError> {
        self.rows
            .column_values(code)
            .ok_or_else(|| ReportError::UnknownCurrency {
                code: code.to_string(),
                table: self.table.to_string(),
            })
    }
}

/// Read every target's table in full.
pub fn load_tables(store: &dyn RateStore, targets: &[SyncTarget]) -> Result<Vec<BaseTable>, ReportError> {
    targets
        .iter()
        .map(|target| {
            let rows = store.read_table(&target.table)?;
            tracing::debug!(table = %target.table, rows = rows.len(), "loaded rate table");
            Ok(BaseTable::new(target.base.clone(), target.table.clone(), rows))
        })
        .collect()
}

fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
