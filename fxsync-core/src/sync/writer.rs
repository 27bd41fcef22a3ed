use super::{SyncContext, SyncError};
use crate::domain::{RowBatch, TableId};
use crate::store::StoreError;

/// Append `batch` to `table` after projecting it onto the table's columns.
///
/// Append-only: rows are never updated or deduplicated by date. Fetched
/// columns the table lacks are dropped; table columns the batch lacks are
/// left NULL.
pub fn append(ctx: &SyncContext<'_>, batch: &RowBatch, table: &TableId) -> Result<usize, SyncError> {
    if batch.is_empty() {
        ctx.log.debug(&format!("{table}: empty batch, nothing to append"));
        return Ok(0);
    }

    if !ctx.store.table_exists(table)? {
        return Err(StoreError::TableNotFound(table.to_string()).into());
    }

    let table_columns = ctx.store.table_columns(table)?;
    let projected = batch.project(&table_columns);
    let dropped = batch.columns().len() - projected.columns().len();
    if dropped > 0 {
        ctx.log.debug(&format!(
            "{table}: dropping {dropped} fetched column(s) not in the table"
        ));
    }

    let written = ctx.store.append_rows(table, &projected)?;
    ctx.log.info(&format!(
        "{table}: appended {written} row(s) ({} to {})",
        display_date(projected.first_date()),
        display_date(projected.last_date()),
    ));
    Ok(written)
}

fn display_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}
