//! Schema bootstrap: derive a rate table's columns from the source catalog.

use super::{SyncContext, SyncError};
use crate::domain::{ColumnSet, CurrencyCode, TableId};
use crate::store::StoreError;

/// Columns a freshly created table would have: one per catalog currency.
pub fn expected_columns(ctx: &SyncContext<'_>) -> Result<ColumnSet, SyncError> {
    let catalog = ctx.source.currencies()?;
    ctx.log.debug(&format!(
        "currency catalog from {}: {} currencies",
        ctx.source.name(),
        catalog.len()
    ));
    Ok(catalog.column_set())
}

/// Make sure `table` exists for `base`, creating it from the catalog if not.
///
/// An existing table is taken as-is; its schema is not compared against the
/// catalog. Returns the catalog-derived column set either way.
pub fn ensure_table(
    ctx: &SyncContext<'_>,
    base: &CurrencyCode,
    table: &TableId,
) -> Result<ColumnSet, SyncError> {
    let columns = expected_columns(ctx)?;

    if ctx.store.table_exists(table)? {
        ctx.log.debug(&format!("table {table} already present for {base}"));
        return Ok(columns);
    }

    match ctx.store.create_table(table, &columns) {
        Ok(()) => {
            ctx.log.info(&format!(
                "table {table} created for {base} with {} currency columns",
                columns.len()
            ));
        }
        // Someone else created it between the check and the create.
        Err(StoreError::TableAlreadyExists(_)) => {
            ctx.log.debug(&format!("table {table} appeared concurrently; keeping it"));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(columns)
}
