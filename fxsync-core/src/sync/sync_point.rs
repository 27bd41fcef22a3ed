use chrono::{Duration, NaiveDate};

use super::SyncContext;
use crate::domain::TableId;

/// Date the next catch-up starts after.
///
/// Never fails: a missing table, a failing query and an empty table all
/// resolve to the retention floor `today - retention_days`.
pub fn last_synced_date(ctx: &SyncContext<'_>, table: &TableId) -> NaiveDate {
    let floor = retention_floor(ctx.clock.today(), ctx.retention_days);

    match ctx.store.table_exists(table) {
        Ok(true) => {}
        Ok(false) => {
            ctx.log
                .debug(&format!("table {table} not found; sync point is retention floor {floor}"));
            return floor;
        }
        Err(e) => {
            ctx.log.warn(&format!("cannot check table {table}: {e}; using {floor}"));
            return floor;
        }
    }

    match ctx.store.max_exchange_date(table) {
        Ok(Some(date)) => {
            ctx.log.debug(&format!("table {table} synced through {date}"));
            date
        }
        Ok(None) => {
            ctx.log.debug(&format!("table {table} is empty; sync point is {floor}"));
            floor
        }
        Err(e) => {
            ctx.log.warn(&format!("max(exchange_date) on {table} failed: {e}; using {floor}"));
            floor
        }
    }
}

/// `today - retention_days`, clamped to the earliest representable date.
pub(crate) fn retention_floor(today: NaiveDate, retention_days: i64) -> NaiveDate {
    Duration::try_days(retention_days)
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}
