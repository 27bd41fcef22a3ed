//! Catch-up fetcher: one row per calendar day after the sync point.

use chrono::{Duration, NaiveDate};

use super::bootstrap::expected_columns;
use super::{SyncContext, SyncError};
use crate::domain::{ColumnSet, CurrencyCode, RateRow, RowBatch, TableId};
use crate::source::{DailyRates, RateDate};

/// Fetch every day in `(since, today]` for `base`.
///
/// `today` is read once on entry so a run crossing midnight still stops.
/// A day the source has no data for is filled with the previous day's
/// rates but keeps its own date; if that previous day is missing too the
/// whole fetch fails with `SourceUnavailable`.
pub fn fetch_since(
    ctx: &SyncContext<'_>,
    base: &CurrencyCode,
    table: &TableId,
    since: NaiveDate,
) -> Result<RowBatch, SyncError> {
    let today = ctx.clock.today();
    if since >= today {
        ctx.log.info(&format!("{base}: already synced through {since}, nothing to fetch"));
        return Ok(RowBatch::default());
    }

    let columns = row_shape(ctx, table)?;
    let mut batch = RowBatch::new(columns);

    ctx.log.info(&format!(
        "{base}: fetching {} day(s) from {} to {today}",
        (today - since).num_days(),
        since + Duration::days(1)
    ));

    let mut cursor = since + Duration::days(1);
    while cursor <= today {
        let rates = fetch_day(ctx, base, cursor)?;
        let row = build_row(cursor, &rates, batch.columns());
        batch.push(row)?;
        cursor += Duration::days(1);
    }

    ctx.log.debug(&format!("{base}: assembled {} row(s)", batch.len()));
    Ok(batch)
}

/// Column layout for new rows: the table's own columns when it exists,
/// otherwise what the catalog would create.
fn row_shape(ctx: &SyncContext<'_>, table: &TableId) -> Result<ColumnSet, SyncError> {
    if ctx.store.table_exists(table)? {
        Ok(ctx.store.table_columns(table)?)
    } else {
        expected_columns(ctx)
    }
}

fn fetch_day(
    ctx: &SyncContext<'_>,
    base: &CurrencyCode,
    day: NaiveDate,
) -> Result<DailyRates, SyncError> {
    match ctx.source.daily_rates(base, RateDate::On(day)) {
        Ok(rates) => Ok(rates),
        Err(e) if e.is_no_data() => {
            let fallback = day - Duration::days(1);
            ctx.log.warn(&format!(
                "{base}: no rates for {day}, filling from {fallback}"
            ));
            match ctx.source.daily_rates(base, RateDate::On(fallback)) {
                Ok(rates) => Ok(rates),
                Err(e) if e.is_no_data() => {
                    ctx.log.error(&format!(
                        "{base}: no rates for {day} nor {fallback}; aborting"
                    ));
                    Err(SyncError::SourceUnavailable {
                        base: base.to_string(),
                        date: day,
                        fallback,
                    })
                }
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}

fn build_row(date: NaiveDate, rates: &DailyRates, columns: &ColumnSet) -> RateRow {
    RateRow {
        date,
        values: columns.currencies().iter().map(|c| rates.rate(c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::CurrencyCatalog;
    use crate::log::MemoryLog;
    use crate::source::{FixtureSource, SourceError};
    use crate::store::{RateStore, SqliteStore};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::new("usd").unwrap()
    }

    fn table() -> TableId {
        TableId::for_prefix("dollar").unwrap()
    }

    fn catalog() -> CurrencyCatalog {
        CurrencyCatalog::from_entries([("eur", "Euro"), ("jpy", "Yen")]).0
    }

    fn source_with_days(days: &[u32]) -> FixtureSource {
        let mut source = FixtureSource::new(catalog());
        for &day in days {
            source.insert_day(&usd(), d(day), [("eur", day as f64), ("jpy", 150.0)]);
        }
        source
    }

    #[test]
    fn same_day_is_empty_without_touching_source() {
        let source = source_with_days(&[10]);
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        let batch = fetch_since(&ctx, &usd(), &table(), d(10)).unwrap();
        assert!(batch.is_empty());
        assert_eq!(source.request_count(), 0);
    }

    #[test]
    fn future_since_is_empty() {
        let source = source_with_days(&[]);
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        assert!(fetch_since(&ctx, &usd(), &table(), d(12)).unwrap().is_empty());
    }

    #[test]
    fn one_row_per_day_in_ascending_order() {
        let source = source_with_days(&[6, 7, 8, 9, 10]);
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        let batch = fetch_since(&ctx, &usd(), &table(), d(5)).unwrap();

        let dates: Vec<_> = batch.rows().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(6), d(7), d(8), d(9), d(10)]);
        assert_eq!(batch.columns().len(), 2);
        assert_eq!(batch.rows()[0].values, vec![Some(6.0), Some(150.0)]);
    }

    #[test]
    fn missing_day_uses_previous_day_values_with_own_date() {
        let source = source_with_days(&[8, 10]);
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        let batch = fetch_since(&ctx, &usd(), &table(), d(8)).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[0].date, d(9));
        assert_eq!(batch.rows()[0].values[0], Some(8.0));
        assert_eq!(batch.rows()[1].date, d(10));
        assert_eq!(
            source.requests(),
            vec![
                (usd(), RateDate::On(d(9))),
                (usd(), RateDate::On(d(8))),
                (usd(), RateDate::On(d(10))),
            ]
        );
        assert!(log.contains("filling from"));
    }

    #[test]
    fn two_missing_days_are_fatal() {
        let source = source_with_days(&[7, 10]);
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        let err = fetch_since(&ctx, &usd(), &table(), d(7)).unwrap_err();
        match err {
            SyncError::SourceUnavailable { date, fallback, .. } => {
                assert_eq!(date, d(9));
                assert_eq!(fallback, d(8));
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn network_errors_do_not_trigger_fallback() {
        let source = source_with_days(&[8, 9, 10]).with_unreachable_day(d(9));
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        let err = fetch_since(&ctx, &usd(), &table(), d(8)).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Source(SourceError::NetworkUnreachable(_))
        ));
        assert_eq!(source.request_count(), 1);
    }

    #[test]
    fn absent_target_currency_is_null() {
        let mut source = FixtureSource::new(catalog());
        source.insert_day(&usd(), d(10), [("eur", 0.91)]);
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        let batch = fetch_since(&ctx, &usd(), &table(), d(9)).unwrap();
        assert_eq!(batch.rows()[0].values, vec![Some(0.91), None]);
    }

    #[test]
    fn row_shape_follows_existing_table() {
        let source = source_with_days(&[10]);
        let store = SqliteStore::open_in_memory().unwrap();
        let narrow = ColumnSet::new(vec![CurrencyCode::new("jpy").unwrap()]);
        store.create_table(&table(), &narrow).unwrap();
        let clock = FixedClock(d(10));
        let log = MemoryLog::new();
        let ctx = SyncContext::new(&source, &store, &clock, &log);

        let batch = fetch_since(&ctx, &usd(), &table(), d(9)).unwrap();
        assert_eq!(batch.columns(), &narrow);
        assert_eq!(batch.rows()[0].values, vec![Some(150.0)]);
    }
}
