//! The scheduled sync job: the entry point callers outside the crate use.

use super::orchestrator::{sync_all, SyncSummary};
use super::{SyncContext, SyncError};
use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::log::SyncLog;
use crate::source::RateSource;
use crate::store::{SqliteStore, StoreError, SyncLock};

/// Sync every configured base into the configured database.
pub fn run_sync_job(
    config: &SyncConfig,
    source: &dyn RateSource,
    log: &dyn SyncLog,
) -> Result<SyncSummary, SyncError> {
    run_sync_job_at(config, source, &SystemClock, log)
}

/// `run_sync_job` with an explicit clock.
///
/// The database lock is held for the whole run; a second concurrent run
/// fails with `SyncError::Locked` instead of appending duplicate days.
pub fn run_sync_job_at(
    config: &SyncConfig,
    source: &dyn RateSource,
    clock: &dyn Clock,
    log: &dyn SyncLog,
) -> Result<SyncSummary, SyncError> {
    config.validate()?;
    let targets = config.targets()?;

    let _lock = SyncLock::acquire(&config.database).map_err(|e| match e {
        StoreError::Locked { path } => SyncError::Locked { path },
        other => SyncError::Store(other),
    })?;

    let store = SqliteStore::open(&config.database)?;
    log.info(&format!(
        "sync job started: {} base(s) into {} (source: {})",
        targets.len(),
        config.database.display(),
        source.name()
    ));

    let ctx = SyncContext::new(source, &store, clock, log).with_retention_days(config.retention_days);
    sync_all(&ctx, &targets, config.on_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::{CurrencyCatalog, CurrencyCode, TableId};
    use crate::log::MemoryLog;
    use crate::source::FixtureSource;
    use crate::store::RateStore;
    use chrono::NaiveDate;

    fn fixture(today: NaiveDate) -> FixtureSource {
        let usd = CurrencyCode::new("usd").unwrap();
        let catalog = CurrencyCatalog::from_entries([("eur", "Euro"), ("usd", "US Dollar")]).0;
        FixtureSource::new(catalog)
            .with_day(&usd, today.pred_opt().unwrap(), [("eur", 0.92)])
            .with_day(&usd, today, [("eur", 0.93)])
    }

    fn config(dir: &std::path::Path) -> SyncConfig {
        let mut config = SyncConfig {
            database: dir.join("db/rates.db"),
            retention_days: 2,
            ..SyncConfig::default()
        };
        config.bases.clear();
        config.bases.insert("usd".into(), "dollar".into());
        config
    }

    #[test]
    fn job_writes_into_configured_database_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        let config = config(dir.path());
        let source = fixture(today);
        let log = MemoryLog::new();

        let summary = run_sync_job_at(&config, &source, &FixedClock(today), &log).unwrap();

        assert!(summary.all_succeeded());
        assert_eq!(summary.rows_written(), 2);
        assert!(!SyncLock::lock_path(&config.database).exists());

        let store = SqliteStore::open(&config.database).unwrap();
        let table = TableId::for_prefix("dollar").unwrap();
        assert_eq!(store.row_count(&table).unwrap(), 2);
    }

    #[test]
    fn held_lock_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        let config = config(dir.path());
        let _held = SyncLock::acquire(&config.database).unwrap();

        let err = run_sync_job_at(&config, &fixture(today), &FixedClock(today), &MemoryLog::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::Locked { .. }));
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.bases.insert("bad code".into(), "x".into());

        let today = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        let err = run_sync_job_at(&config, &fixture(today), &FixedClock(today), &MemoryLog::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(!config.database.exists());
    }

    #[test]
    fn oversized_retention_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyncConfig {
            retention_days: i64::MAX / 1000,
            ..config(dir.path())
        };

        let today = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        let err = run_sync_job_at(&config, &fixture(today), &FixedClock(today), &MemoryLog::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
