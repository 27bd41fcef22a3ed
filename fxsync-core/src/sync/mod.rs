//! Incremental sync of daily rates into per-base rate tables.
//!
//! Flow per base currency:
//! 1. `bootstrap`: create the table from the source catalog when missing
//! 2. `sync_point`: last stored date, or the retention floor
//! 3. `fetcher`: one row per day from the sync point to today, with the
//!    previous-day fallback for a missing day
//! 4. `writer`: project onto the table's columns and append
//!
//! `orchestrator` runs this for every configured base; `job` wraps it with
//! store opening and the run lock.

pub mod bootstrap;
pub mod fetcher;
pub mod job;
pub mod orchestrator;
pub mod sync_point;
pub mod writer;

pub use bootstrap::{ensure_table, expected_columns};
pub use fetcher::fetch_since;
pub use job::{run_sync_job, run_sync_job_at};
pub use orchestrator::{
    sync_all, sync_one, FailurePolicy, SyncFailure, SyncOutcome, SyncSummary, SyncTarget,
};
pub use sync_point::last_synced_date;
pub use writer::append;

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::clock::Clock;
use crate::config::ConfigError;
use crate::domain::DomainError;
use crate::log::SyncLog;
use crate::source::{RateSource, SourceError};
use crate::store::{RateStore, StoreError};

/// Capabilities shared by all sync components for one run.
pub struct SyncContext<'a> {
    pub source: &'a dyn RateSource,
    pub store: &'a dyn RateStore,
    pub clock: &'a dyn Clock,
    pub log: &'a dyn SyncLog,
    /// Days of history an empty table starts with.
    pub retention_days: i64,
}

impl<'a> SyncContext<'a> {
    pub fn new(
        source: &'a dyn RateSource,
        store: &'a dyn RateStore,
        clock: &'a dyn Clock,
        log: &'a dyn SyncLog,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            log,
            retention_days: 365,
        }
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Both the requested day and the day before it are missing at the source.
    #[error("rate source has no data for {base} on {date} nor on fallback day {fallback}")]
    SourceUnavailable {
        base: String,
        date: NaiveDate,
        fallback: NaiveDate,
    },

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Another run holds the database lock.
    #[error("another sync run holds {}", path.display())]
    Locked { path: PathBuf },
}
