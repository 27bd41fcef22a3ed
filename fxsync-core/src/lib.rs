//! fxsync core: incremental synchronization of daily exchange rates.
//!
//! This crate contains the sync pipeline and everything it talks to:
//! - Domain types (currency codes, catalogs, table ids, rate rows)
//! - Remote rate source (HTTP client with retry and circuit breaker, fixtures)
//! - Rate table store (SQLite, one table per base currency) and the run lock
//! - Sync components: bootstrap, sync point, catch-up fetcher, append writer
//! - Configuration, the injected logging capability and the clock

pub mod clock;
pub mod config;
pub mod domain;
pub mod log;
pub mod source;
pub mod store;
pub mod sync;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, SourceConfig, SyncConfig};
pub use domain::{ColumnSet, CurrencyCatalog, CurrencyCode, DomainError, RateRow, RowBatch, TableId};
pub use log::{MemoryLog, SyncLog, TracingLog};
pub use source::{FixtureSource, HttpRateSource, RateDate, RateSource, SourceError};
pub use store::{RateStore, SqliteStore, StoreError, SyncLock};
pub use sync::{run_sync_job, FailurePolicy, SyncContext, SyncError, SyncSummary, SyncTarget};

#[cfg(test)]
mod tests {
    use super::*;

    /// Values handed across threads by callers must stay Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<CurrencyCode>();
        require_sync::<CurrencyCode>();
        require_send::<RowBatch>();
        require_sync::<RowBatch>();
        require_send::<SyncError>();
        require_sync::<SyncError>();
        require_send::<HttpRateSource>();
        require_sync::<HttpRateSource>();
        require_send::<FixtureSource>();
        require_sync::<FixtureSource>();
    }
}
