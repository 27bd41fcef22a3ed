//! Per-base sync composition and the multi-base run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bootstrap::ensure_table;
use super::fetcher::fetch_since;
use super::sync_point::last_synced_date;
use super::writer::append;
use super::{SyncContext, SyncError};
use crate::domain::{CurrencyCode, TableId};

/// What a failing base currency does to the rest of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next base.
    #[default]
    Continue,
    /// Stop at the first failing base.
    Abort,
}

/// One base currency and the table its rates live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub base: CurrencyCode,
    pub table: TableId,
}

impl SyncTarget {
    pub fn new(base: CurrencyCode, table: TableId) -> Self {
        Self { base, table }
    }
}

/// Result of syncing one base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub base: CurrencyCode,
    pub table: TableId,
    /// Sync point the catch-up started after.
    pub since: NaiveDate,
    pub rows_written: usize,
    /// Whether the table had to be created in this run.
    pub bootstrapped: bool,
}

#[derive(Debug)]
pub struct SyncFailure {
    pub base: CurrencyCode,
    pub table: TableId,
    pub error: SyncError,
}

#[derive(Debug, Default)]
pub struct SyncSummary {
    pub outcomes: Vec<SyncOutcome>,
    pub failures: Vec<SyncFailure>,
}

impl SyncSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn rows_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.rows_written).sum()
    }

    /// Base currencies that failed, in run order.
    pub fn failed_bases(&self) -> Vec<&CurrencyCode> {
        self.failures.iter().map(|f| &f.base).collect()
    }
}

/// Sync one base: bootstrap if needed, resolve the sync point, fetch, append.
pub fn sync_one(ctx: &SyncContext<'_>, target: &SyncTarget) -> Result<SyncOutcome, SyncError> {
    let SyncTarget { base, table } = target;

    let bootstrapped = if ctx.store.table_exists(table)? {
        false
    } else {
        ensure_table(ctx, base, table)?;
        true
    };

    let since = last_synced_date(ctx, table);
    let batch = fetch_since(ctx, base, table, since)?;
    let rows_written = append(ctx, &batch, table)?;

    Ok(SyncOutcome {
        base: base.clone(),
        table: table.clone(),
        since,
        rows_written,
        bootstrapped,
    })
}

/// Sync every target in order.
///
/// Under `FailurePolicy::Continue` every target is attempted and failures are
/// collected in the summary. Under `Abort` the first failure is returned as
/// the error and later targets are not touched.
pub fn sync_all(
    ctx: &SyncContext<'_>,
    targets: &[SyncTarget],
    policy: FailurePolicy,
) -> Result<SyncSummary, SyncError> {
    let mut summary = SyncSummary::default();

    for target in targets {
        ctx.log.info(&format!("syncing {} into {}", target.base, target.table));
        match sync_one(ctx, target) {
            Ok(outcome) => {
                ctx.log.info(&format!(
                    "{}: {} new row(s) after {}",
                    outcome.base, outcome.rows_written, outcome.since
                ));
                summary.outcomes.push(outcome);
            }
            Err(error) => {
                ctx.log.error(&format!("{}: sync failed: {error}", target.base));
                if policy == FailurePolicy::Abort {
                    return Err(error);
                }
                summary.failures.push(SyncFailure {
                    base: target.base.clone(),
                    table: target.table.clone(),
                    error,
                });
            }
        }
    }

    ctx.log.info(&format!(
        "sync finished: {} succeeded, {} failed, {} row(s) written",
        summary.outcomes.len(),
        summary.failures.len(),
        summary.rows_written()
    ));
    Ok(summary)
}
