//! fxsync report: summary tables, monthly trends and text charts over the
//! synced rate tables.
//!
//! Artifacts written per run:
//! - **Markdown**: `Exchange Rate Report YYYY-MM-DD.md`, one section per currency
//! - **CSV**: `trend_<code>_<base>.csv`, the monthly trend behind each chart
//! - **JSON**: `manifest.json` with table row counts and BLAKE3 fingerprints

pub mod chart;
pub mod config;
pub mod export;
pub mod loader;
pub mod manifest;
pub mod pipeline;
pub mod reports;
pub mod summary;
pub mod trend;

pub use config::ReportConfig;
pub use loader::{load_tables, BaseTable};
pub use pipeline::{report_pipeline, ReportPaths};
pub use summary::{summarize, CurrencySummary, WindowRange};
pub use trend::{monthly_trend, MonthlyPoint};

use std::path::PathBuf;
use thiserror::Error;

use fxsync_core::config::ConfigError;
use fxsync_core::store::StoreError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("currency '{code}' is not a column of table '{table}'")]
    UnknownCurrency { code: String, table: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("manifest serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}
