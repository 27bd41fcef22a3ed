use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use fxsync_core::config::ConfigError;
use fxsync_core::domain::CurrencyCode;

/// Which currencies the report covers and where it goes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub currencies: Vec<String>,
    pub output_dir: PathBuf,
    /// Months shown in each trend chart (13 gives a full year plus the
    /// current month).
    pub history_months: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currencies: ["dkk", "brl", "jpy", "gbp", "cny"]
                .into_iter()
                .map(String::from)
                .collect(),
            output_dir: PathBuf::from("reports"),
            history_months: 13,
        }
    }
}

impl ReportConfig {
    pub fn currency_codes(&self) -> Result<Vec<CurrencyCode>, ConfigError> {
        self.currencies
            .iter()
            .map(|c| {
                CurrencyCode::new(c).map_err(|e| ConfigError::Invalid(format!("[report] currencies: {e}")))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currencies.is_empty() {
            return Err(ConfigError::Invalid("[report] currencies must not be empty".into()));
        }
        if self.history_months == 0 {
            return Err(ConfigError::Invalid("[report] history_months must be positive".into()));
        }
        self.currency_codes().map(|_| ())
    }
}
