//! Serializable sync and source configuration.
//!
//! Every field has a default, so an empty file (or no file) reproduces the
//! stock setup: USD and EUR tables in `data/currency_exchange.db`, fed from
//! the public currency API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{CurrencyCode, TableId};
use crate::sync::{FailurePolicy, SyncTarget};

/// Upper bound for `retention_days`: ten years of daily rows.
pub const MAX_RETENTION_DAYS: i64 = 3650;
/// Upper bound for `max_retries`.
pub const MAX_RETRIES: u32 = 10;
/// Upper bound for `retry_base_delay_ms`.
pub const MAX_RETRY_BASE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Read and deserialize a TOML file.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml(&content)
}

pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// What to sync and where to keep it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// SQLite database holding one table per base currency.
    pub database: PathBuf,

    /// How far back an empty table starts (the source's history floor).
    pub retention_days: i64,

    /// What a failing base currency does to the rest of the run.
    pub on_failure: FailurePolicy,

    /// Base currency code -> table prefix (`usd = "dollar"` syncs
    /// `dollar_based_currency`).
    pub bases: BTreeMap<String, String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let bases = [("usd", "dollar"), ("eur", "euro")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            database: PathBuf::from("data/currency_exchange.db"),
            retention_days: 365,
            on_failure: FailurePolicy::Continue,
            bases,
        }
    }
}

impl SyncConfig {
    /// Resolve the base mapping into validated sync targets.
    pub fn targets(&self) -> Result<Vec<SyncTarget>, ConfigError> {
        self.bases
            .iter()
            .map(|(base, prefix)| {
                let base = CurrencyCode::new(base)
                    .map_err(|e| ConfigError::Invalid(format!("[sync.bases]: {e}")))?;
                let table = TableId::for_prefix(prefix)
                    .map_err(|e| ConfigError::Invalid(format!("[sync.bases] {base}: {e}")))?;
                Ok(SyncTarget::new(base, table))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bases.is_empty() {
            return Err(ConfigError::Invalid("[sync.bases] must name at least one base currency".into()));
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            return Err(ConfigError::Invalid(format!(
                "retention_days must be between 1 and {MAX_RETENTION_DAYS}, got {}",
                self.retention_days
            )));
        }
        self.targets().map(|_| ())
    }
}

/// Where rates come from and how hard to try.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// CDN package root; `@<version>/<api_version>/...` is appended.
    pub base_url: String,
    pub api_version: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Retries for connection failures and HTTP 429.
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub breaker_cooldown_secs: u64,
    pub breaker_failure_threshold: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api".into(),
            api_version: "v1".into(),
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
            breaker_cooldown_secs: 30 * 60,
            breaker_failure_threshold: 3,
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "source base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("source timeout_secs must be positive".into()));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "source max_retries must be at most {MAX_RETRIES}, got {}",
                self.max_retries
            )));
        }
        if self.retry_base_delay_ms > MAX_RETRY_BASE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "source retry_base_delay_ms must be at most {MAX_RETRY_BASE_DELAY_MS}, got {}",
                self.retry_base_delay_ms
            )));
        }
        Ok(())
    }
}
