//! Rate source trait and structured error types.
//!
//! The RateSource trait abstracts over where daily rates come from (the public
//! currency API, in-memory fixtures) so the sync components can be exercised
//! without the network.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::domain::{CurrencyCatalog, CurrencyCode};

/// Which snapshot of the rates to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateDate {
    Latest,
    On(NaiveDate),
}

impl fmt::Display for RateDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateDate::Latest => f.write_str("latest"),
            RateDate::On(date) => write!(f, "{date}"),
        }
    }
}

/// Structured error types for rate source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has nothing for this date (any non-success status other
    /// than rate limiting or a ban). Expected for the odd missing day.
    #[error("no data for {base} on {date}")]
    NoData { base: String, date: RateDate },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by source (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("hard stop: rate source has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("http client setup failed: {0}")]
    Client(String),
}

impl SourceError {
    /// True for the "this day is missing" signal that triggers the
    /// previous-day fallback.
    pub fn is_no_data(&self) -> bool {
        matches!(self, SourceError::NoData { .. })
    }
}

/// Rates for one base currency on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRates {
    pub base: CurrencyCode,
    /// Date reported by the source, when present in the payload.
    pub date: Option<NaiveDate>,
    pub rates: HashMap<String, f64>,
}

impl DailyRates {
    pub fn rate(&self, target: &CurrencyCode) -> Option<f64> {
        self.rates.get(target.as_str()).copied()
    }
}

/// Trait for rate sources (the public currency API, fixtures).
pub trait RateSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Full currency catalog (`code -> display name`).
    fn currencies(&self) -> Result<CurrencyCatalog, SourceError>;

    /// Rates of every known currency against `base` for one day.
    fn daily_rates(&self, base: &CurrencyCode, date: RateDate) -> Result<DailyRates, SourceError>;

    /// Check if the source is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
