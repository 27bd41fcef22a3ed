//! HTTP rate source for the public, date-versioned currency API.
//!
//! Each calendar day is published as its own package version on the CDN, so a
//! historical request addresses `@YYYY.M.D` and the current one `@latest`.
//! A non-success status for a dated request means the day was never
//! published; callers decide whether to fall back to the previous day.

use chrono::Datelike;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DailyRates, RateDate, RateSource, SourceError};
use crate::config::SourceConfig;
use crate::domain::{CurrencyCatalog, CurrencyCode, DATE_FORMAT};

/// `currencies/{base}.json` payload: `{ "date": "...", "<base>": { code: rate } }`.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    date: Option<String>,
    #[serde(flatten)]
    bases: HashMap<String, serde_json::Value>,
}

pub struct HttpRateSource {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    api_version: String,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpRateSource {
    pub fn new(config: &SourceConfig, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("fxsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Build a source and its breaker straight from configuration.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        let breaker = CircuitBreaker::new(
            Duration::from_secs(config.breaker_cooldown_secs),
            config.breaker_failure_threshold,
        );
        Self::new(config, Arc::new(breaker))
    }

    fn catalog_url(&self) -> String {
        format!(
            "{}@latest/{}/currencies.json",
            self.base_url, self.api_version
        )
    }

    fn rates_url(&self, base: &CurrencyCode, date: RateDate) -> String {
        format!(
            "{}@{}/{}/currencies/{base}.json",
            self.base_url,
            version_tag(date),
            self.api_version
        )
    }

    /// GET + decode with retry and circuit breaker logic.
    ///
    /// `missing` builds the error returned for a plain non-success status.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        missing: impl Fn() -> SourceError,
    ) -> Result<T, SourceError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(SourceError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(backoff_delay(self.base_delay, attempt));
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(SourceError::CircuitBreakerTripped);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(SourceError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(SourceError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        return Err(missing());
                    }

                    let body: T = resp.json().map_err(|e| {
                        SourceError::ResponseFormatChanged(format!("failed to decode {url}: {e}"))
                    })?;
                    self.circuit_breaker.record_success();
                    return Ok(body);
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(SourceError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(SourceError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::NetworkUnreachable("max retries exceeded".into())))
    }
}

impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        "currency_api"
    }

    fn currencies(&self) -> Result<CurrencyCatalog, SourceError> {
        let url = self.catalog_url();
        let raw: BTreeMap<String, serde_json::Value> = self.get_json(&url, || {
            SourceError::ResponseFormatChanged(format!("currency catalog unavailable at {url}"))
        })?;
        Ok(parse_catalog(raw))
    }

    fn daily_rates(&self, base: &CurrencyCode, date: RateDate) -> Result<DailyRates, SourceError> {
        let url = self.rates_url(base, date);
        let resp: RatesResponse = self.get_json(&url, || SourceError::NoData {
            base: base.to_string(),
            date,
        })?;
        parse_rates(base, resp)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Longest sleep between two attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff before retry `attempt` (1-based), capped at `MAX_BACKOFF`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.checked_mul(factor).map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Package version addressing one day: `2024.3.2` (semver, no zero padding).
pub fn version_tag(date: RateDate) -> String {
    match date {
        RateDate::Latest => "latest".to_string(),
        RateDate::On(d) => format!("{}.{}.{}", d.year(), d.month(), d.day()),
    }
}

fn parse_catalog(raw: BTreeMap<String, serde_json::Value>) -> CurrencyCatalog {
    let entries = raw
        .into_iter()
        .map(|(code, name)| (code, name.as_str().unwrap_or_default().to_string()));
    // Codes that cannot be column names never make it into a table.
    let (catalog, _rejected) = CurrencyCatalog::from_entries(entries);
    catalog
}

fn parse_rates(base: &CurrencyCode, resp: RatesResponse) -> Result<DailyRates, SourceError> {
    let date = match resp.date {
        Some(text) => Some(
            chrono::NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| {
                SourceError::ResponseFormatChanged(format!("bad date '{text}': {e}"))
            })?,
        ),
        None => None,
    };

    let table = resp
        .bases
        .get(base.as_str())
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            SourceError::ResponseFormatChanged(format!("payload has no '{base}' rate table"))
        })?;

    // Non-numeric entries are ignored; the column ends up null for that day.
    let rates = table
        .iter()
        .filter_map(|(code, value)| value.as_f64().map(|rate| (code.clone(), rate)))
        .collect();

    Ok(DailyRates {
        base: base.clone(),
        date,
        rates,
    })
}
