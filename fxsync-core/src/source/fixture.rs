//! In-memory rate source.
//!
//! Serves a fixed catalog and per-day rate tables, and records every request
//! so tests can assert on the exact call sequence.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::provider::{DailyRates, RateDate, RateSource, SourceError};
use crate::domain::{CurrencyCatalog, CurrencyCode};

#[derive(Debug, Default)]
pub struct FixtureSource {
    catalog: CurrencyCatalog,
    days: HashMap<(CurrencyCode, NaiveDate), HashMap<String, f64>>,
    /// Days answered with a network error instead of "no data".
    unreachable: HashSet<NaiveDate>,
    latest: Option<NaiveDate>,
    requests: Mutex<Vec<(CurrencyCode, RateDate)>>,
}

impl FixtureSource {
    pub fn new(catalog: CurrencyCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Register the rates of `base` on `date`. The most recent registered day
    /// becomes the `latest` snapshot.
    pub fn with_day<I, K>(mut self, base: &CurrencyCode, date: NaiveDate, rates: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.insert_day(base, date, rates);
        self
    }

    pub fn insert_day<I, K>(&mut self, base: &CurrencyCode, date: NaiveDate, rates: I)
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let rates = rates.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.days.insert((base.clone(), date), rates);
        if self.latest.map_or(true, |latest| date > latest) {
            self.latest = Some(date);
        }
    }

    pub fn remove_day(&mut self, base: &CurrencyCode, date: NaiveDate) {
        self.days.remove(&(base.clone(), date));
    }

    /// Make requests for `date` fail like a dropped connection.
    pub fn with_unreachable_day(mut self, date: NaiveDate) -> Self {
        self.unreachable.insert(date);
        self
    }

    pub fn requests(&self) -> Vec<(CurrencyCode, RateDate)> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl RateSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn currencies(&self) -> Result<CurrencyCatalog, SourceError> {
        Ok(self.catalog.clone())
    }

    fn daily_rates(&self, base: &CurrencyCode, date: RateDate) -> Result<DailyRates, SourceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((base.clone(), date));
        }

        let day = match date {
            RateDate::On(d) => Some(d),
            RateDate::Latest => self.latest,
        };
        let no_data = || SourceError::NoData {
            base: base.to_string(),
            date,
        };
        let day = day.ok_or_else(no_data)?;

        if self.unreachable.contains(&day) {
            return Err(SourceError::NetworkUnreachable(format!(
                "connection reset while fetching {day}"
            )));
        }

        let rates = self.days.get(&(base.clone(), day)).ok_or_else(no_data)?;
        Ok(DailyRates {
            base: base.clone(),
            date: Some(day),
            rates: rates.clone(),
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
