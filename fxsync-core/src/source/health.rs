//! Pre-flight checks against the rate source.
//!
//! Run before a scheduled sync: the latest snapshot must answer, must be
//! fresh (today or yesterday, since publication lags by up to a day), and
//! must still carry every currency the report depends on.

use chrono::{Duration, NaiveDate};

use super::provider::{RateDate, RateSource};
use crate::domain::CurrencyCode;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckStatus {
    Pass,
    Fail(String),
}

impl CheckStatus {
    pub fn passed(&self) -> bool {
        matches!(self, CheckStatus::Pass)
    }
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    pub checks: Vec<CheckResult>,
}

impl HealthReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.status.passed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.status.passed())
    }

    fn push(&mut self, name: &'static str, status: CheckStatus) {
        self.checks.push(CheckResult { name, status });
    }
}

pub fn check_source(
    source: &dyn RateSource,
    base: &CurrencyCode,
    required: &[CurrencyCode],
    today: NaiveDate,
) -> HealthReport {
    let mut report = HealthReport::default();

    let latest = match source.daily_rates(base, RateDate::Latest) {
        Ok(rates) => {
            report.push("source_connection", CheckStatus::Pass);
            rates
        }
        Err(e) => {
            report.push("source_connection", CheckStatus::Fail(e.to_string()));
            return report;
        }
    };

    let freshness = match latest.date {
        Some(date) if date == today || date == today - Duration::days(1) => CheckStatus::Pass,
        Some(date) => CheckStatus::Fail(format!(
            "latest snapshot is dated {date}, expected {today} or the day before"
        )),
        None => CheckStatus::Fail("latest snapshot carries no date".into()),
    };
    report.push("latest_date", freshness);

    let missing: Vec<String> = required
        .iter()
        .filter(|code| code != &base && latest.rate(code).is_none())
        .map(|code| code.to_string())
        .collect();
    let coverage = if missing.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail(format!("missing currencies: {}", missing.join(", ")))
    };
    report.push("required_currencies", coverage);

    report
}
