//! Current rate and recent min/max ranges for one currency in one base table.

use chrono::NaiveDate;

use fxsync_core::domain::CurrencyCode;

use crate::loader::BaseTable;
use crate::ReportError;

/// Row-count windows, most recent rows first. Stored rows, not calendar
/// days, so a table with gaps reaches further back.
pub const WINDOWS: [(&str, usize); 5] = [
    ("Last Week Range", 7),
    ("Last Month Range", 30),
    ("Last 3 Months Range", 90),
    ("Last 6 Months Range", 180),
    ("Last Year Range", 360),
];

#[derive(Debug, Clone, PartialEq)]
pub struct WindowRange {
    pub label: &'static str,
    pub rows: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl WindowRange {
    pub fn display(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("{min:.2} - {max:.2}"),
            _ => "n/a".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySummary {
    pub code: CurrencyCode,
    /// Label of the base table the values come from.
    pub base_label: String,
    /// Date of the most recent non-null value.
    pub as_of: Option<NaiveDate>,
    pub current: Option<f64>,
    pub ranges: Vec<WindowRange>,
}

impl CurrencySummary {
    pub fn current_display(&self) -> String {
        self.current.map_or_else(|| "n/a".into(), |v| format!("{v:.2}"))
    }
}

pub fn summarize(table: &BaseTable, code: &CurrencyCode) -> Result<CurrencySummary, ReportError> {
    let series = table.series(code)?;

    let latest = series.iter().rev().find_map(|(date, v)| v.map(|v| (*date, v)));

    let ranges = WINDOWS
        .iter()
        .map(|&(label, rows)| {
            let (min, max) = min_max(series.iter().rev().take(rows).filter_map(|(_, v)| *v));
            WindowRange {
                label,
                rows,
                min,
                max,
            }
        })
        .collect();

    Ok(CurrencySummary {
        code: code.clone(),
        base_label: table.label.clone(),
        as_of: latest.map(|(d, _)| d),
        current: latest.map(|(_, v)| v),
        ranges,
    })
}

pub(crate) fn min_max(values: impl Iterator<Item = f64>) -> (Option<f64>, Option<f64>) {
    values.fold((None, None), |(lo, hi), v| {
        (
            Some(lo.map_or(v, |lo: f64| lo.min(v))),
            Some(hi.map_or(v, |hi: f64| hi.max(v))),
        )
    })
}
