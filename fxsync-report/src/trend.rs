//! Monthly aggregation behind the trend charts.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::summary::min_max;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub observations: usize,
}

impl MonthlyPoint {
    /// `Mar, 2024`
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b, %Y").to_string())
            .unwrap_or_else(|| format!("{:02}, {}", self.month, self.year))
    }

    /// `2024-03`
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Mean, min and max per calendar month over the last `months` months that
/// have data, ascending. Null values are ignored; a month with none is
/// skipped.
pub fn monthly_trend(series: &[(NaiveDate, Option<f64>)], months: usize) -> Vec<MonthlyPoint> {
    let mut by_month: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for (date, value) in series {
        if let Some(v) = value {
            by_month.entry((date.year(), date.month())).or_default().push(*v);
        }
    }

    let skip = by_month.len().saturating_sub(months);
    by_month
        .into_iter()
        .skip(skip)
        .filter_map(|((year, month), values)| {
            let (min, max) = min_max(values.iter().copied());
            let observations = values.len();
            let mean = values.iter().sum::<f64>() / observations as f64;
            Some(MonthlyPoint {
                year,
                month,
                mean,
                min: min?,
                max: max?,
                observations,
            })
        })
        .collect()
}
