//! CSV export of monthly trend series.

use std::path::Path;

use crate::trend::MonthlyPoint;
use crate::ReportError;

/// Columns: month, label, mean, min, max, observations
pub fn export_trend_csv(points: &[MonthlyPoint]) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["month", "label", "mean", "min", "max", "observations"])?;

    for p in points {
        wtr.write_record([
            p.key(),
            p.label(),
            format!("{:.6}", p.mean),
            format!("{:.6}", p.min),
            format!("{:.6}", p.max),
            p.observations.to_string(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ReportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_trend_csv(path: &Path, points: &[MonthlyPoint]) -> Result<(), ReportError> {
    let csv = export_trend_csv(points)?;
    std::fs::write(path, csv).map_err(|e| ReportError::io(path, e))
}
