//! Report manifest (JSON): what each report was built from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use fxsync_core::domain::RowBatch;

use crate::loader::BaseTable;
use crate::ReportError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub table: String,
    pub label: String,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// BLAKE3 over the table's rows; equal fingerprints mean the report
    /// saw identical data.
    pub fingerprint: String,
}

impl TableSnapshot {
    pub fn of(table: &BaseTable) -> Self {
        Self {
            table: table.table.to_string(),
            label: table.label.clone(),
            rows: table.rows.len(),
            first_date: table.rows.first_date(),
            last_date: table.rows.last_date(),
            fingerprint: fingerprint(&table.rows),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportManifest {
    pub report_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub currencies: Vec<String>,
    pub tables: Vec<TableSnapshot>,
    /// Artifact file names, relative to the output directory.
    pub files: Vec<String>,
}

/// Content hash of a row batch: column names, then each row's date and
/// values in a canonical text form.
pub fn fingerprint(rows: &RowBatch) -> String {
    let mut hasher = blake3::Hasher::new();
    for code in rows.columns().currencies() {
        hasher.update(code.as_str().as_bytes());
        hasher.update(b",");
    }
    hasher.update(b"\n");
    for row in rows.rows() {
        hasher.update(row.date_text().as_bytes());
        for value in &row.values {
            match value {
                Some(v) => hasher.update(format!(",{v:?}").as_bytes()),
                None => hasher.update(b",null"),
            };
        }
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

pub fn write_manifest(path: &Path, manifest: &ReportManifest) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json).map_err(|e| ReportError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxsync_core::domain::{ColumnSet, CurrencyCode, RateRow};

    fn batch(values: &[Option<f64>]) -> RowBatch {
        let mut rows = RowBatch::new(ColumnSet::new(vec![CurrencyCode::new("jpy").unwrap()]));
        for (i, v) in values.iter().enumerate() {
            rows.push(RateRow {
                date: NaiveDate::from_ymd_opt(2024, 7, i as u32 + 1).unwrap(),
                values: vec![*v],
            })
            .unwrap();
        }
        rows
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = fingerprint(&batch(&[Some(150.0), None]));
        assert_eq!(a, fingerprint(&batch(&[Some(150.0), None])));
        assert_ne!(a, fingerprint(&batch(&[Some(150.0), Some(151.0)])));
        assert_ne!(a, fingerprint(&batch(&[Some(150.0)])));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let manifest = ReportManifest {
            report_date: NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
            generated_at: Utc::now(),
            currencies: vec!["jpy".into()],
            tables: vec![],
            files: vec!["manifest.json".into()],
        };
        write_manifest(&path, &manifest).unwrap();

        let loaded: ReportManifest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.report_date, manifest.report_date);
        assert_eq!(loaded.files, manifest.files);
    }
}
