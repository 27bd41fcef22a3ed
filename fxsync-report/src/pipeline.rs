//! Report pipeline: load tables, compute summaries and trends, write artifacts.

use chrono::{NaiveDate, Utc};
use std::path::PathBuf;

use fxsync_core::domain::CurrencyCatalog;
use fxsync_core::store::RateStore;
use fxsync_core::sync::SyncTarget;

use crate::config::ReportConfig;
use crate::export::write_trend_csv;
use crate::loader::load_tables;
use crate::manifest::{write_manifest, ReportManifest, TableSnapshot};
use crate::reports::{CurrencySection, MarkdownReportGenerator, ReportData};
use crate::summary::summarize;
use crate::trend::monthly_trend;
use crate::ReportError;

/// Artifact paths returned after a report run.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub report_markdown: PathBuf,
    pub trend_csvs: Vec<PathBuf>,
    pub manifest: PathBuf,
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("Exchange Rate Report {}.md", date.format("%Y-%m-%d"))
}

/// Build the report for `targets` into `config.output_dir`.
///
/// `catalog` supplies display names; without it the upper-case code is used.
pub fn report_pipeline(
    store: &dyn RateStore,
    targets: &[SyncTarget],
    config: &ReportConfig,
    catalog: Option<&CurrencyCatalog>,
    report_date: NaiveDate,
) -> Result<ReportPaths, ReportError> {
    config.validate()?;
    let codes = config.currency_codes()?;
    let tables = load_tables(store, targets)?;

    let out_dir = &config.output_dir;
    std::fs::create_dir_all(out_dir).map_err(|e| ReportError::io(out_dir, e))?;

    let mut sections = Vec::with_capacity(codes.len());
    let mut trend_csvs = Vec::new();
    for code in &codes {
        let name = catalog
            .and_then(|c| c.name(code))
            .map(str::to_string)
            .unwrap_or_else(|| code.display_upper());

        let mut summaries = Vec::with_capacity(tables.len());
        let mut trends = Vec::with_capacity(tables.len());
        for table in &tables {
            summaries.push(summarize(table, code)?);

            let points = monthly_trend(&table.series(code)?, config.history_months);
            let csv_path = out_dir.join(format!("trend_{}_{}.csv", code, table.base));
            write_trend_csv(&csv_path, &points)?;
            trend_csvs.push(csv_path);
            trends.push((table.label.clone(), points));
        }

        sections.push(CurrencySection {
            code: code.clone(),
            name,
            summaries,
            trends,
        });
    }

    let data = ReportData {
        report_date,
        sections,
    };
    let report_markdown = out_dir.join(report_file_name(report_date));
    let markdown = MarkdownReportGenerator::default().generate(&data);
    std::fs::write(&report_markdown, markdown).map_err(|e| ReportError::io(&report_markdown, e))?;

    let manifest_path = out_dir.join("manifest.json");
    let mut files: Vec<String> = std::iter::once(&report_markdown)
        .chain(trend_csvs.iter())
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    files.push("manifest.json".into());
    let manifest = ReportManifest {
        report_date,
        generated_at: Utc::now(),
        currencies: codes.iter().map(|c| c.to_string()).collect(),
        tables: tables.iter().map(TableSnapshot::of).collect(),
        files,
    };
    write_manifest(&manifest_path, &manifest)?;

    tracing::info!(
        report = %report_markdown.display(),
        currencies = codes.len(),
        tables = tables.len(),
        "report written"
    );

    Ok(ReportPaths {
        report_markdown,
        trend_csvs,
        manifest: manifest_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(report_file_name(date), "Exchange Rate Report 2024-03-09.md");
    }
}
