//! Markdown report generator.

use chrono::NaiveDate;

use fxsync_core::domain::CurrencyCode;

use crate::chart::{render_trend_chart, DEFAULT_HEIGHT};
use crate::summary::{CurrencySummary, WINDOWS};
use crate::trend::MonthlyPoint;

/// Everything one report shows, already computed.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub report_date: NaiveDate,
    pub sections: Vec<CurrencySection>,
}

/// One currency: a summary column and a trend chart per base table.
#[derive(Debug, Clone)]
pub struct CurrencySection {
    pub code: CurrencyCode,
    pub name: String,
    pub summaries: Vec<CurrencySummary>,
    /// (base label, monthly trend), same order as `summaries`.
    pub trends: Vec<(String, Vec<MonthlyPoint>)>,
}

impl CurrencySection {
    /// `DKK (Danish Krone)`, or just `DKK` when the name is the code.
    pub fn title(&self) -> String {
        let upper = self.code.display_upper();
        if self.name.is_empty() || self.name.eq_ignore_ascii_case(&upper) {
            upper
        } else {
            format!("{upper} ({})", self.name)
        }
    }
}

pub struct MarkdownReportGenerator {
    pub chart_height: usize,
}

impl Default for MarkdownReportGenerator {
    fn default() -> Self {
        Self {
            chart_height: DEFAULT_HEIGHT,
        }
    }
}

impl MarkdownReportGenerator {
    pub fn generate(&self, data: &ReportData) -> String {
        let mut report = format!(
            "# Exchange Rate Report\n\n\
Report date: {}\n\n\
Currencies: {}\n",
            data.report_date,
            data.sections
                .iter()
                .map(|s| s.code.display_upper())
                .collect::<Vec<_>>()
                .join(", ")
        );

        for section in &data.sections {
            report.push_str(&format!("\n## {}\n\n", section.title()));
            report.push_str(&self.summary_table(&section.summaries));

            for (label, points) in &section.trends {
                let title = format!("{label} x {} Variation", section.code.display_upper());
                report.push_str(&format!("\n### {title}\n\n```text\n"));
                report.push_str(&render_trend_chart(&title, points, self.chart_height));
                report.push_str("```\n");
            }
        }

        report.push_str(
            "\n## Notes\n\n\
- Ranges cover the most recent stored rows (7, 30, 90, 180, 360), not calendar days.\n\
- Empty rate cells in the store are skipped.\n",
        );
        report
    }

    /// Rows are the current rate and each window; one column per base.
    fn summary_table(&self, summaries: &[CurrencySummary]) -> String {
        let as_of = summaries
            .iter()
            .filter_map(|s| s.as_of)
            .max()
            .map_or_else(|| "Info".to_string(), |d| d.to_string());

        let mut table = format!("| {as_of} |");
        for s in summaries {
            table.push_str(&format!(" {} Based Rate |", s.base_label));
        }
        table.push_str("\n|---|");
        table.push_str(&"---|".repeat(summaries.len()));
        table.push('\n');

        table.push_str("| Current Rate |");
        for s in summaries {
            table.push_str(&format!(" {} |", s.current_display()));
        }
        table.push('\n');

        for (i, (label, _)) in WINDOWS.iter().enumerate() {
            table.push_str(&format!("| {label} |"));
            for s in summaries {
                let cell = s.ranges.get(i).map_or_else(|| "n/a".into(), |r| r.display());
                table.push_str(&format!(" {cell} |"));
            }
            table.push('\n');
        }
        table
    }
}
