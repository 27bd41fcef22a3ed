//! Report generators.

mod markdown;

pub use markdown::{CurrencySection, MarkdownReportGenerator, ReportData};
