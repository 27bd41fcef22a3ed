//! fxsync CLI: sync, report and inspection commands.
//!
//! Commands:
//! - `sync`: catch every configured base table up to today
//! - `report`: write the Markdown/CSV report from the stored tables
//! - `run`: the scheduled job, `sync` then `report`
//! - `check`: pre-flight checks against the rate source and the database
//! - `status`: per table row count and last synced date

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use fxsync_core::config::{load_toml, SourceConfig, SyncConfig};
use fxsync_core::domain::CurrencyCatalog;
use fxsync_core::source::{
    check_source, BreakerState, CheckStatus, CircuitBreaker, HttpRateSource, RateSource,
};
use fxsync_core::store::{RateStore, SqliteStore};
use fxsync_core::sync::{run_sync_job, SyncSummary};
use fxsync_core::{Clock, SystemClock, TracingLog};
use fxsync_report::{report_pipeline, ReportConfig};

const DEFAULT_CONFIG: &str = "fxsync.toml";

#[derive(Parser)]
#[command(
    name = "fxsync",
    version,
    about = "fxsync: incremental daily exchange-rate sync and reporting"
)]
struct Cli {
    /// TOML config file. Defaults to ./fxsync.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overriding `[sync] database`.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every missing day for each configured base currency.
    Sync,
    /// Build the exchange rate report from the stored tables.
    Report {
        /// Do not contact the rate source; currency names fall back to codes.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Output directory, overriding `[report] output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Sync, then report (the scheduled job).
    Run,
    /// Check the rate source and the database before a scheduled run.
    Check,
    /// Show each base table's row count and last synced date.
    Status,
}

/// Whole config file: one section per concern.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppConfig {
    sync: SyncConfig,
    source: SourceConfig,
    report: ReportConfig,
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.database)?;

    match cli.command {
        Commands::Sync => run_sync_cmd(&config).map(|_| ()),
        Commands::Report {
            offline,
            output_dir,
        } => run_report_cmd(&config, offline, output_dir),
        Commands::Run => run_job_cmd(&config),
        Commands::Check => run_check_cmd(&config),
        Commands::Status => run_status_cmd(&config),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("fxsync=info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>, database: Option<PathBuf>) -> Result<AppConfig> {
    let mut config: AppConfig = match path {
        Some(path) => load_toml(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => load_toml(Path::new(DEFAULT_CONFIG))?,
        None => AppConfig::default(),
    };
    if let Some(database) = database {
        config.sync.database = database;
    }
    config.sync.validate()?;
    config.source.validate()?;
    config.report.validate()?;
    Ok(config)
}

fn http_source(config: &AppConfig) -> Result<HttpRateSource> {
    HttpRateSource::from_config(&config.source).context("failed to set up the rate source client")
}

fn run_sync_cmd(config: &AppConfig) -> Result<SyncSummary> {
    let source = http_source(config)?;
    let summary = run_sync_job(&config.sync, &source, &TracingLog)?;

    for outcome in &summary.outcomes {
        println!(
            "{:<6} {:<24} +{} row(s) after {}{}",
            outcome.base.display_upper(),
            outcome.table,
            outcome.rows_written,
            outcome.since,
            if outcome.bootstrapped { " (table created)" } else { "" }
        );
    }
    for failure in &summary.failures {
        eprintln!(
            "{:<6} {:<24} FAILED: {}",
            failure.base.display_upper(),
            failure.table,
            failure.error
        );
    }

    if !summary.all_succeeded() {
        bail!(
            "{} of {} base currencies failed to sync",
            summary.failures.len(),
            summary.failures.len() + summary.outcomes.len()
        );
    }
    Ok(summary)
}

fn run_report_cmd(config: &AppConfig, offline: bool, output_dir: Option<PathBuf>) -> Result<()> {
    let mut report_config = config.report.clone();
    if let Some(dir) = output_dir {
        report_config.output_dir = dir;
    }

    let store = open_existing_store(&config.sync.database)?;
    let targets = config.sync.targets()?;
    let catalog = if offline { None } else { fetch_catalog(config) };

    let paths = report_pipeline(
        &store,
        &targets,
        &report_config,
        catalog.as_ref(),
        SystemClock.today(),
    )?;

    println!("Report written to: {}", paths.report_markdown.display());
    println!("Trend CSVs: {}", paths.trend_csvs.len());
    println!("Manifest: {}", paths.manifest.display());
    Ok(())
}

/// Catalog for display names; a failure only costs the names.
fn fetch_catalog(config: &AppConfig) -> Option<CurrencyCatalog> {
    let source = http_source(config).ok()?;
    match source.currencies() {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            tracing::warn!("currency names unavailable, using codes: {e}");
            None
        }
    }
}

fn run_job_cmd(config: &AppConfig) -> Result<()> {
    run_sync_cmd(config).context("sync step failed; report skipped")?;
    run_report_cmd(config, false, None)
}

fn run_check_cmd(config: &AppConfig) -> Result<()> {
    let breaker = Arc::new(CircuitBreaker::new(
        Duration::from_secs(config.source.breaker_cooldown_secs),
        config.source.breaker_failure_threshold,
    ));
    let source = HttpRateSource::new(&config.source, breaker.clone())
        .context("failed to set up the rate source client")?;
    let required = config.report.currency_codes()?;
    let today = SystemClock.today();
    let mut failed = 0usize;

    for target in config.sync.targets()? {
        let report = check_source(&source, &target.base, &required, today);
        for check in &report.checks {
            match &check.status {
                CheckStatus::Pass => println!("[PASS] {} {}", target.base.display_upper(), check.name),
                CheckStatus::Fail(reason) => {
                    failed += 1;
                    println!("[FAIL] {} {}: {reason}", target.base.display_upper(), check.name);
                }
            }
        }
    }

    if let Some(line) = breaker_line(&source, &breaker) {
        failed += 1;
        println!("{line}");
    }

    let database = &config.sync.database;
    if database.exists() {
        println!("[PASS] database {}", database.display());
    } else {
        // A fresh install bootstraps on first sync.
        println!("[WARN] database {} not created yet", database.display());
    }

    if failed > 0 {
        bail!("{failed} check(s) failed");
    }
    Ok(())
}

/// Failure line when the source stopped accepting requests during the checks.
fn breaker_line(source: &dyn RateSource, breaker: &CircuitBreaker) -> Option<String> {
    if source.is_available() {
        return None;
    }
    match breaker.state() {
        BreakerState::Open { .. } => Some(format!(
            "[FAIL] source circuit breaker open; requests refused for another {}s",
            breaker.remaining_cooldown().as_secs()
        )),
        BreakerState::Closed => None,
    }
}

fn run_status_cmd(config: &AppConfig) -> Result<()> {
    let database = &config.sync.database;
    if !database.exists() {
        println!("Database does not exist: {}", database.display());
        return Ok(());
    }

    let store = SqliteStore::open(database)?;
    println!("Database: {}", database.display());
    println!("{:<6} {:<24} {:>8}  last synced", "base", "table", "rows");
    for target in config.sync.targets()? {
        if !store.table_exists(&target.table)? {
            println!("{:<6} {:<24} {:>8}  (not created)", target.base.display_upper(), target.table, "-");
            continue;
        }
        let rows = store.row_count(&target.table)?;
        let last = store
            .max_exchange_date(&target.table)?
            .map_or_else(|| "never".to_string(), |d| d.to_string());
        println!("{:<6} {:<24} {:>8}  {last}", target.base.display_upper(), target.table, rows);
    }
    Ok(())
}

fn open_existing_store(database: &Path) -> Result<SqliteStore> {
    if !database.exists() {
        bail!("database {} does not exist; run `fxsync sync` first", database.display());
    }
    Ok(SqliteStore::open(database)?)
}
