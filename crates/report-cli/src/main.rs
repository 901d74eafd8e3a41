//! statreport: print the statistical report for one security as JSON.
//!
//! Provider tables are read from the snapshot named by `STATREPORT_SNAPSHOT`.
//!
//! Usage:
//!   statreport 000001
//!   statreport 600000.SH --compact

mod config;
mod snapshot;

use anyhow::{Context, Result};
use config::CliConfig;
use report_orchestrator::ReportOrchestrator;
use snapshot::SnapshotProvider;

const USAGE: &str = "usage: statreport <code> [--compact]";

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // stdout carries the report, logs go to stderr
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }
    let compact = args.iter().any(|a| a == "--compact");
    let code = args
        .iter()
        .find(|a| !a.starts_with('-'))
        .context(USAGE)?;

    let config = CliConfig::from_env()?;
    tracing::info!(
        "Lookback {} days, {} quarterly periods",
        config.report.lookback_days,
        config.report.quarterly_periods
    );

    let provider = SnapshotProvider::load(&config.snapshot_path)?;
    let mut orchestrator = ReportOrchestrator::with_config(provider, config.report);
    if let Some(date) = config.report_date {
        orchestrator = orchestrator.with_report_date(date);
    }

    let report = orchestrator
        .generate_report(code)
        .await
        .with_context(|| format!("failed to build report for {}", code))?;

    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);
    Ok(())
}
