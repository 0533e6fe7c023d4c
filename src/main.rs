//! TOTE: exotic-wager structure optimizer.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! reads a scored-entrant request, and prints the bet-family comparison
//! with payout outlooks as JSON on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use tote::config::AppConfig;
use tote::report::{build_report, RaceRequest};

#[derive(Parser, Debug)]
#[command(author, version, about = "Exotic-wager structure optimizer")]
struct Cli {
    /// Path to config file (missing file falls back to built-in tables)
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// JSON request file with scored entrants; "-" reads stdin
    #[arg(long, default_value = "-")]
    request: String,

    /// Override the request budget
    #[arg(long)]
    budget: Option<f64>,

    /// Override the request field size
    #[arg(long)]
    field_size: Option<u32>,

    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let cfg = if Path::new(&cli.config).exists() {
        AppConfig::load(&cli.config)?
    } else {
        warn!(path = %cli.config, "Config file not found, using built-in tables");
        AppConfig::default()
    };

    let mut request = read_request(&cli.request)?;
    if cli.budget.is_some() {
        request.budget = cli.budget;
    }
    if cli.field_size.is_some() {
        request.field_size = cli.field_size;
    }

    info!(
        entrants = request.entrants.len(),
        budget = ?request.budget,
        field_size = ?request.field_size,
        "Building recommendation"
    );

    let report = build_report(&request, &cfg)?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("Failed to serialise report")?;
    println!("{json}");

    info!(
        valid = report.comparison.valid,
        recommended = ?report.comparison.recommended,
        summary = %report.comparison.summary,
        "Done"
    );
    Ok(())
}

fn read_request(source: &str) -> Result<RaceRequest> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read request file: {source}"))?
    };
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse request: {source}"))
}

/// Initialise the `tracing` subscriber. Logs go to stderr so stdout
/// carries only the report.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tote=info"));

    if std::env::var("TOTE_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
