use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrapi_probe::client::ApiClient;
use scrapi_probe::config::Config;
use scrapi_probe::report::write_json;
use scrapi_probe::suites::{
    BackendStep, BackendSuite, MapsSuite, RunOutputCheck, Suite, SuiteContext, SuiteReport,
};

#[derive(Parser)]
#[command(
    name = "scrapi-probe",
    version,
    about = "Integration probes for the Scrapi scraping backend",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. https://host/api
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Write every recorded check to this JSON file
    #[arg(long, global = true)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Backend architecture checks and the enhanced Google Maps scraper
    Backend {
        /// Comma-separated step numbers (1-8)
        #[arg(long, conflicts_with = "all")]
        steps: Option<String>,

        /// Run all eight steps
        #[arg(long, default_value = "false")]
        all: bool,
    },

    /// Google Maps scraper end-to-end test
    Maps,

    /// Create one run and dump the fields of its first place
    CheckRun,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    }
    .with_overrides(cli.base_url.clone(), cli.timeout);
    config.validate()?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(base_url = %config.base_url(), "scrapi-probe starting");

    let client = ApiClient::new(&config).context("Failed to create HTTP client")?;
    let ctx = SuiteContext::new(config, client);

    let mut suite: Box<dyn Suite> = match cli.command {
        Commands::Backend { steps, all } => {
            let steps = if all {
                BackendStep::ALL.to_vec()
            } else {
                match steps {
                    Some(list) => BackendStep::parse_list(&list)?,
                    None => BackendStep::DEFAULT.to_vec(),
                }
            };
            tracing::info!(steps = ?steps, "Starting backend suite");
            Box::new(BackendSuite::new(ctx, steps))
        }
        Commands::Maps => {
            tracing::info!("Starting maps suite");
            Box::new(MapsSuite::new(ctx))
        }
        Commands::CheckRun => {
            tracing::info!("Starting run output check");
            Box::new(RunOutputCheck::new(ctx))
        }
    };

    let report = suite.run().await;
    finish(&report, cli.report.as_deref())
}

fn finish(report: &SuiteReport, report_path: Option<&std::path::Path>) -> Result<bool> {
    if let Some(path) = report_path {
        write_json(&report.records, path)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        tracing::info!(path = %path.display(), records = report.records.len(), "Report written");
    }

    println!("\n{}", report.closing_line());

    tracing::info!(
        suite = report.name,
        passed = report.passed,
        total = report.total,
        success_rate = report.success_rate(),
        "scrapi-probe finished"
    );
    Ok(report.is_success())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("scrapi_probe=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("scrapi_probe={level},warn"))
            .with_context(|| format!("Invalid log level: {level}"))?
    };

    // stdout carries the test report
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
