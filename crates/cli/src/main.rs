//! BNSS pipeline entry point.
//!
//! Subcommands mirror the pipeline stages: fetch the two source pages,
//! run ETL over the cached HTML, validate the output datasets. Logs go to
//! stderr; JSON summaries go to stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bnss_client::FetchClient;
use bnss_core::{AppConfig, validate};

mod etl;

#[derive(Parser)]
#[command(name = "bnss-pipeline", about = "ETL pipeline for BNSS legal data", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Step 1: fetch BNSS source pages
    Fetch {
        /// Dataset version date (YYYY-MM-DD), defaults to today (UTC)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Step 2: parse cached HTML into datasets
    Etl {
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Step 3: check dataset integrity
    Validate {
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Fetch, run ETL, then validate
    All {
        #[arg(long)]
        as_of: Option<String>,
    },
}

fn today_utc() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn resolve_as_of(value: Option<String>) -> String {
    value.unwrap_or_else(today_utc)
}

fn setup_logging(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .with_writer(std::io::stderr)
        .init();
}

fn run_fetch(config: &AppConfig, as_of: &str) -> Result<()> {
    let client = FetchClient::new(config)?;
    let results = client.fetch_many(&config.seed_urls(), Some(as_of))?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn run_etl(config: &AppConfig, as_of: &str) -> Result<()> {
    let (sections_path, crosswalk_path) = etl::run_etl(config, as_of)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "sections": sections_path,
            "crosswalk": crosswalk_path,
        }))?
    );
    Ok(())
}

fn run_validate(config: &AppConfig, as_of: &str) -> Result<()> {
    let report = validate::run_validation(config, as_of)?;
    println!("{}", report.summary());
    if !report.passed() {
        anyhow::bail!("{} validation check(s) failed", report.failed_count());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = AppConfig::load()?;

    match cli.command {
        Command::Fetch { as_of } => run_fetch(&config, &resolve_as_of(as_of)),
        Command::Etl { as_of } => run_etl(&config, &resolve_as_of(as_of)),
        Command::Validate { as_of } => run_validate(&config, &resolve_as_of(as_of)),
        Command::All { as_of } => {
            let as_of = resolve_as_of(as_of);
            run_fetch(&config, &as_of)?;
            run_etl(&config, &as_of)?;
            run_validate(&config, &as_of)
        }
    }
}
