use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use fund_metadata_etl::config::DEFAULT_CONFIG_PATH;
use fund_metadata_etl::pipeline::{self, LoadSummary};
use fund_metadata_etl::{logging, Config, VERSION};

#[derive(Parser)]
#[command(name = "fund-etl", version, about = "Mutual fund metadata ETL: reconcile scheme codes and load")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, transform and load in one go
    Run,
    /// Load CSV, fetch scheme list, reconcile, save raw file
    Extract,
    /// Split the raw file into verified/unverified partition files
    Transform,
    /// Load partition files into their tables
    Load,
    /// Test the database connection
    CheckDb,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    info!(version = VERSION, config = %cli.config.display(), "fund-etl starting");

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    match cli.command {
        Command::Run => {
            let report = pipeline::run(&config).context("Pipeline run failed")?;
            finish_load(&report.load)?;
        }
        Command::Extract => {
            let out = pipeline::extract(&config).context("Extraction failed")?;
            info!(
                records = out.raw_file.records,
                path = %out.raw_file.path.display(),
                "extraction complete"
            );
        }
        Command::Transform => {
            let out = pipeline::transform_from_raw(&config).context("Transform failed")?;
            info!(
                verified = out.verified_file.records,
                unverified = out.unverified_file.records,
                "transform complete"
            );
        }
        Command::Load => {
            let summary = pipeline::load_from_processed(&config).context("Load failed")?;
            finish_load(&summary)?;
        }
        Command::CheckDb => {
            pipeline::check_db(&config).context("Database connection failed")?;
        }
    }

    Ok(())
}

/// Report table outcomes; non-zero exit if any table failed
fn finish_load(summary: &LoadSummary) -> Result<()> {
    for outcome in [&summary.verified, &summary.unverified] {
        if outcome.succeeded() {
            info!(table = %outcome.table, records = outcome.records, "table loaded");
        } else {
            error!(table = %outcome.table, records = outcome.records, "table not loaded");
        }
    }

    if !summary.all_succeeded() {
        bail!("{} of 2 table loads failed", summary.failures());
    }
    Ok(())
}
