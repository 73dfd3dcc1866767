// 🚀 Pipeline - extract → transform → load
//
// extract:   metadata CSV + scheme catalog → reconciled records → raw file
// transform: reconciled records → verified/unverified partition files
// load:      partitions → their destination tables (independently)
//
// Each stage can run on its own, reading what the previous stage wrote.

use crate::catalog::fetch_catalog;
use crate::config::{Config, DatabaseConfig, IntermediateFormat};
use crate::db::Store;
use crate::error::{EtlError, Result};
use crate::metadata::load_metadata_csv;
use crate::partition::{persist_intermediate, read_intermediate, split, PersistedFile};
use crate::record::FundMetadataRecord;
use crate::reconciliation::Reconciler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// STAGE OUTPUTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOutput {
    #[serde(skip)]
    pub records: Vec<FundMetadataRecord>,
    pub catalog_entries: usize,
    pub exact_matches: usize,
    pub approximate_matches: usize,
    pub unmatched: usize,
    pub raw_file: PersistedFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOutput {
    #[serde(skip)]
    pub verified: Vec<FundMetadataRecord>,
    #[serde(skip)]
    pub unverified: Vec<FundMetadataRecord>,
    pub verified_file: PersistedFile,
    pub unverified_file: PersistedFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded { rows: usize },
    Failed { kind: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: String,
    pub records: usize,
    #[serde(flatten)]
    pub status: LoadStatus,
}

impl TableOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    pub verified: TableOutcome,
    pub unverified: TableOutcome,
}

impl LoadSummary {
    pub fn failures(&self) -> usize {
        [&self.verified, &self.unverified]
            .iter()
            .filter(|o| !o.succeeded())
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub extract: ExtractOutput,
    pub transform: TransformOutput,
    pub load: LoadSummary,
}

// ============================================================================
// STAGES
// ============================================================================

/// Load metadata, fetch the catalog, reconcile, save the raw file.
///
/// Any error here aborts the run.
pub fn extract(config: &Config) -> Result<ExtractOutput> {
    info!("starting extraction phase");

    let metadata = load_metadata_csv(&config.source.csv_path)?;
    let catalog = fetch_catalog(&config.source.mf_list_url)?;

    let report = Reconciler::with_cutoff(config.reconcile.cutoff).reconcile(metadata, &catalog);
    info!("{}", report.summary());

    let exact_matches = report.exact_matches;
    let approximate_matches = report.approximate_matches;
    let unmatched = report.unmatched;
    let records = report.into_records();

    let raw_file = persist_intermediate(
        &records,
        &config.paths.raw_file(),
        IntermediateFormat::Json,
    )?;
    info!(path = %raw_file.path.display(), "saved raw metadata");

    Ok(ExtractOutput {
        records,
        catalog_entries: catalog.len(),
        exact_matches,
        approximate_matches,
        unmatched,
        raw_file,
    })
}

/// Split reconciled records and write both partition files
pub fn transform(config: &Config, records: Vec<FundMetadataRecord>) -> Result<TransformOutput> {
    info!("starting transform phase");

    let (verified, unverified) = split(records);
    let format = config.paths.intermediate_format;

    let verified_file = persist_intermediate(&verified, &config.paths.verified_file(), format)?;
    let unverified_file =
        persist_intermediate(&unverified, &config.paths.unverified_file(), format)?;

    Ok(TransformOutput {
        verified,
        unverified,
        verified_file,
        unverified_file,
    })
}

/// `transform` fed from the raw file of an earlier `extract`
pub fn transform_from_raw(config: &Config) -> Result<TransformOutput> {
    let records = read_intermediate(&config.paths.raw_file())?;
    transform(config, records)
}

/// Load both partitions into their tables.
///
/// Each partition is its own unit of work with its own connection. A failure
/// (including failing to open the database) is logged and recorded for that
/// table; it never stops the other table's load from being attempted.
pub fn load(
    config: &Config,
    verified: &[FundMetadataRecord],
    unverified: &[FundMetadataRecord],
) -> LoadSummary {
    load_with(config, verified, unverified, Store::open)
}

fn load_with<F>(
    config: &Config,
    verified: &[FundMetadataRecord],
    unverified: &[FundMetadataRecord],
    mut open: F,
) -> LoadSummary
where
    F: FnMut(&DatabaseConfig) -> Result<Store>,
{
    info!("starting load phase");

    let mut load_one = |group: &[FundMetadataRecord], table: &str| -> TableOutcome {
        let result =
            open(&config.database).and_then(|mut store| store.load_to_table(group, table));

        let status = match result {
            Ok(rows) => LoadStatus::Loaded { rows },
            Err(e) => {
                error!(table, error = %e, "load failed");
                LoadStatus::Failed {
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                }
            }
        };

        TableOutcome {
            table: table.to_string(),
            records: group.len(),
            status,
        }
    };

    let verified = load_one(verified, &config.tables.verified);
    let unverified = load_one(unverified, &config.tables.unverified);

    LoadSummary {
        verified,
        unverified,
    }
}

/// `load` fed from the partition files of an earlier `transform`
pub fn load_from_processed(config: &Config) -> Result<LoadSummary> {
    let verified = read_intermediate(&config.paths.verified_file())?;
    let unverified = read_intermediate(&config.paths.unverified_file())?;
    Ok(load(config, &verified, &unverified))
}

/// Full run: extract, transform, load, then write the run report.
///
/// Failing to write the report is logged; the load outcomes are still returned.
pub fn run(config: &Config) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, "pipeline started");

    let mut extracted = extract(config)?;
    let records = std::mem::take(&mut extracted.records);

    let transformed = transform(config, records)?;
    let loaded = load(config, &transformed.verified, &transformed.unverified);

    let report = RunReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        extract: extracted,
        transform: transformed,
        load: loaded,
    };

    if let Err(e) = write_report(config, &report) {
        error!(error = %e, "failed to write run report");
    }
    info!(
        %run_id,
        failures = report.load.failures(),
        "pipeline finished"
    );
    Ok(report)
}

fn write_report(config: &Config, report: &RunReport) -> Result<()> {
    let path = config.paths.report_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(report).map_err(EtlError::serialize)?;
    fs::write(&path, bytes)?;
    info!(path = %path.display(), "saved run report");
    Ok(())
}

/// Open the configured database and run `SELECT 1`
pub fn check_db(config: &Config) -> Result<()> {
    let store = Store::open(&config.database)?;
    let one = store.check_connection()?;
    info!(target = %store.target().describe(), result = one, "database connection successful");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
