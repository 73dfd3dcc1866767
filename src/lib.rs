// Fund Metadata ETL - Core Library
// Exposes the pipeline stages for the CLI and tests

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod partition;
pub mod pipeline;
pub mod reconciliation;
pub mod record;
pub mod similarity;

// Re-export commonly used types
pub use catalog::{fetch_catalog, parse_catalog, SchemeCatalogEntry};
pub use config::{Config, DatabaseConfig, DatabaseTarget, IntermediateFormat};
pub use db::Store;
pub use error::{EtlError, Result};
pub use metadata::load_metadata_csv;
pub use partition::{persist_intermediate, read_intermediate, split, PersistedFile};
pub use pipeline::{LoadStatus, LoadSummary, RunReport, TableOutcome};
pub use reconciliation::{MatchOutcome, ReconciledRecord, ReconciliationReport, Reconciler};
pub use record::{FundMetadataRecord, COLUMNS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
