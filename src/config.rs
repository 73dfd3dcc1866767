// ⚙️ Configuration - one validated value, built once at startup
//
// Loaded from YAML:
//
//   database:
//     url: sqlite://data/funds.db        # or the parts below
//     dbname: funds
//     host: localhost
//   source:
//     csv_path: data/mf_metadata.csv
//     mf_list_url: https://api.mfapi.in/mf
//
// `paths`, `tables` and `reconcile` are optional and fall back to defaults.

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_CUTOFF: f64 = 0.8;

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub dbname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub csv_path: PathBuf,
    pub mf_list_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntermediateFormat {
    #[default]
    Json,
    Csv,
}

impl IntermediateFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            IntermediateFormat::Json => "json",
            IntermediateFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    #[serde(default)]
    pub intermediate_format: IntermediateFormat,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            raw_dir: default_raw_dir(),
            processed_dir: default_processed_dir(),
            intermediate_format: IntermediateFormat::default(),
        }
    }
}

impl PathsConfig {
    pub fn raw_file(&self) -> PathBuf {
        self.raw_dir.join("metadata_raw.json")
    }

    pub fn verified_file(&self) -> PathBuf {
        self.partition_file("metadata_verified")
    }

    pub fn unverified_file(&self) -> PathBuf {
        self.partition_file("metadata_unverified")
    }

    pub fn report_file(&self) -> PathBuf {
        self.processed_dir.join("run_report.json")
    }

    fn partition_file(&self, stem: &str) -> PathBuf {
        self.processed_dir
            .join(stem)
            .join(format!("{}.{}", stem, self.intermediate_format.extension()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_verified_table")]
    pub verified: String,
    #[serde(default = "default_unverified_table")]
    pub unverified: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        TablesConfig {
            verified: default_verified_table(),
            unverified: default_unverified_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            cutoff: default_cutoff(),
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_verified_table() -> String {
    "mutual_fund_metadata".to_string()
}

fn default_unverified_table() -> String {
    "mutual_fund_unverified".to_string()
}

fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

// ============================================================================
// DATABASE TARGET
// ============================================================================

/// Where the embedded store lives, resolved once from `database.*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

impl DatabaseTarget {
    pub fn describe(&self) -> String {
        match self {
            DatabaseTarget::Memory => "sqlite::memory:".to_string(),
            DatabaseTarget::File(path) => format!("sqlite://{}", path.display()),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the store location.
    ///
    /// `url` wins when present. Otherwise `dbname` is required and names the
    /// database file; `host` must be local because the store is embedded.
    pub fn target(&self) -> Result<DatabaseTarget> {
        if let Some(url) = self.url.as_deref() {
            return parse_url(url);
        }

        let dbname = self
            .dbname
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                EtlError::Config("database.url or database.dbname is required".to_string())
            })?;

        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        if !is_local_host(host) {
            return Err(EtlError::Config(format!(
                "database.host '{}' is not local; the store is an embedded database file",
                host
            )));
        }

        let mut path = PathBuf::from(dbname);
        if path.extension().is_none() {
            path.set_extension("db");
        }
        Ok(DatabaseTarget::File(path))
    }

    /// True when credentials/port are set; the embedded store ignores them
    pub fn has_network_settings(&self) -> bool {
        self.url.is_none()
            && (self.user.is_some() || self.password.is_some() || self.port.is_some())
    }
}

fn parse_url(url: &str) -> Result<DatabaseTarget> {
    let url = url.trim();
    if url.is_empty() {
        return Err(EtlError::Config("database.url is empty".to_string()));
    }
    if url == "sqlite::memory:" || url == ":memory:" {
        return Ok(DatabaseTarget::Memory);
    }
    if let Some(path) = url.strip_prefix("sqlite://") {
        if path.is_empty() {
            return Err(EtlError::Config(format!("database.url '{}' has no path", url)));
        }
        return Ok(DatabaseTarget::File(PathBuf::from(path)));
    }
    if url.contains("://") {
        return Err(EtlError::Config(format!(
            "unsupported database.url scheme in '{}' (expected sqlite://)",
            url
        )));
    }
    Ok(DatabaseTarget::File(PathBuf::from(url)))
}

fn is_local_host(host: &str) -> bool {
    matches!(host.trim(), "" | "localhost" | "127.0.0.1" | "::1")
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Read, parse and validate a YAML config file
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(EtlError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Config::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(text)
            .map_err(|e| EtlError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.database.target()?;

        if self.source.csv_path.as_os_str().is_empty() {
            return Err(EtlError::Config("source.csv_path is empty".to_string()));
        }

        let url = self.source.mf_list_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EtlError::Config(format!(
                "source.mf_list_url must be an http(s) URL, got '{}'",
                self.source.mf_list_url
            )));
        }

        for (key, name) in [
            ("tables.verified", &self.tables.verified),
            ("tables.unverified", &self.tables.unverified),
        ] {
            if !is_valid_identifier(name) {
                return Err(EtlError::Config(format!(
                    "{} '{}' is not a valid table name",
                    key, name
                )));
            }
        }
        if self.tables.verified == self.tables.unverified {
            return Err(EtlError::Config(
                "tables.verified and tables.unverified must differ".to_string(),
            ));
        }

        let cutoff = self.reconcile.cutoff;
        if !(cutoff > 0.0 && cutoff <= 1.0) {
            return Err(EtlError::Config(format!(
                "reconcile.cutoff must be in (0, 1], got {}",
                cutoff
            )));
        }

        Ok(())
    }
}

/// Letters, digits and underscores, not starting with a digit
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
