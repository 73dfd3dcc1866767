// 🚨 Error kinds for every pipeline stage
//
// Config + input errors abort a run. Network errors abort the extract stage.
// Storage errors are caught per table by the pipeline and reported.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    /// Short machine-readable label, used in the run report
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::Config(_) => "config",
            EtlError::NotFound(_) => "not_found",
            EtlError::Network(_) => "network",
            EtlError::Parse(_) => "parse",
            EtlError::Storage(_) => "storage",
            EtlError::Io(_) => "io",
        }
    }

    /// A value that could not be written out. Reading errors are `Parse`.
    pub fn serialize(err: serde_json::Error) -> Self {
        EtlError::Io(err.into())
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        EtlError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for EtlError {
    fn from(err: reqwest::Error) -> Self {
        EtlError::Network(err.to_string())
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        EtlError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
