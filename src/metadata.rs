// 📂 Metadata Loader - fund metadata CSV → records without scheme codes

use crate::error::{EtlError, Result};
use crate::record::FundMetadataRecord;
use std::path::Path;
use tracing::{info, warn};

/// Load fund metadata rows from a CSV file.
///
/// - Missing file → `NotFound`
/// - Malformed CSV, no `scheme_name` header, or an empty name → `Parse`
/// - Extra columns are ignored, absent ones become null
/// - Any `scheme_code` already in the file is dropped; codes come from reconciliation
pub fn load_metadata_csv(csv_path: &Path) -> Result<Vec<FundMetadataRecord>> {
    info!(path = %csv_path.display(), "reading metadata CSV");

    if !csv_path.exists() {
        return Err(EtlError::NotFound(format!(
            "CSV file not found: {}",
            csv_path.display()
        )));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(csv_path)
        .map_err(|e| EtlError::Parse(format!("{}: {}", csv_path.display(), e)))?;

    let headers = rdr
        .headers()
        .map_err(|e| EtlError::Parse(format!("{}: {}", csv_path.display(), e)))?
        .clone();

    if !headers.iter().any(|h| h == "scheme_name") {
        return Err(EtlError::Parse(format!(
            "{}: missing required column 'scheme_name'",
            csv_path.display()
        )));
    }

    let mut records = Vec::new();
    let mut dropped_codes = 0;

    for (index, result) in rdr.deserialize::<FundMetadataRecord>().enumerate() {
        // header is line 1
        let line = index + 2;
        let mut record = result
            .map_err(|e| EtlError::Parse(format!("{} line {}: {}", csv_path.display(), line, e)))?;

        if record.scheme_name.trim().is_empty() {
            return Err(EtlError::Parse(format!(
                "{} line {}: empty scheme_name",
                csv_path.display(),
                line
            )));
        }

        if record.scheme_code.take().is_some() {
            dropped_codes += 1;
        }

        records.push(record);
    }

    if dropped_codes > 0 {
        warn!(
            count = dropped_codes,
            "ignoring scheme_code values present in the input CSV"
        );
    }

    info!(count = records.len(), "loaded metadata rows");
    Ok(records)
}
