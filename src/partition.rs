// ✂️ Splitter/Persister - verified vs unverified partitions
//
// split()                → (verified, unverified), total and non-overlapping
// persist_intermediate() → overwrite-write one partition (JSON or CSV)
// read_intermediate()    → read a partition file back

use crate::config::IntermediateFormat;
use crate::error::{EtlError, Result};
use crate::record::{FundMetadataRecord, COLUMNS};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A partition file on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedFile {
    pub path: PathBuf,
    pub records: usize,
    pub sha256: String,
}

/// Partition records by verification status, preserving input order
pub fn split(
    records: Vec<FundMetadataRecord>,
) -> (Vec<FundMetadataRecord>, Vec<FundMetadataRecord>) {
    let (verified, unverified): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|r| r.is_verified());

    info!(
        verified = verified.len(),
        unverified = unverified.len(),
        "split records"
    );
    (verified, unverified)
}

/// Write a partition to `path`, replacing any existing file.
///
/// Parent directories are created as needed. CSV output always carries the
/// full header row, even for an empty partition.
pub fn persist_intermediate(
    group: &[FundMetadataRecord],
    path: &Path,
    format: IntermediateFormat,
) -> Result<PersistedFile> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = match format {
        IntermediateFormat::Json => {
            serde_json::to_vec_pretty(group).map_err(EtlError::serialize)?
        }
        IntermediateFormat::Csv => to_csv_bytes(group)?,
    };

    fs::write(path, &bytes)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = format!("{:x}", hasher.finalize());

    info!(path = %path.display(), records = group.len(), "saved partition");

    Ok(PersistedFile {
        path: path.to_path_buf(),
        records: group.len(),
        sha256,
    })
}

fn to_csv_bytes(group: &[FundMetadataRecord]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(COLUMNS)?;
    for record in group {
        wtr.serialize(record)?;
    }

    wtr.into_inner().map_err(|e| EtlError::Io(e.into_error()))
}

/// Read a partition written by [`persist_intermediate`].
///
/// The format follows the file extension (`.csv`, anything else is JSON).
pub fn read_intermediate(path: &Path) -> Result<Vec<FundMetadataRecord>> {
    if !path.exists() {
        return Err(EtlError::NotFound(format!(
            "intermediate file not found: {}",
            path.display()
        )));
    }

    let records: Vec<FundMetadataRecord> = match format_of(path) {
        IntermediateFormat::Json => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text)
                .map_err(|e| EtlError::Parse(format!("{}: {}", path.display(), e)))?
        }
        IntermediateFormat::Csv => {
            let mut rdr = csv::Reader::from_path(path)?;
            rdr.deserialize()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| EtlError::Parse(format!("{}: {}", path.display(), e)))?
        }
    };

    info!(path = %path.display(), count = records.len(), "loaded partition");
    Ok(records)
}

fn format_of(path: &Path) -> IntermediateFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => IntermediateFormat::Csv,
        _ => IntermediateFormat::Json,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Vec<FundMetadataRecord> {
        vec![
            FundMetadataRecord::new("ABC Growth Fund")
                .with_code("100001")
                .with_attribute("nav", "45.12"),
            FundMetadataRecord::new("Totally Unrelated Fund XYZ"),
            FundMetadataRecord::new("XYZ Debt Fund")
                .with_code("100002")
                .with_attribute("risk_level", "Low"),
            FundMetadataRecord::new("Orphan Fund"),
        ]
    }

    #[test]
    fn test_split_is_total_and_disjoint() {
        let input = sample();
        let (verified, unverified) = split(input.clone());

        assert_eq!(verified.len() + unverified.len(), input.len());
        assert!(verified.iter().all(|r| r.scheme_code.is_some()));
        assert!(unverified.iter().all(|r| r.scheme_code.is_none()));
        for record in &input {
            let hits = verified.iter().filter(|r| *r == record).count()
                + unverified.iter().filter(|r| *r == record).count();
            assert_eq!(hits, 1, "{} must land in exactly one partition", record.scheme_name);
        }
        // order kept within each partition
        assert_eq!(verified[0].scheme_name, "ABC Growth Fund");
        assert_eq!(unverified[1].scheme_name, "Orphan Fund");
    }

    #[test]
    fn test_split_empty() {
        let (verified, unverified) = split(Vec::new());
        assert!(verified.is_empty());
        assert!(unverified.is_empty());
    }

    #[test]
    fn test_persist_json_creates_dirs_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/verified/metadata_verified.json");
        let records = sample();

        let first = persist_intermediate(&records, &path, IntermediateFormat::Json).unwrap();
        assert_eq!(first.records, 4);
        assert_eq!(first.sha256.len(), 64);

        let second = persist_intermediate(&records[..1], &path, IntermediateFormat::Json).unwrap();
        assert_ne!(first.sha256, second.sha256);

        let back = read_intermediate(&path).unwrap();
        assert_eq!(back, records[..1].to_vec());
    }

    #[test]
    fn test_json_keeps_null_codes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unverified.json");

        persist_intermediate(&sample()[1..2], &path, IntermediateFormat::Json).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert!(json[0]["scheme_code"].is_null());
        assert_eq!(json[0]["scheme_name"], "Totally Unrelated Fund XYZ");
    }

    #[test]
    fn test_persist_csv_has_fixed_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metadata_verified.csv");
        let records = sample();

        persist_intermediate(&records, &path, IntermediateFormat::Csv).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));

        let back = read_intermediate(&path).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_empty_csv_still_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        persist_intermediate(&[], &path, IntermediateFormat::Csv).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().trim_end(), COLUMNS.join(","));
        assert!(read_intermediate(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_intermediate(Path::new("/no/such/partition.json")).unwrap_err();
        assert!(matches!(err, EtlError::NotFound(_)));
    }
}
