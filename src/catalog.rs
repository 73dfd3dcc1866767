// 📡 Scheme Catalog Fetcher - authoritative {scheme_code, scheme_name} list
//
// Wire payload: [{"schemeCode": 100027, "schemeName": "..."}, ...]
// The code arrives as a number or a string; both become text.

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeCatalogEntry {
    pub scheme_code: String,
    pub scheme_name: String,
}

impl SchemeCatalogEntry {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        SchemeCatalogEntry {
            scheme_code: code.into(),
            scheme_name: name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireCode {
    Number(i64),
    Text(String),
}

impl WireCode {
    fn into_text(self) -> String {
        match self {
            WireCode::Number(n) => n.to_string(),
            WireCode::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    #[serde(rename = "schemeCode")]
    scheme_code: WireCode,
    #[serde(rename = "schemeName")]
    scheme_name: String,
}

/// Fetch the scheme catalog with one blocking GET.
///
/// Non-2xx status, transport failure or an unexpected payload shape all map
/// to `EtlError::Network`. No retries.
pub fn fetch_catalog(url: &str) -> Result<Vec<SchemeCatalogEntry>> {
    info!(url, "fetching scheme list");

    let response = reqwest::blocking::get(url)
        .map_err(|e| EtlError::Network(format!("GET {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::Network(format!("GET {} returned {}", url, status)));
    }

    let body = response
        .bytes()
        .map_err(|e| EtlError::Network(format!("reading body from {} failed: {}", url, e)))?;

    let entries = parse_catalog(&body)?;
    info!(count = entries.len(), "fetched scheme catalog");
    Ok(entries)
}

/// Map the wire JSON array to catalog entries
pub fn parse_catalog(body: &[u8]) -> Result<Vec<SchemeCatalogEntry>> {
    let wire: Vec<WireEntry> = serde_json::from_slice(body)
        .map_err(|e| EtlError::Network(format!("unexpected scheme list payload: {}", e)))?;

    Ok(wire
        .into_iter()
        .map(|w| SchemeCatalogEntry {
            scheme_code: w.scheme_code.into_text(),
            scheme_name: w.scheme_name,
        })
        .collect())
}
