//! Export analysis results as JSON, and read them back.
//!
//! The export is a pretty-printed JSON array with one entry per analyzed
//! document: the reconciled record, or `{"RFP_File", "error", ...}` for a
//! document that failed. Non-ASCII text is written as-is.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use rfp_analyzer_core::models::RfpRecord;

/// Write `entries` to `output`, or to stdout when `output` is `None`.
pub fn write_json(entries: &[Value], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create export directory: {}", parent.display())
                    })?;
                }
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            eprintln!("Exported {} entries to {}", entries.len(), path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Parse an export, keeping entries that are reconciled records.
///
/// Error entries are skipped. A lone object is accepted as a one-entry
/// export.
pub fn parse_records(content: &str) -> Result<Vec<RfpRecord>> {
    let value: Value = serde_json::from_str(content).context("Export is not valid JSON")?;

    let entries = match value {
        Value::Array(entries) => entries,
        object @ Value::Object(_) => vec![object],
        _ => anyhow::bail!("Export must be a JSON array of analysis entries"),
    };

    Ok(records_from_entries(entries))
}

/// Keep the entries that are reconciled records, skipping error entries.
pub fn records_from_entries(entries: Vec<Value>) -> Vec<RfpRecord> {
    let total = entries.len();
    let records: Vec<RfpRecord> = entries
        .into_iter()
        .filter(|entry| entry.get("error").is_none())
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed analysis entry");
                None
            }
        })
        .collect();

    tracing::debug!(total, records = records.len(), "loaded analysis entries");
    records
}

pub fn load_records(path: &Path) -> Result<Vec<RfpRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read analysis file: {}", path.display()))?;
    parse_records(&content)
}
