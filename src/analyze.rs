//! Per-document analysis and the batch driver behind `rfpa analyze`.
//!
//! [`analyze_rfp`] is the single-document entry point: build the extraction
//! prompt, call the generator once, and hand the reply to
//! [`rfp_analyzer_core::assemble::assemble`]. [`analyze_batch`] runs it over
//! many documents in order; one document's failure never stops the batch.

use anyhow::Result;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use rfp_analyzer_core::assemble::{assemble, extraction_prompt, Analysis};
use rfp_analyzer_core::models::RfpRecord;

use crate::config::Config;
use crate::export;
use crate::intake::{collect_documents, Document};
use crate::llm::{create_generator, TextGenerator};

/// Analyze one document.
///
/// Returns `Err` only when the generator itself fails (network, auth,
/// exhausted retries). An unusable model reply is `Ok(Analysis::Failed)`.
pub async fn analyze_rfp(
    file_name: &str,
    text: &str,
    generator: &dyn TextGenerator,
    max_tokens: u32,
) -> Result<Analysis> {
    let prompt = extraction_prompt(file_name, text);
    tracing::info!(
        rfp_file = file_name,
        model = generator.model_name(),
        chars = text.len(),
        "prompted"
    );

    let response = generator.generate(&prompt, max_tokens).await?;
    tracing::debug!(rfp_file = file_name, chars = response.len(), "response received");

    Ok(assemble(file_name, &response))
}

#[derive(Debug)]
pub enum BatchOutcome {
    Record(RfpRecord),
    /// The model replied but no object could be recovered.
    Failed(Analysis),
    /// The generator call failed.
    Error(String),
}

#[derive(Debug)]
pub struct BatchEntry {
    pub rfp_file: String,
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    /// Export form: the record itself, or `RFP_File` plus the error fields.
    pub fn to_json(&self) -> Result<Value> {
        Ok(match &self.outcome {
            BatchOutcome::Record(record) => serde_json::to_value(record)?,
            BatchOutcome::Failed(analysis) => {
                let mut value = serde_json::to_value(analysis)?;
                if let Value::Object(map) = &mut value {
                    map.insert("RFP_File".to_string(), json!(self.rfp_file));
                }
                value
            }
            BatchOutcome::Error(message) => json!({
                "RFP_File": self.rfp_file,
                "error": message,
            }),
        })
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn records(&self) -> Vec<&RfpRecord> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                BatchOutcome::Record(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, BatchOutcome::Failed(_)))
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, BatchOutcome::Error(_)))
            .count()
    }

    pub fn to_json(&self) -> Result<Vec<Value>> {
        self.entries.iter().map(BatchEntry::to_json).collect()
    }
}

/// Analyze `documents` sequentially.
pub async fn analyze_batch(
    documents: &[Document],
    generator: &dyn TextGenerator,
    max_tokens: u32,
) -> BatchReport {
    let mut report = BatchReport::default();

    for doc in documents {
        let outcome = match analyze_rfp(&doc.file_name, &doc.text, generator, max_tokens).await {
            Ok(Analysis::Record(record)) => BatchOutcome::Record(record),
            Ok(failed) => BatchOutcome::Failed(failed),
            Err(e) => {
                tracing::error!(rfp_file = %doc.file_name, error = %e, "generation failed");
                BatchOutcome::Error(format!("{:#}", e))
            }
        };
        report.entries.push(BatchEntry {
            rfp_file: doc.file_name.clone(),
            outcome,
        });
    }

    report
}

/// CLI entry point for `rfpa analyze`.
///
/// Prints one status line per document and a summary to stdout, then
/// exports the batch: to `output` if given, to stdout with `to_stdout`,
/// otherwise to the configured export path.
pub async fn run_analyze(
    config: &Config,
    inputs: &[PathBuf],
    output: Option<&Path>,
    to_stdout: bool,
) -> Result<()> {
    let documents = collect_documents(inputs, &config.intake)?;
    let generator = create_generator(&config.llm)?;

    let report = analyze_batch(
        &documents,
        generator.as_ref(),
        config.llm.extraction_max_tokens,
    )
    .await;

    // Status lines would corrupt a JSON dump on stdout.
    let status = |line: String| {
        if to_stdout {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };

    for entry in &report.entries {
        match &entry.outcome {
            BatchOutcome::Record(record) => status(format!(
                "  ok      {} ({} phases, {} roles, {} skills)",
                entry.rfp_file,
                record.timeline.phases.len(),
                record.tasks_roles.len(),
                record.required_skills.len()
            )),
            BatchOutcome::Failed(analysis) => {
                let reason = analysis
                    .failure()
                    .map(|f| f.error.to_string())
                    .unwrap_or_default();
                status(format!("  failed  {}: {}", entry.rfp_file, reason))
            }
            BatchOutcome::Error(message) => {
                status(format!("  error   {}: {}", entry.rfp_file, message))
            }
        }
    }
    status(format!(
        "analyzed {} documents: {} ok, {} unparseable, {} errors",
        report.entries.len(),
        report.records().len(),
        report.failed_count(),
        report.error_count()
    ));

    let entries = report.to_json()?;
    if to_stdout {
        export::write_json(&entries, None)?;
    } else {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.export.json_path());
        export::write_json(&entries, Some(&path))?;
    }

    Ok(())
}
