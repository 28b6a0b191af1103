//! Record assembly: the extraction prompt and the post-generation pipeline.
//!
//! The generation call itself is async and lives in the app crate. This
//! module owns both sides of it: [`extraction_prompt`] builds the fixed
//! schema prompt, and [`assemble`] turns the model's reply into an
//! [`Analysis`].
//!
//! Per document: `Prompted → ParseFailed` (terminal, error record returned)
//! or `Prompted → Parsed → Reconciled → Filtered → Done`.

use serde::Serialize;
use serde_json::Value;

use crate::budget::fix_budgets;
use crate::models::{RfpDraft, RfpRecord};
use crate::parse::{extract_json, ExtractionError, ExtractionFailure};
use crate::skills::split_composite;

/// Token budget for the extraction call.
pub const EXTRACTION_MAX_TOKENS: u32 = 2000;

/// Outcome of assembling one model response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Analysis {
    Record(RfpRecord),
    Failed(ExtractionFailure),
}

impl Analysis {
    pub fn record(&self) -> Option<&RfpRecord> {
        match self {
            Analysis::Record(record) => Some(record),
            Analysis::Failed(_) => None,
        }
    }

    pub fn into_record(self) -> Option<RfpRecord> {
        match self {
            Analysis::Record(record) => Some(record),
            Analysis::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        match self {
            Analysis::Failed(failure) => Some(failure),
            Analysis::Record(_) => None,
        }
    }
}

/// Build the extraction prompt for one document.
///
/// The repair rules are stated as hints only; [`assemble`] enforces them
/// regardless of what the model does.
pub fn extraction_prompt(file_name: &str, file_text: &str) -> String {
    format!(
        r#"
You are an AI assistant analyzing an RFP document.

Return ONLY a valid JSON object.
Do not include explanations, markdown, comments, or text outside JSON.

The JSON must follow this structure:

{{
  "Project_Type": "...",
  "Scope": {{
    "Objectives": [...],
    "Description": "..."
  }},
  "Deliverables": [...],
  "Required_Skills": [...],
  "Tasks_Roles": [
    {{
      "Role": "...",
      "Tasks": [...]
    }}
  ],
  "Timeline": {{
    "Phases": [
      {{
        "Phase": "...",
        "Start_Date": "YYYY-MM-DD",
        "End_Date": "YYYY-MM-DD",
        "Duration_Days": ...,
        "Estimated_Budget": ...
      }}
    ],
    "Total_Duration_Days": ...
  }},
  "Cost_Estimate": {{
    "Amount": ...,
    "Currency": "INR",
    "Estimated": true
  }},
  "RFP_File": "{file_name}"
}}

Rules:
- No empty task lists. Remove roles with empty tasks.
- No zero budgets. If missing → distribute placeholder budget of 1,000,000 INR across phases.
- Normalize dates to YYYY-MM-DD.
- Ensure valid JSON only.

RFP text:

{file_text}
"#
    )
}

/// Turn a raw model response into an [`Analysis`].
///
/// Parses the response; on failure returns the error record without any
/// reconciliation. Otherwise reconciles budgets and dates, pins `RFP_File`
/// to `file_name`, drops roles without tasks and splits composite skills.
pub fn assemble(file_name: &str, response: &str) -> Analysis {
    let object = match extract_json(response) {
        Ok(object) => object,
        Err(failure) => {
            tracing::warn!(rfp_file = file_name, reason = %failure.error, "parse_failed");
            return Analysis::Failed(failure);
        }
    };

    let draft: RfpDraft = match serde_json::from_value(Value::Object(object)) {
        Ok(draft) => draft,
        Err(e) => {
            tracing::warn!(rfp_file = file_name, error = %e, "parse_failed");
            return Analysis::Failed(ExtractionFailure::new(
                ExtractionError::Unparseable,
                response,
            ));
        }
    };

    let mut record = fix_budgets(draft);
    tracing::debug!(rfp_file = file_name, "reconciled");

    record.rfp_file = file_name.to_string();
    record.tasks_roles.retain(|role| !role.tasks.is_empty());
    record.required_skills = split_composite(&record.required_skills);

    tracing::info!(
        rfp_file = file_name,
        phases = record.timeline.phases.len(),
        roles = record.tasks_roles.len(),
        skills = record.required_skills.len(),
        "done"
    );
    Analysis::Record(record)
}
