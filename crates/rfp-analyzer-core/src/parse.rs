//! Recover a JSON object from free-text model output.
//!
//! Models asked for "ONLY JSON" still wrap it in prose or markdown fences
//! often enough that a strict parse is not sufficient. [`extract_json`]
//! tries a strict parse of the whole response first, then falls back to the
//! widest `{ ... }` span (first `{` to last `}`). It never retries against
//! the model; that is a caller policy.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why no object could be recovered from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The response contains no `{ ... }` span at all.
    #[error("No JSON found")]
    NoJsonFound,
    /// A brace span exists but does not parse as a JSON object.
    #[error("Failed to parse JSON even after regex extraction")]
    Unparseable,
}

impl Serialize for ExtractionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExtractionError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let reason = String::deserialize(deserializer)?;
        if reason == ExtractionError::NoJsonFound.to_string() {
            Ok(ExtractionError::NoJsonFound)
        } else {
            Ok(ExtractionError::Unparseable)
        }
    }
}

/// The error record surfaced to callers when extraction fails:
/// `{"error": <reason>, "raw_output": <original text>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub error: ExtractionError,
    /// The model response, verbatim.
    pub raw_output: String,
}

impl ExtractionFailure {
    pub fn new(error: ExtractionError, raw_output: &str) -> Self {
        Self {
            error,
            raw_output: raw_output.to_string(),
        }
    }
}

/// Extract the JSON object embedded in `text`.
///
/// 1. Strict parse of the whole input; accepted only if it is an object.
/// 2. Otherwise parse the span from the first `{` to the last `}`.
/// 3. Otherwise fail with [`ExtractionError::NoJsonFound`] when there is no
///    such span, or [`ExtractionError::Unparseable`] when it did not parse.
pub fn extract_json(text: &str) -> Result<Map<String, Value>, ExtractionFailure> {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
        return Ok(object);
    }

    let span = brace_span(text)
        .ok_or_else(|| ExtractionFailure::new(ExtractionError::NoJsonFound, text))?;

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(ExtractionFailure::new(ExtractionError::Unparseable, text)),
    }
}

/// Greedy span from the first `{` to the last `}` after it.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
