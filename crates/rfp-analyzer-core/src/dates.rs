//! Phase date normalization.
//!
//! Dates are rewritten to `YYYY-MM-DD`. Inputs are tried as ISO
//! (`%Y-%m-%d`) and then as day-first (`%d/%m/%Y`); anything else becomes
//! [`DATE_SENTINEL`]. Absent and empty fields are left alone. This never
//! fails.

use chrono::NaiveDate;

use crate::models::PhaseDraft;

/// Written in place of a date that could not be parsed.
pub const DATE_SENTINEL: &str = "1970-01-01";

const CANONICAL_FORMAT: &str = "%Y-%m-%d";
const ACCEPTED_FORMATS: [&str; 2] = [CANONICAL_FORMAT, "%d/%m/%Y"];

/// Normalize one non-empty date string.
pub fn normalize_date(raw: &str) -> String {
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|date| date.format(CANONICAL_FORMAT).to_string())
        .unwrap_or_else(|| DATE_SENTINEL.to_string())
}

/// Normalize `Start_Date` and `End_Date` of every phase in place.
pub fn normalize_dates(phases: &mut [PhaseDraft]) {
    for phase in phases.iter_mut() {
        for field in [&mut phase.start_date, &mut phase.end_date] {
            if let Some(raw) = field.as_mut() {
                if !raw.is_empty() {
                    *raw = normalize_date(raw);
                }
            }
        }
    }
}
