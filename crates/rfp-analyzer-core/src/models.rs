//! Record types for extracted RFP summaries.
//!
//! The model's output is read into the `*Draft` types first. Every draft
//! field is optional and tolerant of the wrong JSON type: a malformed field
//! is treated as absent rather than failing the whole document. The
//! reconciled types ([`RfpRecord`], [`Timeline`], [`Phase`],
//! [`CostEstimate`]) carry the invariants established by
//! [`crate::budget::fix_budgets`].
//!
//! Serialized field names follow the extraction prompt schema
//! (`Project_Type`, `Tasks_Roles`, `Duration_Days`, ...). A serialized
//! [`RfpRecord`] deserializes back into an [`RfpDraft`], so reconciliation
//! can be re-run on its own output.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============ Draft types (model output) ============

/// An extraction as emitted by the model, before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RfpDraft {
    #[serde(rename = "Project_Type", default, deserialize_with = "lenient")]
    pub project_type: Option<String>,
    #[serde(rename = "Scope", default, deserialize_with = "lenient")]
    pub scope: Option<Scope>,
    #[serde(rename = "Deliverables", default, deserialize_with = "string_list")]
    pub deliverables: Vec<String>,
    #[serde(rename = "Required_Skills", default, deserialize_with = "string_list")]
    pub required_skills: Vec<String>,
    #[serde(rename = "Tasks_Roles", default, deserialize_with = "object_list")]
    pub tasks_roles: Vec<TaskRole>,
    #[serde(rename = "Timeline", default, deserialize_with = "lenient")]
    pub timeline: Option<TimelineDraft>,
    #[serde(rename = "Cost_Estimate", default, deserialize_with = "lenient")]
    pub cost_estimate: Option<CostEstimateDraft>,
    #[serde(rename = "RFP_File", default, deserialize_with = "lenient")]
    pub rfp_file: Option<String>,
    /// Top-level keys outside the schema, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `Timeline` as emitted by the model. `Total_Duration_Days` is read and
/// discarded; it is always recomputed from the phases.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimelineDraft {
    /// Elements that are not phase objects are dropped one by one.
    #[serde(rename = "Phases", default, deserialize_with = "lenient_list")]
    pub phases: Option<Vec<PhaseDraft>>,
    #[serde(rename = "Total_Duration_Days", default)]
    pub total_duration_days: Option<Value>,
}

/// A timeline phase as emitted by the model.
///
/// `duration_days` stays a raw JSON value so the reconciler can apply its
/// coercion policy; `estimated_budget` is never trusted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PhaseDraft {
    #[serde(rename = "Phase", default, deserialize_with = "lenient")]
    pub phase: Option<String>,
    #[serde(rename = "Start_Date", default, deserialize_with = "lenient")]
    pub start_date: Option<String>,
    #[serde(rename = "End_Date", default, deserialize_with = "lenient")]
    pub end_date: Option<String>,
    #[serde(rename = "Duration_Days", default)]
    pub duration_days: Option<Value>,
    #[serde(rename = "Estimated_Budget", default)]
    pub estimated_budget: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `Cost_Estimate` as emitted by the model. Only the amount is consulted;
/// currency and the estimated flag are always rewritten.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CostEstimateDraft {
    #[serde(rename = "Amount", default)]
    pub amount: Option<Value>,
}

// ============ Pass-through types ============

/// Project scope. Passed through reconciliation unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "Objectives", default, deserialize_with = "string_list")]
    pub objectives: Vec<String>,
    #[serde(
        rename = "Description",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

/// A role and the tasks assigned to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRole {
    #[serde(
        rename = "Role",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    #[serde(rename = "Tasks", default, deserialize_with = "string_list")]
    pub tasks: Vec<String>,
}

// ============ Reconciled types ============

/// The canonical structured summary of one RFP document.
///
/// Invariants after assembly: `cost_estimate.amount > 0`; phase durations
/// sum to `timeline.total_duration_days` (floored at 1); phase budgets sum
/// to `cost_estimate.amount` within per-phase rounding; every phase has
/// `duration_days >= 1`; every role has at least one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfpRecord {
    #[serde(
        rename = "Project_Type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub project_type: Option<String>,
    #[serde(rename = "Scope", default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(rename = "Deliverables", default)]
    pub deliverables: Vec<String>,
    #[serde(rename = "Required_Skills", default)]
    pub required_skills: Vec<String>,
    #[serde(rename = "Tasks_Roles", default)]
    pub tasks_roles: Vec<TaskRole>,
    #[serde(rename = "Timeline")]
    pub timeline: Timeline,
    #[serde(rename = "Cost_Estimate")]
    pub cost_estimate: CostEstimate,
    #[serde(rename = "RFP_File")]
    pub rfp_file: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(rename = "Phases")]
    pub phases: Vec<Phase>,
    #[serde(rename = "Total_Duration_Days")]
    pub total_duration_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(rename = "Phase", default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// `YYYY-MM-DD`, the `1970-01-01` sentinel, or whatever empty value the
    /// model gave (absent and empty dates are left alone).
    #[serde(
        rename = "Start_Date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<String>,
    #[serde(rename = "End_Date", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "Duration_Days")]
    pub duration_days: u32,
    #[serde(rename = "Estimated_Budget")]
    pub estimated_budget: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Phase {
    /// Display name, empty when the model gave none.
    pub fn name(&self) -> &str {
        self.phase.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Estimated")]
    pub estimated: bool,
}

// ============ Lenient field policies ============

/// Read a field as `T`; a null or wrongly-shaped value counts as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::debug!(error = %e, "treating malformed field as absent");
            Ok(None)
        }
    }
}

/// Read a list of strings. A bare string becomes a one-element list,
/// numbers and booleans are stringified, anything else is dropped.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().filter_map(scalar_string).collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    })
}

fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a list of objects, keeping the elements that parse as `T`.
fn object_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Like [`object_list`], but a missing or non-array value stays absent.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(None);
    };
    Ok(Some(
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_reads_schema_fields() {
        let draft: RfpDraft = serde_json::from_value(json!({
            "Project_Type": "Web Portal",
            "Scope": {"Objectives": ["Launch"], "Description": "Citizen portal"},
            "Deliverables": ["Portal", "Docs"],
            "Required_Skills": ["Rust"],
            "Tasks_Roles": [{"Role": "Dev", "Tasks": ["build"]}],
            "Timeline": {"Phases": [{"Phase": "Build", "Duration_Days": 10}]},
            "Cost_Estimate": {"Amount": 5000, "Currency": "USD"},
            "RFP_File": "portal.txt"
        }))
        .unwrap();

        assert_eq!(draft.project_type.as_deref(), Some("Web Portal"));
        assert_eq!(draft.scope.unwrap().objectives, vec!["Launch"]);
        assert_eq!(draft.deliverables.len(), 2);
        assert_eq!(draft.tasks_roles[0].role.as_deref(), Some("Dev"));
        let phases = draft.timeline.unwrap().phases.unwrap();
        assert_eq!(phases[0].duration_days, Some(json!(10)));
        assert_eq!(draft.cost_estimate.unwrap().amount, Some(json!(5000)));
        assert!(draft.extra.is_empty());
    }

    #[test]
    fn malformed_fields_are_absent() {
        let draft: RfpDraft = serde_json::from_value(json!({
            "Project_Type": 42,
            "Scope": "just a string",
            "Timeline": "six months",
            "Cost_Estimate": "a lot",
            "Tasks_Roles": "none"
        }))
        .unwrap();

        assert_eq!(draft.project_type, None);
        assert_eq!(draft.scope, None);
        assert_eq!(draft.timeline, None);
        assert_eq!(draft.cost_estimate, None);
        assert!(draft.tasks_roles.is_empty());
    }

    #[test]
    fn bad_phase_elements_are_dropped_individually() {
        let draft: RfpDraft = serde_json::from_value(json!({
            "Timeline": {"Phases": [{"Phase": "Design"}, "Go-live TBD", 7, {"Phase": "Build"}]}
        }))
        .unwrap();
        let phases = draft.timeline.unwrap().phases.unwrap();
        let names: Vec<_> = phases.iter().map(|p| p.phase.as_deref()).collect();
        assert_eq!(names, vec![Some("Design"), Some("Build")]);

        let draft: RfpDraft =
            serde_json::from_value(json!({"Timeline": {"Phases": "see annex"}})).unwrap();
        assert_eq!(draft.timeline.unwrap().phases, None);
    }

    #[test]
    fn string_lists_tolerate_mixed_values() {
        let draft: RfpDraft = serde_json::from_value(json!({
            "Deliverables": ["Report", 3, true, {"nested": 1}, null],
            "Required_Skills": "Python, SQL"
        }))
        .unwrap();

        assert_eq!(draft.deliverables, vec!["Report", "3", "true"]);
        assert_eq!(draft.required_skills, vec!["Python, SQL"]);
    }

    #[test]
    fn unknown_keys_are_kept() {
        let draft: RfpDraft = serde_json::from_value(json!({
            "Client": "Ministry of Works",
            "Timeline": {"Phases": [{"Phase": "Design", "Owner": "PMO"}]}
        }))
        .unwrap();

        assert_eq!(draft.extra.get("Client"), Some(&json!("Ministry of Works")));
        let phases = draft.timeline.unwrap().phases.unwrap();
        assert_eq!(phases[0].extra.get("Owner"), Some(&json!("PMO")));
        assert!(!phases[0].extra.contains_key("Phase"));
    }

    #[test]
    fn record_serializes_schema_names() {
        let record = RfpRecord {
            project_type: Some("Audit".into()),
            scope: None,
            deliverables: vec![],
            required_skills: vec!["SQL".into()],
            tasks_roles: vec![],
            timeline: Timeline {
                phases: vec![Phase {
                    phase: Some("Fieldwork".into()),
                    start_date: Some("2025-01-01".into()),
                    end_date: None,
                    duration_days: 5,
                    estimated_budget: 100.0,
                    extra: Map::new(),
                }],
                total_duration_days: 5,
            },
            cost_estimate: CostEstimate {
                amount: 100.0,
                currency: "INR".into(),
                estimated: true,
            },
            rfp_file: "audit.txt".into(),
            extra: Map::new(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["Project_Type"], "Audit");
        assert_eq!(value["Timeline"]["Phases"][0]["Duration_Days"], 5);
        assert_eq!(value["Timeline"]["Total_Duration_Days"], 5);
        assert_eq!(value["Cost_Estimate"]["Currency"], "INR");
        assert_eq!(value["RFP_File"], "audit.txt");
        assert!(value.get("Scope").is_none());
        assert!(value["Timeline"]["Phases"][0].get("End_Date").is_none());

        let back: RfpRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
