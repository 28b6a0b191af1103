//! Multi-RFP comparison.
//!
//! [`ComparisonReport::build`] aggregates a set of reconciled records into
//! headline metrics, per-RFP summaries, flagged budget and phase rows,
//! skill/role/project-type frequencies and threshold alerts. Rendering is
//! left to the caller.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::RfpRecord;

/// Placeholder for a missing project type or role name.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("at least 2 RFPs are needed for a comparison, got {0}")]
    TooFewRecords(usize),
    #[error("no RFP matches the selection")]
    EmptySelection,
}

/// Alert thresholds. A value strictly above a threshold is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub budget: f64,
    pub phase_days: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            budget: 1_000_000.0,
            phase_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetFlag {
    High,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseFlag {
    Long,
    Normal,
}

impl fmt::Display for BudgetFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BudgetFlag::High => "High",
            BudgetFlag::Normal => "Normal",
        })
    }
}

impl fmt::Display for PhaseFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhaseFlag::Long => "Long",
            PhaseFlag::Normal => "Normal",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_budget: f64,
    /// Mean of `Total_Duration_Days`, rounded to one decimal.
    pub average_duration_days: f64,
    pub total_roles: usize,
    pub distinct_skills: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfpSummary {
    pub rfp_file: String,
    pub project_type: String,
    pub budget: f64,
    pub total_duration_days: u64,
    pub skill_count: usize,
    pub role_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRow {
    pub rfp_file: String,
    pub budget: f64,
    pub flag: BudgetFlag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseRow {
    pub rfp_file: String,
    pub phase: String,
    pub duration_days: u32,
    pub estimated_budget: f64,
    pub flag: PhaseFlag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frequency {
    pub name: String,
    pub count: usize,
}

/// A phase over the duration or the budget threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub rfp_file: String,
    pub phase: String,
    pub duration_days: u32,
    pub estimated_budget: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} (Duration: {}, Budget: {})",
            self.rfp_file, self.phase, self.duration_days, self.estimated_budget
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub metrics: Metrics,
    pub summaries: Vec<RfpSummary>,
    pub budgets: Vec<BudgetRow>,
    pub phases: Vec<PhaseRow>,
    pub skills: Vec<Frequency>,
    pub roles: Vec<Frequency>,
    pub project_types: Vec<Frequency>,
    pub alerts: Vec<Alert>,
}

impl ComparisonReport {
    /// Compare `records`, optionally restricted to the `RFP_File` names in
    /// `selection`.
    ///
    /// Fails with [`CompareError::TooFewRecords`] when fewer than two
    /// records are given, and with [`CompareError::EmptySelection`] when the
    /// selection matches none of them.
    pub fn build(
        records: &[RfpRecord],
        selection: Option<&[String]>,
        thresholds: Thresholds,
    ) -> Result<Self, CompareError> {
        if records.len() < 2 {
            return Err(CompareError::TooFewRecords(records.len()));
        }

        let selected: Vec<&RfpRecord> = match selection {
            Some(names) => records
                .iter()
                .filter(|r| names.iter().any(|n| n == &r.rfp_file))
                .collect(),
            None => records.iter().collect(),
        };
        if selected.is_empty() {
            return Err(CompareError::EmptySelection);
        }

        let summaries = selected.iter().map(|r| summarize(r)).collect();

        let budgets = selected
            .iter()
            .map(|r| BudgetRow {
                rfp_file: r.rfp_file.clone(),
                budget: r.cost_estimate.amount,
                flag: if r.cost_estimate.amount > thresholds.budget {
                    BudgetFlag::High
                } else {
                    BudgetFlag::Normal
                },
            })
            .collect();

        let mut phases = Vec::new();
        let mut alerts = Vec::new();
        for r in &selected {
            for p in &r.timeline.phases {
                let long = p.duration_days > thresholds.phase_days;
                phases.push(PhaseRow {
                    rfp_file: r.rfp_file.clone(),
                    phase: p.name().to_string(),
                    duration_days: p.duration_days,
                    estimated_budget: p.estimated_budget,
                    flag: if long { PhaseFlag::Long } else { PhaseFlag::Normal },
                });
                if long || p.estimated_budget > thresholds.budget {
                    alerts.push(Alert {
                        rfp_file: r.rfp_file.clone(),
                        phase: p.name().to_string(),
                        duration_days: p.duration_days,
                        estimated_budget: p.estimated_budget,
                    });
                }
            }
        }

        let skills = frequencies(
            selected
                .iter()
                .flat_map(|r| r.required_skills.iter().map(String::as_str)),
        );
        let roles = frequencies(selected.iter().flat_map(|r| {
            r.tasks_roles
                .iter()
                .map(|t| t.role.as_deref().unwrap_or(NOT_AVAILABLE))
        }));
        let project_types = frequencies(
            selected
                .iter()
                .map(|r| r.project_type.as_deref().unwrap_or(NOT_AVAILABLE)),
        );

        Ok(Self {
            metrics: metrics(&selected),
            summaries,
            budgets,
            phases,
            skills,
            roles,
            project_types,
            alerts,
        })
    }
}

fn summarize(r: &RfpRecord) -> RfpSummary {
    RfpSummary {
        rfp_file: r.rfp_file.clone(),
        project_type: r
            .project_type
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        budget: r.cost_estimate.amount,
        total_duration_days: r.timeline.total_duration_days,
        skill_count: r.required_skills.len(),
        role_count: r.tasks_roles.len(),
    }
}

fn metrics(records: &[&RfpRecord]) -> Metrics {
    let total_days: u64 = records.iter().map(|r| r.timeline.total_duration_days).sum();
    let average = total_days as f64 / records.len().max(1) as f64;
    let distinct: HashSet<&str> = records
        .iter()
        .flat_map(|r| r.required_skills.iter().map(String::as_str))
        .collect();

    Metrics {
        total_budget: records.iter().map(|r| r.cost_estimate.amount).sum(),
        average_duration_days: (average * 10.0).round() / 10.0,
        total_roles: records.iter().map(|r| r.tasks_roles.len()).sum(),
        distinct_skills: distinct.len(),
    }
}

/// Occurrence counts, most frequent first, then by name.
fn frequencies<'a>(names: impl Iterator<Item = &'a str>) -> Vec<Frequency> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    let mut out: Vec<Frequency> = counts
        .into_iter()
        .map(|(name, count)| Frequency {
            name: name.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the BTreeMap's name order within equal counts.
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use serde_json::json;

    fn record(file: &str, body: serde_json::Value) -> RfpRecord {
        assemble(file, &body.to_string()).into_record().unwrap()
    }

    fn fixtures() -> Vec<RfpRecord> {
        vec![
            record(
                "portal.txt",
                json!({
                    "Project_Type": "Web Portal",
                    "Required_Skills": ["React", "Node.js", "AWS"],
                    "Tasks_Roles": [
                        {"Role": "Developer", "Tasks": ["build"]},
                        {"Role": "Tester", "Tasks": ["test"]}
                    ],
                    "Timeline": {"Phases": [
                        {"Phase": "Design", "Duration_Days": 10},
                        {"Phase": "Build", "Duration_Days": 45}
                    ]},
                    "Cost_Estimate": {"Amount": 2500000}
                }),
            ),
            record(
                "mobile.txt",
                json!({
                    "Project_Type": "Mobile App",
                    "Required_Skills": ["Kotlin", "AWS"],
                    "Tasks_Roles": [{"Role": "Developer", "Tasks": ["ship"]}],
                    "Timeline": {"Phases": [{"Phase": "MVP", "Duration_Days": 20}]},
                    "Cost_Estimate": {"Amount": 800000}
                }),
            ),
            record(
                "crm.txt",
                json!({
                    "Project_Type": "Web Portal",
                    "Required_Skills": ["AWS", "Salesforce"],
                    "Timeline": {"Phases": [{"Phase": "Rollout", "Duration_Days": 5}]}
                }),
            ),
        ]
    }

    #[test]
    fn fewer_than_two_records() {
        let one = &fixtures()[..1];
        assert_eq!(
            ComparisonReport::build(one, None, Thresholds::default()),
            Err(CompareError::TooFewRecords(1))
        );
        assert_eq!(
            ComparisonReport::build(&[], None, Thresholds::default()),
            Err(CompareError::TooFewRecords(0))
        );
    }

    #[test]
    fn metrics_cover_selected_records() {
        let report = ComparisonReport::build(&fixtures(), None, Thresholds::default()).unwrap();
        let m = &report.metrics;
        // crm.txt has no amount and gets the placeholder.
        assert_eq!(m.total_budget, 2_500_000.0 + 800_000.0 + 1_000_000.0);
        // (55 + 20 + 5) / 3 = 26.666...
        assert_eq!(m.average_duration_days, 26.7);
        assert_eq!(m.total_roles, 3);
        assert_eq!(m.distinct_skills, 5);
    }

    #[test]
    fn budget_and_phase_flags() {
        let report = ComparisonReport::build(&fixtures(), None, Thresholds::default()).unwrap();

        let flags: Vec<BudgetFlag> = report.budgets.iter().map(|b| b.flag).collect();
        // Exactly at the threshold is not High.
        assert_eq!(
            flags,
            vec![BudgetFlag::High, BudgetFlag::Normal, BudgetFlag::Normal]
        );

        let long: Vec<&str> = report
            .phases
            .iter()
            .filter(|p| p.flag == PhaseFlag::Long)
            .map(|p| p.phase.as_str())
            .collect();
        assert_eq!(long, vec!["Build"]);
        assert_eq!(report.phases.len(), 4);
    }

    #[test]
    fn alerts_for_long_or_expensive_phases() {
        let report = ComparisonReport::build(&fixtures(), None, Thresholds::default()).unwrap();
        // Build: 45 days and 2,045,454.55 budget. Design's share is 454,545.45.
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].phase, "Build");
        assert_eq!(
            report.alerts[0].to_string(),
            "portal.txt → Build (Duration: 45, Budget: 2045454.55)"
        );

        let strict = Thresholds {
            budget: 100_000.0,
            phase_days: 30,
        };
        let report = ComparisonReport::build(&fixtures(), None, strict).unwrap();
        assert_eq!(report.alerts.len(), 4);
    }

    #[test]
    fn frequencies_sorted_by_count_then_name() {
        let report = ComparisonReport::build(&fixtures(), None, Thresholds::default()).unwrap();

        assert_eq!(
            report.skills[0],
            Frequency {
                name: "AWS".into(),
                count: 3
            }
        );
        let rest: Vec<&str> = report.skills[1..].iter().map(|f| f.name.as_str()).collect();
        assert_eq!(rest, vec!["Kotlin", "Node.js", "React", "Salesforce"]);

        assert_eq!(report.roles[0].name, "Developer");
        assert_eq!(report.roles[0].count, 2);
        assert_eq!(report.project_types[0].name, "Web Portal");
        assert_eq!(report.project_types[0].count, 2);
    }

    #[test]
    fn selection_restricts_report() {
        let select = vec!["mobile.txt".to_string(), "crm.txt".to_string()];
        let report =
            ComparisonReport::build(&fixtures(), Some(&select), Thresholds::default()).unwrap();

        let files: Vec<&str> = report.summaries.iter().map(|s| s.rfp_file.as_str()).collect();
        assert_eq!(files, vec!["mobile.txt", "crm.txt"]);
        assert!(report.alerts.is_empty());
        assert_eq!(report.metrics.average_duration_days, 12.5);
    }

    #[test]
    fn selection_matching_nothing() {
        let select = vec!["missing.txt".to_string()];
        assert_eq!(
            ComparisonReport::build(&fixtures(), Some(&select), Thresholds::default()),
            Err(CompareError::EmptySelection)
        );
    }

    #[test]
    fn summary_defaults_project_type() {
        let mut records = fixtures();
        records[1].project_type = None;
        let report = ComparisonReport::build(&records, None, Thresholds::default()).unwrap();
        assert_eq!(report.summaries[1].project_type, NOT_AVAILABLE);
        assert_eq!(report.summaries[0].skill_count, 3);
        assert_eq!(report.summaries[0].role_count, 2);
    }
}
