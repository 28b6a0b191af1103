//! Budget reconciliation.
//!
//! [`fix_budgets`] turns an [`RfpDraft`] into an [`RfpRecord`] whose
//! timeline and cost estimate are internally consistent:
//!
//! 1. A missing timeline or phase list becomes empty.
//! 2. Each phase gets an integer `Duration_Days >= 1`.
//! 3. Phase dates are normalized (see [`crate::dates`]).
//! 4. A missing, zero or negative total budget becomes [`PLACEHOLDER_BUDGET`].
//! 5. Total duration is the sum of phase durations, floored at 1.
//! 6. Each phase receives `round(total * duration / total_duration, 2)`.
//! 7. `Cost_Estimate` is rewritten as `{amount, "INR", estimated: true}`.
//!
//! Reconciliation never fails; bad input is repaired with these defaults.

use serde_json::Value;

use crate::dates::normalize_dates;
use crate::models::{CostEstimate, CostEstimateDraft, Phase, RfpDraft, RfpRecord, Timeline};

/// Total budget substituted when the model gives no usable amount.
pub const PLACEHOLDER_BUDGET: f64 = 1_000_000.0;

/// Currency every reconciled estimate is reported in.
pub const BUDGET_CURRENCY: &str = "INR";

/// Duration given to a phase with a missing or non-numeric duration.
pub const DEFAULT_PHASE_DAYS: u32 = 1;

/// Reconcile a draft into a record. See the module docs for the rules.
///
/// `rfp_file` is taken from the draft (empty if absent); the assembler
/// overwrites it with the document identifier.
pub fn fix_budgets(draft: RfpDraft) -> RfpRecord {
    let mut drafts = draft
        .timeline
        .and_then(|timeline| timeline.phases)
        .unwrap_or_default();

    let amount = total_budget(draft.cost_estimate.as_ref());
    normalize_dates(&mut drafts);

    let durations: Vec<u32> = drafts
        .iter()
        .map(|p| coerce_duration(p.duration_days.as_ref()))
        .collect();
    let total_days = durations.iter().map(|&d| u64::from(d)).sum::<u64>().max(1);

    let phases: Vec<Phase> = drafts
        .into_iter()
        .zip(durations)
        .map(|(p, days)| Phase {
            phase: p.phase,
            start_date: p.start_date,
            end_date: p.end_date,
            duration_days: days,
            estimated_budget: allocate(amount, days, total_days),
            extra: p.extra,
        })
        .collect();

    tracing::debug!(
        phases = phases.len(),
        total_days,
        amount,
        "reconciled budget"
    );

    RfpRecord {
        project_type: draft.project_type,
        scope: draft.scope,
        deliverables: draft.deliverables,
        required_skills: draft.required_skills,
        tasks_roles: draft.tasks_roles,
        timeline: Timeline {
            phases,
            total_duration_days: total_days,
        },
        cost_estimate: CostEstimate {
            amount,
            currency: BUDGET_CURRENCY.to_string(),
            estimated: true,
        },
        rfp_file: draft.rfp_file.unwrap_or_default(),
        extra: draft.extra,
    }
}

/// The model's amount if it is a positive number, else the placeholder.
fn total_budget(cost: Option<&CostEstimateDraft>) -> f64 {
    cost.and_then(|c| c.amount.as_ref())
        .and_then(Value::as_f64)
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .unwrap_or(PLACEHOLDER_BUDGET)
}

/// JSON numbers are rounded and clamped to `>= 1`; anything else is 1.
fn coerce_duration(raw: Option<&Value>) -> u32 {
    match raw.and_then(Value::as_f64) {
        Some(days) if days.is_finite() => days.round().clamp(1.0, f64::from(u32::MAX)) as u32,
        _ => DEFAULT_PHASE_DAYS,
    }
}

/// Share of `amount` proportional to `days / total_days`, to two decimals.
fn allocate(amount: f64, days: u32, total_days: u64) -> f64 {
    round_cents(amount * (f64::from(days) / total_days as f64))
}

/// Round half away from zero. Values too large to scale are returned as-is.
fn round_cents(value: f64) -> f64 {
    let cents = value * 100.0;
    if !cents.is_finite() {
        return value;
    }
    cents.round() / 100.0
}
