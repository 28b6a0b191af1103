//! Text rendering of the multi-RFP comparison for `rfpa compare`.

use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

use rfp_analyzer_core::compare::{CompareError, ComparisonReport, Frequency};

use crate::config::Config;
use crate::export::load_records;

/// CLI entry point for `rfpa compare`.
///
/// Fewer than two records or an empty selection prints a notice instead of
/// failing.
pub fn run_compare(config: &Config, analysis: &Path, select: &[String]) -> Result<()> {
    let records = load_records(analysis)?;
    let selection = (!select.is_empty()).then_some(select);

    match ComparisonReport::build(&records, selection, config.alerts.thresholds()) {
        Ok(report) => print!("{}", render(&report)),
        Err(CompareError::TooFewRecords(n)) => {
            println!(
                "Comparison needs at least 2 analyzed RFPs; {} has {}.",
                analysis.display(),
                n
            );
        }
        Err(CompareError::EmptySelection) => {
            println!("No RFPs match the selection: {}", select.join(", "));
        }
    }
    Ok(())
}

/// Render the report as aligned text tables.
pub fn render(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let m = &report.metrics;

    let _ = writeln!(out, "== Overview ==");
    let _ = writeln!(out, "Total budget (INR):      {:.2}", m.total_budget);
    let _ = writeln!(out, "Average duration (days): {:.1}", m.average_duration_days);
    let _ = writeln!(out, "Total roles:             {}", m.total_roles);
    let _ = writeln!(out, "Distinct skills:         {}", m.distinct_skills);

    let _ = writeln!(out, "\n== Executive summary ==");
    let rows: Vec<Vec<String>> = report
        .summaries
        .iter()
        .map(|s| {
            vec![
                s.rfp_file.clone(),
                s.project_type.clone(),
                format!("{:.2}", s.budget),
                s.total_duration_days.to_string(),
                s.skill_count.to_string(),
                s.role_count.to_string(),
            ]
        })
        .collect();
    table(
        &mut out,
        &["RFP", "Project type", "Budget", "Days", "Skills", "Roles"],
        &rows,
    );

    let _ = writeln!(out, "\n== Budgets ==");
    let rows: Vec<Vec<String>> = report
        .budgets
        .iter()
        .map(|b| vec![b.rfp_file.clone(), format!("{:.2}", b.budget), b.flag.to_string()])
        .collect();
    table(&mut out, &["RFP", "Budget", "Flag"], &rows);

    let _ = writeln!(out, "\n== Phases ==");
    let rows: Vec<Vec<String>> = report
        .phases
        .iter()
        .map(|p| {
            vec![
                p.rfp_file.clone(),
                p.phase.clone(),
                p.duration_days.to_string(),
                format!("{:.2}", p.estimated_budget),
                p.flag.to_string(),
            ]
        })
        .collect();
    table(&mut out, &["RFP", "Phase", "Days", "Budget", "Flag"], &rows);

    frequency_table(&mut out, "Skills", "Skill", &report.skills);
    frequency_table(&mut out, "Roles", "Role", &report.roles);
    frequency_table(&mut out, "Project types", "Project type", &report.project_types);

    let _ = writeln!(out, "\n== Alerts ==");
    if report.alerts.is_empty() {
        let _ = writeln!(out, "No critical alerts detected.");
    }
    for alert in &report.alerts {
        let _ = writeln!(out, "! {}", alert);
    }

    out
}

fn frequency_table(out: &mut String, title: &str, label: &str, freqs: &[Frequency]) {
    let _ = writeln!(out, "\n== {} ==", title);
    let rows: Vec<Vec<String>> = freqs
        .iter()
        .map(|f| vec![f.name.clone(), f.count.to_string()])
        .collect();
    table(out, &[label, "Count"], &rows);
}

fn table(out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        let _ = writeln!(out, "(none)");
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let _ = writeln!(out, "{}", line(headers.to_vec()));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in rows {
        let _ = writeln!(out, "{}", line(row.iter().map(String::as_str).collect()));
    }
}
