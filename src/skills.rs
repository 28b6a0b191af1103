//! Internal team skills file and the `rfpa gaps` command.

use anyhow::{Context, Result};
use std::path::Path;

use rfp_analyzer_core::skills::{skill_gap, InternalSkills};

use crate::config::Config;
use crate::export::load_records;

/// Load the internal skills JSON (`{"Category": ["Skill", ...], ...}`).
pub fn load_internal_skills(path: &Path) -> Result<InternalSkills> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read internal skills file: {}", path.display()))?;
    let skills: InternalSkills = serde_json::from_str(&content).with_context(|| {
        format!(
            "Internal skills file must map categories to skill lists: {}",
            path.display()
        )
    })?;
    tracing::debug!(categories = skills.len(), "loaded internal skills");
    Ok(skills)
}

/// CLI entry point for `rfpa gaps`: covered and missing skills per RFP.
pub fn run_gaps(config: &Config, analysis: &Path) -> Result<()> {
    let internal = load_internal_skills(&config.skills.path)?;
    let records = load_records(analysis)?;

    if records.is_empty() {
        println!("No analyzed RFPs in {}.", analysis.display());
        return Ok(());
    }

    for record in &records {
        let gap = skill_gap(&record.required_skills, &internal);
        println!("{}", record.rfp_file);
        println!("  covered ({}): {}", gap.covered.len(), list(&gap.covered));
        println!("  missing ({}): {}", gap.missing.len(), list(&gap.missing));
    }
    Ok(())
}

fn list(skills: &[String]) -> String {
    if skills.is_empty() {
        "-".to_string()
    } else {
        skills.join(", ")
    }
}
