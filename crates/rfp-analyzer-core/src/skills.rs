//! Skill normalization and skill-gap comparison.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

/// Internal team skills: category name to the skills it covers.
pub type InternalSkills = BTreeMap<String, Vec<String>>;

/// Split comma-joined skill entries into atomic skills.
///
/// Entries are split on `,` and trimmed; empty pieces are dropped and
/// case-insensitive duplicates keep their first spelling.
pub fn split_composite(skills: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .filter(|skill| seen.insert(skill.to_lowercase()))
        .map(String::from)
        .collect()
}

/// RFP skills partitioned by whether the internal team has them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkillGap {
    pub covered: Vec<String>,
    pub missing: Vec<String>,
}

/// Compare an RFP's skills against the internal roster.
///
/// Matching is case-insensitive against the flattened set of every
/// category's skills. Output keeps input order and spelling.
pub fn skill_gap(rfp_skills: &[String], internal: &InternalSkills) -> SkillGap {
    let roster: HashSet<String> = internal
        .values()
        .flatten()
        .map(|skill| skill.to_lowercase())
        .collect();

    let (covered, missing) = rfp_skills
        .iter()
        .cloned()
        .partition(|skill| roster.contains(&skill.to_lowercase()));

    SkillGap { covered, missing }
}
