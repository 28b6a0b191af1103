//! Document intake: turn file and directory arguments into named texts.
//!
//! Files are read as-is; directories are walked and filtered by
//! `[intake].include_globs` / `exclude_globs`, with `.git`, `target` and
//! `node_modules` always excluded. Text is decoded as UTF-8 with invalid
//! sequences dropped.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::IntakeConfig;

/// Characters replaced by `_` in document identifiers.
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("input path does not exist: {0}")]
    Missing(PathBuf),
    #[error("no documents found in {0}")]
    Empty(String),
    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        source: globset::Error,
    },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A named document ready for analysis or retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Sanitized, batch-unique identifier; becomes `RFP_File`.
    pub file_name: String,
    pub text: String,
    pub path: PathBuf,
}

/// Collect documents from `inputs`, ordered by identifier.
pub fn collect_documents(
    inputs: &[PathBuf],
    config: &IntakeConfig,
) -> Result<Vec<Document>, IntakeError> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&default_excludes)?;

    let mut paths = Vec::new();
    for input in inputs {
        if !input.exists() {
            return Err(IntakeError::Missing(input.clone()));
        }
        if input.is_file() {
            paths.push(input.clone());
            continue;
        }

        let walker = WalkDir::new(input)
            .follow_links(config.follow_symlinks)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|source| IntakeError::Walk {
                path: input.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(input).unwrap_or(path);
            let rel_str = relative.to_string_lossy();

            if exclude_set.is_match(rel_str.as_ref()) || !include_set.is_match(rel_str.as_ref()) {
                continue;
            }
            paths.push(path.to_path_buf());
        }
    }

    if paths.is_empty() {
        let names: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
        return Err(IntakeError::Empty(names.join(", ")));
    }

    let mut documents = Vec::with_capacity(paths.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for path in paths {
        let bytes = std::fs::read(&path).map_err(|source| IntakeError::Read {
            path: path.clone(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let file_name = unique_name(&sanitize_file_name(&name), &mut seen);
        tracing::debug!(path = %path.display(), file_name = %file_name, bytes = bytes.len(), "read document");
        documents.push(Document {
            file_name,
            text: decode_lossy(&bytes),
            path,
        });
    }

    documents.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(documents)
}

/// Replace characters that are unsafe in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// UTF-8 decode, dropping invalid sequences rather than substituting them.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace(char::REPLACEMENT_CHARACTER, "")
}

/// `name`, or `stem-N.ext` if `name` was already taken in this batch.
fn unique_name(name: &str, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(name.to_string()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return name.to_string();
    }

    let n = *count;
    let candidate = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", name, n),
    };
    // A generated name may collide with a real one later in the batch.
    unique_name(&candidate, seen)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, IntakeError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| IntakeError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| IntakeError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

/// Documents given inline (server requests), with the same naming rules.
pub fn inline_documents(items: Vec<(String, String)>) -> Vec<Document> {
    let mut seen = HashMap::new();
    items
        .into_iter()
        .map(|(name, text)| Document {
            file_name: unique_name(&sanitize_file_name(&name), &mut seen),
            text,
            path: PathBuf::from(name),
        })
        .collect()
}
