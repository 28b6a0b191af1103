//! # RFP Analyzer Core
//!
//! Pure, synchronous logic for RFP Analyzer: the record model, the
//! extraction-normalization pipeline that turns free-text model output into
//! a reconciled [`models::RfpRecord`], and the aggregates built on top of
//! reconciled records (skill gaps, multi-RFP comparison, retrieval index).
//!
//! This crate performs no network or filesystem I/O and has no async
//! runtime dependency. Text generation, embeddings and document intake live
//! in the `rfp-analyzer` app crate.
//!
//! ## Pipeline
//!
//! ```text
//! model output ──▶ parse::extract_json ──▶ RfpDraft
//!                        │                    │
//!                        ▼                    ▼
//!              ExtractionFailure      budget::fix_budgets ──▶ dates::normalize_dates
//!                                             │
//!                                             ▼
//!                               assemble (role filter, skill split)
//!                                             │
//!                                             ▼
//!                                         RfpRecord
//! ```

pub mod assemble;
pub mod budget;
pub mod chunk;
pub mod compare;
pub mod dates;
pub mod index;
pub mod models;
pub mod parse;
pub mod skills;
