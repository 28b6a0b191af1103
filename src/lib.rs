//! # RFP Analyzer
//!
//! Turns free-text RFP (request for proposal) documents into structured,
//! internally consistent summaries using a hosted LLM, then compares them,
//! checks them against the team's skills, and answers questions over the
//! raw text.
//!
//! The extraction repair logic lives in the [`rfp_analyzer_core`] crate;
//! this crate adds the I/O around it: configuration, document intake, the
//! LLM and embedding HTTP clients, the CLI commands and the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │   Intake    │──▶│ analyze_rfp  │──▶│  core::assemble   │
//! │ files/dirs  │   │ (LLM client) │   │ parse+reconcile   │
//! └─────────────┘   └──────────────┘   └─────────┬─────────┘
//!                                                │ RfpRecord
//!                      ┌──────────────┬──────────┼──────────┐
//!                      ▼              ▼          ▼          ▼
//!                 ┌─────────┐   ┌──────────┐ ┌────────┐ ┌────────┐
//!                 │ export  │   │ compare  │ │  gaps  │ │  ask   │
//!                 │  JSON   │   │ report   │ │ skills │ │  RAG   │
//!                 └─────────┘   └──────────┘ └────────┘ └────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rfpa analyze ./rfps                       # analyze every .txt under ./rfps
//! rfpa compare data/processed_json/multi_rfp_analysis.json
//! rfpa gaps data/processed_json/multi_rfp_analysis.json
//! rfpa ask "What is the go-live date?" ./rfps
//! rfpa serve                                # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`intake`] | Reading and naming input documents |
//! | [`llm`] | Text generation client |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`transport`] | Retrying JSON HTTP transport |
//! | [`analyze`] | Single-document and batch analysis |
//! | [`export`] | JSON export and reload |
//! | [`report`] | Multi-RFP comparison output |
//! | [`skills`] | Skill-gap command |
//! | [`retriever`] | Retrieval-augmented Q&A |
//! | [`server`] | HTTP server |

pub mod analyze;
pub mod config;
pub mod embedding;
pub mod export;
pub mod intake;
pub mod llm;
pub mod report;
pub mod retriever;
pub mod server;
pub mod skills;
pub mod transport;
