//! # RFP Analyzer CLI (`rfpa`)
//!
//! ## Usage
//!
//! ```bash
//! rfpa --config ./config/rfpa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rfpa analyze <paths>...` | Extract structured summaries and export them as JSON |
//! | `rfpa compare <analysis.json>` | Compare analyzed RFPs: budgets, phases, skills, alerts |
//! | `rfpa gaps <analysis.json>` | Check each RFP's skills against the internal team |
//! | `rfpa ask "<question>" <paths>...` | Answer a question from the documents' text |
//! | `rfpa serve` | Start the HTTP API |
//!
//! Logs go to stderr and are filtered by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rfp_analyzer::{analyze, config, report, retriever, server, skills};

/// RFP Analyzer: structured extraction and comparison of RFP documents.
#[derive(Parser)]
#[command(
    name = "rfpa",
    about = "RFP Analyzer: structured extraction and comparison of RFP documents",
    version,
    long_about = "RFP Analyzer sends each RFP document to an LLM, repairs the reply into a \
    consistent structured record (budgets, phases, dates, roles, skills), and compares the \
    results across documents and against the internal team's skills."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rfpa.toml`; built-in defaults are used if that
    /// file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze RFP documents.
    ///
    /// Each file (or every matching file under a directory) is sent to the
    /// LLM once. Results are exported as a JSON array; documents that fail
    /// are recorded with their error and do not stop the batch.
    Analyze {
        /// Files or directories to analyze.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write the export here instead of `[export]` output_dir/base_name.
        #[arg(long, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Print the export to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Compare analyzed RFPs from an export file.
    Compare {
        /// JSON export written by `rfpa analyze`.
        analysis: PathBuf,

        /// Restrict the comparison to these `RFP_File` names (repeatable).
        #[arg(long = "select")]
        select: Vec<String>,
    },

    /// Show covered and missing skills for each analyzed RFP.
    Gaps {
        /// JSON export written by `rfpa analyze`.
        analysis: PathBuf,
    },

    /// Ask a question answered only from the documents' text.
    ///
    /// Requires an embedding provider in `[embedding]`.
    Ask {
        question: String,

        /// Files or directories to search.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            paths,
            output,
            stdout,
        } => {
            analyze::run_analyze(&cfg, &paths, output.as_deref(), stdout).await?;
        }
        Commands::Compare { analysis, select } => {
            report::run_compare(&cfg, &analysis, &select)?;
        }
        Commands::Gaps { analysis } => {
            skills::run_gaps(&cfg, &analysis)?;
        }
        Commands::Ask { question, paths } => {
            retriever::run_ask(&cfg, &question, &paths).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
