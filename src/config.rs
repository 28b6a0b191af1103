use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use rfp_analyzer_core::assemble::EXTRACTION_MAX_TOKENS;
use rfp_analyzer_core::chunk::DEFAULT_CHUNK_WORDS;
use rfp_analyzer_core::compare::Thresholds;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// All-defaults configuration, used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            intake: IntakeConfig::default(),
            skills: SkillsConfig::default(),
            export: ExportConfig::default(),
            alerts: AlertsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

// ============ [llm] ============

/// Chat-completions endpoint used for extraction and Q&A.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// `openai-compatible` or `disabled`.
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Name of the environment variable holding the API key. Empty means
    /// requests are sent without an `Authorization` header.
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,
    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_llm_max_retries(),
            extraction_max_tokens: default_extraction_max_tokens(),
            answer_max_tokens: default_answer_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_llm_provider() -> String {
    "openai-compatible".to_string()
}
fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_llm_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_llm_max_retries() -> u32 {
    2
}
fn default_extraction_max_tokens() -> u32 {
    EXTRACTION_MAX_TOKENS
}
fn default_answer_max_tokens() -> u32 {
    400
}

// ============ [embedding] ============

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `disabled`, `openai` or `huggingface`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Overrides the provider's default API key variable.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            api_key_env: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

// ============ [retrieval] ============

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_words: default_chunk_words(),
            top_k: default_top_k(),
        }
    }
}

fn default_chunk_words() -> usize {
    DEFAULT_CHUNK_WORDS
}
fn default_top_k() -> usize {
    3
}

// ============ [intake] ============

/// Which files are picked up when a directory is given to `analyze`/`ask`.
#[derive(Debug, Deserialize, Clone)]
pub struct IntakeConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string()]
}

// ============ [skills] / [export] / [alerts] / [server] ============

#[derive(Debug, Deserialize, Clone)]
pub struct SkillsConfig {
    #[serde(default = "default_skills_path")]
    pub path: PathBuf,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            path: default_skills_path(),
        }
    }
}

fn default_skills_path() -> PathBuf {
    PathBuf::from("data/internal_team_skills.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_base_name")]
    pub base_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            base_name: default_base_name(),
        }
    }
}

impl ExportConfig {
    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.base_name))
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/processed_json")
}
fn default_base_name() -> String {
    "multi_rfp_analysis".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    #[serde(default = "default_budget_threshold")]
    pub budget_threshold: f64,
    #[serde(default = "default_phase_duration_days")]
    pub phase_duration_days: u32,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            budget_threshold: default_budget_threshold(),
            phase_duration_days: default_phase_duration_days(),
        }
    }
}

impl AlertsConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            budget: self.budget_threshold,
            phase_days: self.phase_duration_days,
        }
    }
}

fn default_budget_threshold() -> f64 {
    Thresholds::default().budget
}
fn default_phase_duration_days() -> u32 {
    Thresholds::default().phase_days
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

// ============ Loading ============

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    match config.llm.provider.as_str() {
        "disabled" | "openai-compatible" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai-compatible.",
            other
        ),
    }
    if config.llm.extraction_max_tokens == 0 || config.llm.answer_max_tokens == 0 {
        anyhow::bail!("llm token budgets must be > 0");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "huggingface" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or huggingface.",
            other
        ),
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    if config.retrieval.chunk_words == 0 {
        anyhow::bail!("retrieval.chunk_words must be > 0");
    }
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.intake.include_globs.is_empty() {
        anyhow::bail!("intake.include_globs must not be empty");
    }

    if !(config.alerts.budget_threshold.is_finite() && config.alerts.budget_threshold >= 0.0) {
        anyhow::bail!("alerts.budget_threshold must be a non-negative number");
    }

    if config.export.base_name.trim().is_empty() {
        anyhow::bail!("export.base_name must not be empty");
    }

    Ok(config)
}

/// Load `path`, or fall back to [`Config::minimal`] when the default path
/// is absent. An explicitly given path must exist.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
            } else {
                tracing::debug!(path = DEFAULT_CONFIG_PATH, "no config file, using defaults");
                Ok(Config::minimal())
            }
        }
    }
}

pub const DEFAULT_CONFIG_PATH: &str = "./config/rfpa.toml";
