//! Text generation backends.
//!
//! Defines the [`TextGenerator`] trait and its implementations:
//! - **[`DisabledGenerator`]**: always errors; used when `llm.provider = "disabled"`.
//! - **[`ChatCompletionsGenerator`]**: calls an OpenAI-compatible
//!   `POST {base_url}/chat/completions` endpoint (Groq by default).
//!
//! Use [`create_generator`] to build the configured backend:
//!
//! ```rust,no_run
//! # use rfp_analyzer::config::Config;
//! # use rfp_analyzer::llm::create_generator;
//! # async fn example(config: &Config) -> anyhow::Result<()> {
//! let generator = create_generator(&config.llm)?;
//! let reply = generator.generate("Say hello", 16).await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::LlmConfig;
use crate::transport::{api_key_from_env, JsonTransport};

/// A model that turns a single-turn prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`, limited to `max_tokens`.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

// ============ Disabled ============

pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
        bail!("Text generation is disabled (llm.provider = \"disabled\")")
    }
}

// ============ Chat completions ============

pub struct ChatCompletionsGenerator {
    endpoint: String,
    model: String,
    transport: JsonTransport,
}

impl ChatCompletionsGenerator {
    /// # Errors
    ///
    /// Fails if `llm.api_key_env` names a variable that is not set.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = api_key_from_env(&config.api_key_env)?;
        let transport =
            JsonTransport::new("LLM", api_key, config.timeout_secs, config.max_retries)?;
        Ok(Self {
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            transport,
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max_tokens,
        });

        tracing::debug!(model = %self.model, max_tokens, "chat completion request");
        let response = self.transport.post(&self.endpoint, &body).await?;
        parse_completion(&response)
    }
}

/// Extract `choices[0].message.content`.
fn parse_completion(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid completion response: missing choices[0].message.content"))
}

/// Create the [`TextGenerator`] named by `llm.provider`.
///
/// | Config Value | Generator |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledGenerator`] |
/// | `"openai-compatible"` | [`ChatCompletionsGenerator`] |
pub fn create_generator(config: &LlmConfig) -> Result<Box<dyn TextGenerator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "openai-compatible" => Ok(Box::new(ChatCompletionsGenerator::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_content_is_extracted() {
        let json = json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"a\": 1}"}}]
        });
        assert_eq!(parse_completion(&json).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(parse_completion(&json!({"choices": []})).is_err());
        assert!(parse_completion(&json!({"error": "x"})).is_err());
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:1234/v1/".into(),
            api_key_env: String::new(),
            ..LlmConfig::default()
        };
        let generator = ChatCompletionsGenerator::new(&config).unwrap();
        assert_eq!(generator.endpoint, "http://localhost:1234/v1/chat/completions");
        assert_eq!(generator.model_name(), "llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn disabled_generator_errors() {
        let generator = create_generator(&LlmConfig {
            provider: "disabled".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        let err = generator.generate("hi", 10).await.unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }
}
