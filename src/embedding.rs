//! Embedding provider abstraction and implementations.
//!
//! Defines the [`Embedder`] trait and concrete implementations:
//! - **[`DisabledEmbedder`]**: returns errors; used when embeddings are not configured.
//! - **[`OpenAIEmbedder`]**: calls `POST /v1/embeddings`.
//! - **[`HuggingFaceEmbedder`]**: calls the Hugging Face feature-extraction
//!   inference endpoint (default model `sentence-transformers/all-MiniLM-L6-v2`).
//!
//! Both remote providers batch inputs by `embedding.batch_size` and share
//! the retry policy in [`crate::transport`].

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::EmbeddingConfig;
use crate::transport::{api_key_from_env, JsonTransport};

pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_HF_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const HF_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Whether [`embed`](Embedder::embed) can succeed at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single query text.
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
}

// ============ Disabled ============

pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ OpenAI ============

pub struct OpenAIEmbedder {
    endpoint: String,
    model: String,
    batch_size: usize,
    transport: JsonTransport,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let key_var = config.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY");
        let transport = JsonTransport::new(
            "OpenAI",
            api_key_from_env(key_var)?,
            config.timeout_secs,
            config.max_retries,
        )?;
        let base = config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
        Ok(Self {
            endpoint: format!("{}/embeddings", base.trim_end_matches('/')),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            batch_size: config.batch_size,
            transport,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            let body = json!({ "model": self.model, "input": batch });
            let response = self.transport.post(&self.endpoint, &body).await?;
            out.extend(parse_openai_response(&response)?);
        }
        Ok(out)
    }
}

/// Extract `data[].embedding`, ordered by `index` when present.
fn parse_openai_response(json: &Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(Value::as_u64)
            .map(|i| i as usize)
            .unwrap_or(position);
        indexed.push((index, to_vector(embedding)?));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Hugging Face ============

pub struct HuggingFaceEmbedder {
    endpoint: String,
    model: String,
    batch_size: usize,
    transport: JsonTransport,
}

impl HuggingFaceEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let key_var = config.api_key_env.as_deref().unwrap_or("HF_TOKEN");
        let transport = JsonTransport::new(
            "Hugging Face",
            api_key_from_env(key_var)?,
            config.timeout_secs,
            config.max_retries,
        )?;
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_HF_MODEL.to_string());
        let base = config.base_url.as_deref().unwrap_or(HF_BASE_URL);
        Ok(Self {
            endpoint: format!(
                "{}/{}/pipeline/feature-extraction",
                base.trim_end_matches('/'),
                model
            ),
            model,
            batch_size: config.batch_size,
            transport,
        })
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            let body = json!({ "inputs": batch });
            let response = self.transport.post(&self.endpoint, &body).await?;
            let vectors = parse_feature_extraction(&response)?;
            if vectors.len() != batch.len() {
                bail!(
                    "Hugging Face returned {} embeddings for {} inputs",
                    vectors.len(),
                    batch.len()
                );
            }
            out.extend(vectors);
        }
        Ok(out)
    }
}

/// Feature-extraction output is one entry per input: either a pooled
/// sentence vector or a matrix of token vectors, which is mean-pooled.
fn parse_feature_extraction(json: &Value) -> Result<Vec<Vec<f32>>> {
    let items = json
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Invalid Hugging Face response: expected an array"))?;

    items
        .iter()
        .map(|item| match item.as_array().and_then(|a| a.first()) {
            Some(Value::Array(_)) => mean_pool(item),
            _ => to_vector(item),
        })
        .collect()
}

fn mean_pool(matrix: &Value) -> Result<Vec<f32>> {
    let rows: Vec<Vec<f32>> = matrix
        .as_array()
        .into_iter()
        .flatten()
        .map(to_vector)
        .collect::<Result<_>>()?;

    let dims = rows.first().map(Vec::len).unwrap_or(0);
    if dims == 0 || rows.iter().any(|r| r.len() != dims) {
        bail!("Invalid Hugging Face response: ragged token embeddings");
    }

    let mut pooled = vec![0.0f32; dims];
    for row in &rows {
        for (acc, x) in pooled.iter_mut().zip(row) {
            *acc += x;
        }
    }
    let n = rows.len() as f32;
    pooled.iter_mut().for_each(|x| *x /= n);
    Ok(pooled)
}

fn to_vector(value: &Value) -> Result<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Invalid embedding: expected an array of numbers"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow::anyhow!("Invalid embedding: non-numeric component"))
        })
        .collect()
}

/// Create the [`Embedder`] named by `embedding.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | `"huggingface"` | [`HuggingFaceEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledEmbedder)),
        "openai" => Ok(Box::new(OpenAIEmbedder::new(config)?)),
        "huggingface" => Ok(Box::new(HuggingFaceEmbedder::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_response_is_ordered_by_index() {
        let json = json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        assert_eq!(
            parse_openai_response(&json).unwrap(),
            vec![vec![1.0, 0.0], vec![0.0, 1.0]]
        );
    }

    #[test]
    fn pooled_feature_extraction() {
        let json = json!([[0.5, 0.25], [1.0, 2.0]]);
        assert_eq!(
            parse_feature_extraction(&json).unwrap(),
            vec![vec![0.5, 0.25], vec![1.0, 2.0]]
        );
    }

    #[test]
    fn token_level_output_is_mean_pooled() {
        let json = json!([[[1.0, 2.0], [3.0, 4.0]]]);
        assert_eq!(parse_feature_extraction(&json).unwrap(), vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn malformed_vectors_are_rejected() {
        assert!(parse_feature_extraction(&json!({"error": "loading"})).is_err());
        assert!(parse_feature_extraction(&json!([["a", "b"]])).is_err());
        assert!(parse_feature_extraction(&json!([[[1.0], [1.0, 2.0]]])).is_err());
    }

    #[test]
    fn huggingface_endpoint_includes_model() {
        let config = EmbeddingConfig {
            provider: "huggingface".into(),
            api_key_env: Some(String::new()),
            ..EmbeddingConfig::default()
        };
        let embedder = HuggingFaceEmbedder::new(&config).unwrap();
        assert_eq!(embedder.model_name(), DEFAULT_HF_MODEL);
        assert!(embedder
            .endpoint
            .ends_with("/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction"));
    }

    #[tokio::test]
    async fn disabled_embedder_errors() {
        let embedder = create_embedder(&EmbeddingConfig::default()).unwrap();
        assert!(!embedder.is_enabled());
        assert!(embed_query(embedder.as_ref(), "hello").await.is_err());
    }
}
