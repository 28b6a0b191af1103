//! JSON-over-HTTP with retry, shared by the LLM and embedding clients.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors (including timeouts) → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use serde_json::Value;
use std::time::Duration;

/// A retrying JSON POST client for one service.
#[derive(Debug, Clone)]
pub struct JsonTransport {
    client: reqwest::Client,
    /// Short service label used in error messages (e.g. `"LLM"`).
    service: &'static str,
    api_key: Option<String>,
    max_retries: u32,
}

impl JsonTransport {
    pub fn new(
        service: &'static str,
        api_key: Option<String>,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            service,
            api_key,
            max_retries,
        })
    }

    /// POST `body` to `url` and return the parsed JSON response.
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff(attempt);
                tracing::debug!(
                    service = self.service,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "retrying"
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .json(body);
            if let Some(key) = &self.api_key {
                request = request.header("Authorization", format!("Bearer {}", key));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json().await?);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(service = self.service, %status, "transient API error");
                        last_err = Some(anyhow::anyhow!(
                            "{} API error {}: {}",
                            self.service,
                            status,
                            body_text
                        ));
                        continue;
                    }

                    bail!("{} API error {}: {}", self.service, status, body_text);
                }
                Err(e) => {
                    tracing::warn!(service = self.service, error = %e, "request failed");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| anyhow::anyhow!("{} request failed after retries", self.service)))
    }
}

/// Delay before retry `attempt` (1-based).
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1).min(5))
}

/// Read an API key from the environment variable `var`. An empty variable
/// name means no key is used.
pub fn api_key_from_env(var: &str) -> Result<Option<String>> {
    if var.is_empty() {
        return Ok(None);
    }
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(Some(key)),
        _ => bail!("{} environment variable not set", var),
    }
}
