//! Text generation backend.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::metrics::{GENERATION_FAILURES, GENERATION_LATENCY};
use crate::models::{GenerateRequest, GenerateResponse};

/// Continues a prompt with up to `max_tokens` generated tokens.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError>;
}

/// TextSynth completions client.
pub struct TextSynthClient {
    client: reqwest::Client,
    url: String,
    bearer_token: String,
    timeout: Duration,
}

impl TextSynthClient {
    pub fn new(client: reqwest::Client, url: String, bearer_token: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            bearer_token,
            timeout,
        }
    }

    async fn call(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            prompt: prompt.to_string(),
            max_tokens,
        };

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(&self.bearer_token)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %body, "generation backend returned non-success status");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let story: GenerateResponse = res.json().await?;
        if story.text.is_empty() {
            return Err(GenerationError::EmptyText);
        }
        Ok(story.text)
    }
}

#[async_trait]
impl GenerationBackend for TextSynthClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let start_time = Instant::now();
        debug!(max_tokens, url = %self.url, "calling generation backend");

        let result = self.call(prompt, max_tokens).await;

        GENERATION_LATENCY.observe(start_time.elapsed().as_secs_f64());
        if let Err(e) = &result {
            GENERATION_FAILURES.inc();
            warn!(error = %e, "generation failed");
        }
        result
    }
}
