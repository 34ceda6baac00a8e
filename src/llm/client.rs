use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};
use super::{ChatModel, Embedder};
use crate::config::{ModelConfig, OpenAiConfig, RequestConfig};
use crate::error::{LlmError, LlmResult};

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Exponential backoff before retry number `retry` (1-based), capped at [`MAX_BACKOFF_MS`].
fn backoff_delay(base_ms: u64, retry: u32) -> Duration {
    let factor = 2_u64.saturating_pow(retry.saturating_sub(1));
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Client for an OpenAI-compatible chat completion and embedding API
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    request_config: RequestConfig,
}

impl OpenAiClient {
    /// Create a new client. A missing API key is accepted here and reported on each call.
    pub fn new(
        config: &OpenAiConfig,
        models: &ModelConfig,
        request_config: RequestConfig,
    ) -> LlmResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            embedding_model: models.embedding.clone(),
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body, retrying transient failures with exponential backoff.
    async fn post_with_retry<Req, Resp>(&self, endpoint: &str, body: &Req) -> LlmResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingCredential)?;
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut retries = 0;
        loop {
            if retries > 0 {
                let delay = backoff_delay(self.request_config.retry_delay_ms, retries);
                warn!(
                    endpoint = %endpoint,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying model API request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            match self.execute_request(&url, api_key, body).await {
                Ok(response) => {
                    debug!(
                        endpoint = %endpoint,
                        latency_ms = start.elapsed().as_millis(),
                        "Model API call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        endpoint = %endpoint,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Model API call failed"
                    );
                    if !e.is_transient() {
                        return Err(e);
                    }
                    if retries >= self.request_config.max_retries {
                        if retries == 0 {
                            return Err(e);
                        }
                        return Err(LlmError::Unavailable {
                            message: e.to_string(),
                            retries,
                        });
                    }
                    retries += 1;
                }
            }
        }
    }

    /// Execute a single request (internal)
    async fn execute_request<Req, Resp>(
        &self,
        url: &str,
        api_key: &str,
        body: &Req,
    ) -> LlmResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Calling chat completion"
        );
        let start = Instant::now();
        let response: ChatResponse = self.post_with_retry("chat/completions", &request).await?;
        info!(
            model = %request.model,
            latency_ms = start.elapsed().as_millis(),
            total_tokens = ?response.usage.as_ref().and_then(|u| u.total_tokens),
            "Chat completion received"
        );
        Ok(response)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: inputs.to_vec(),
        };
        let response: EmbeddingResponse = self.post_with_retry("embeddings", &request).await?;
        response.into_ordered(inputs.len())
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}
