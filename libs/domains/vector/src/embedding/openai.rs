use std::time::Duration;

use async_trait::async_trait;
use core_config::{env_optional, env_or_default, env_parse_or_default};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{EmbeddingModel, EmbeddingResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible embeddings endpoint.
///
/// Self-hosted servers (e.g. text-embeddings-inference serving
/// all-MiniLM-L6-v2) usually need no API key.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: Some(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn from_env() -> VectorResult<Self> {
        let api_key = env_optional("OPENAI_API_KEY");
        let base_url = env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL);

        if api_key.is_none() && base_url == DEFAULT_BASE_URL {
            return Err(VectorError::Config(
                "OPENAI_API_KEY not set (required unless OPENAI_BASE_URL points elsewhere)"
                    .to_string(),
            ));
        }

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: env_parse_or_default("EMBEDDING_TIMEOUT_SECS", 30)?,
        })
    }
}

/// OpenAI-compatible embeddings provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> VectorResult<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// The embedding for input 0; servers may return entries in any order
fn first_embedding(response: EmbeddingResponse) -> VectorResult<EmbeddingResult> {
    response
        .data
        .into_iter()
        .find(|d| d.index == 0)
        .map(|d| EmbeddingResult {
            dimension: d.embedding.len() as u32,
            values: d.embedding,
        })
        .ok_or_else(|| VectorError::Embedding("No embedding returned".to_string()))
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn embed(&self, model: EmbeddingModel, text: &str) -> VectorResult<EmbeddingResult> {
        let request = EmbeddingRequest {
            model: model.model_name(),
            input: [text],
        };

        debug!(model = %model, "Requesting embedding");

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| VectorError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!(
                "Embeddings API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| VectorError::Embedding(format!("Malformed embeddings response: {}", e)))?;

        first_embedding(embedding_response)
    }
}
