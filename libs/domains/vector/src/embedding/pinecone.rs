//! Pinecone hosted inference embedding provider
//!
//! Calls `POST {controller}/embed` with `input_type: query`, the side of
//! asymmetric retrieval that questions are on.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{EmbeddingModel, EmbeddingResult};
use crate::pinecone::{PineconeConfig, http_client};

/// Pinecone inference embeddings provider
pub struct PineconeInferenceProvider {
    client: Client,
    controller_url: String,
}

impl PineconeInferenceProvider {
    pub fn new(config: &PineconeConfig) -> VectorResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            controller_url: config.controller_url.clone(),
        })
    }

    pub fn from_env() -> VectorResult<Self> {
        Self::new(&PineconeConfig::from_env()?)
    }
}

#[async_trait]
impl EmbeddingProvider for PineconeInferenceProvider {
    async fn embed(&self, model: EmbeddingModel, text: &str) -> VectorResult<EmbeddingResult> {
        let request = EmbedRequest::query(model, text);

        let response = self
            .client
            .post(format!("{}/embed", self.controller_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| VectorError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!(
                "Pinecone inference error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| VectorError::Embedding(format!("Malformed embed response: {}", e)))?;

        body.into_result()
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    parameters: EmbedParameters,
    inputs: [EmbedInput<'a>; 1],
}

impl<'a> EmbedRequest<'a> {
    fn query(model: EmbeddingModel, text: &'a str) -> Self {
        Self {
            model: model.model_name(),
            parameters: EmbedParameters {
                input_type: "query",
                truncate: "END",
            },
            inputs: [EmbedInput { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedParameters {
    input_type: &'static str,
    truncate: &'static str,
}

#[derive(Debug, Serialize)]
struct EmbedInput<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    values: Vec<f32>,
}

impl EmbedResponse {
    fn into_result(self) -> VectorResult<EmbeddingResult> {
        self.data
            .into_iter()
            .next()
            .map(|d| EmbeddingResult {
                dimension: d.values.len() as u32,
                values: d.values,
            })
            .ok_or_else(|| VectorError::Embedding("No embedding returned".to_string()))
    }
}
