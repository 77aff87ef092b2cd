use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::wire::{
    self, DescribeIndexStatsResponse, IndexDescription, QueryRequest, QueryResponse,
    SearchRecordsQuery, SearchRecordsRequest, SearchRecordsResponse, TextInputs,
    UpsertVectorsRequest, UpsertVectorsResponse,
};
use super::{PineconeConfig, http_client};
use crate::error::{VectorError, VectorResult};
use crate::models::{IndexSpec, IndexStats, QueryInput, Record, SearchHit, SearchQuery};
use crate::repository::{IndexManager, IndexRef, VectorRepository};

/// Pinecone-backed implementation of `VectorRepository` and `IndexManager`.
///
/// Control-plane calls go to the configured controller URL; data-plane calls
/// go to the per-index host, looked up once and cached.
pub struct PineconeRepository {
    client: Client,
    controller_url: String,
    hosts: Mutex<HashMap<String, String>>,
    ready_poll_interval: Duration,
    ready_poll_attempts: u32,
}

impl PineconeRepository {
    pub fn new(config: PineconeConfig) -> VectorResult<Self> {
        Ok(Self {
            client: http_client(&config)?,
            controller_url: config.controller_url,
            hosts: Mutex::new(HashMap::new()),
            ready_poll_interval: Duration::from_secs(2),
            ready_poll_attempts: 150,
        })
    }

    pub fn from_env() -> VectorResult<Self> {
        Self::new(PineconeConfig::from_env()?)
    }

    /// How often, and how many times, to check that a new index is ready
    pub fn with_ready_poll(mut self, interval: Duration, attempts: u32) -> Self {
        self.ready_poll_interval = interval;
        self.ready_poll_attempts = attempts.max(1);
        self
    }

    async fn describe_index(&self, name: &str) -> VectorResult<Option<IndexDescription>> {
        let response = self
            .client
            .get(format!("{}/indexes/{}", self.controller_url, name))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let description: IndexDescription = read_json(response, name).await?;
        Ok(Some(description))
    }

    /// Data-plane base URL for an index
    async fn host(&self, name: &str) -> VectorResult<String> {
        if let Some(host) = self.hosts.lock().await.get(name) {
            return Ok(host.clone());
        }

        let description = self
            .describe_index(name)
            .await?
            .ok_or_else(|| VectorError::IndexNotFound(name.to_string()))?;
        let host = description.base_url();
        debug!(index = %description.name, host = %host, "Resolved index host");

        self.hosts
            .lock()
            .await
            .insert(name.to_string(), host.clone());
        Ok(host)
    }

    async fn wait_until_ready(&self, name: &str) -> VectorResult<()> {
        for attempt in 1..=self.ready_poll_attempts {
            match self.describe_index(name).await? {
                Some(description) if description.is_ready() => {
                    info!(
                        index = name,
                        attempt,
                        dimension = ?description.dimension,
                        "Index is ready"
                    );
                    self.hosts
                        .lock()
                        .await
                        .insert(name.to_string(), description.base_url());
                    return Ok(());
                }
                Some(description) => {
                    let state = description
                        .status
                        .as_ref()
                        .and_then(|s| s.state.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    debug!(index = name, attempt, state = %state, "Index not ready yet");
                }
                None => debug!(index = name, attempt, "Index not visible yet"),
            }
            tokio::time::sleep(self.ready_poll_interval).await;
        }

        Err(VectorError::Store(format!(
            "Index {} did not become ready after {} checks",
            name, self.ready_poll_attempts
        )))
    }

    async fn upsert_vectors(&self, index: &IndexRef, records: Vec<Record>) -> VectorResult<usize> {
        let host = self.host(&index.name).await?;
        let request = UpsertVectorsRequest {
            vectors: wire::dense_vectors(records)?,
            namespace: &index.namespace,
        };

        let response = self
            .client
            .post(format!("{}/vectors/upsert", host))
            .json(&request)
            .send()
            .await?;

        let body: UpsertVectorsResponse = read_json(response, &index.name).await?;
        Ok(body.upserted_count)
    }

    async fn upsert_records(&self, index: &IndexRef, records: Vec<Record>) -> VectorResult<usize> {
        let host = self.host(&index.name).await?;
        let count = records.len();
        let body = wire::records_ndjson(records)?;

        let response = self
            .client
            .post(format!(
                "{}/records/namespaces/{}/upsert",
                host, index.namespace
            ))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        ensure_success(response, &index.name).await?;
        Ok(count)
    }

    async fn query_vector(
        &self,
        index: &IndexRef,
        vector: &[f32],
        query: &SearchQuery,
    ) -> VectorResult<Vec<SearchHit>> {
        let host = self.host(&index.name).await?;
        let request = QueryRequest {
            namespace: &index.namespace,
            vector,
            top_k: query.top_k,
            include_metadata: query.include_metadata,
            include_values: false,
        };

        let response = self
            .client
            .post(format!("{}/query", host))
            .json(&request)
            .send()
            .await?;

        let body: QueryResponse = read_json(response, &index.name).await?;
        Ok(body.matches.into_iter().map(SearchHit::from).collect())
    }

    async fn search_text(
        &self,
        index: &IndexRef,
        text: &str,
        query: &SearchQuery,
    ) -> VectorResult<Vec<SearchHit>> {
        let host = self.host(&index.name).await?;
        let request = SearchRecordsRequest {
            query: SearchRecordsQuery {
                inputs: TextInputs { text },
                top_k: query.top_k,
            },
            fields: &query.fields,
        };

        let response = self
            .client
            .post(format!(
                "{}/records/namespaces/{}/search",
                host, index.namespace
            ))
            .json(&request)
            .send()
            .await?;

        let body: SearchRecordsResponse = read_json(response, &index.name).await?;
        Ok(body.result.hits.into_iter().map(SearchHit::from).collect())
    }
}

async fn ensure_success(response: Response, index: &str) -> VectorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(VectorError::IndexNotFound(index.to_string()));
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(VectorError::Store(format!(
        "Pinecone API error ({}): {}",
        status, error_text
    )))
}

async fn read_json<T: DeserializeOwned>(response: Response, index: &str) -> VectorResult<T> {
    let response = ensure_success(response, index).await?;
    response
        .json()
        .await
        .map_err(|e| VectorError::Store(format!("Malformed Pinecone response: {}", e)))
}

#[async_trait]
impl VectorRepository for PineconeRepository {
    #[instrument(skip(self, records), fields(index = %index, batch = records.len()))]
    async fn upsert(&self, index: &IndexRef, records: Vec<Record>) -> VectorResult<usize> {
        let Some(first) = records.first() else {
            return Ok(0);
        };

        if first.is_dense() {
            self.upsert_vectors(index, records).await
        } else {
            self.upsert_records(index, records).await
        }
    }

    #[instrument(skip(self, query), fields(index = %index, top_k = query.top_k))]
    async fn search(&self, index: &IndexRef, query: SearchQuery) -> VectorResult<Vec<SearchHit>> {
        match &query.input {
            QueryInput::Vector(vector) => self.query_vector(index, vector, &query).await,
            QueryInput::Text(text) => self.search_text(index, text, &query).await,
        }
    }
}

#[async_trait]
impl IndexManager for PineconeRepository {
    async fn has_index(&self, name: &str) -> VectorResult<bool> {
        Ok(self.describe_index(name).await?.is_some())
    }

    #[instrument(skip(self, spec), fields(index = %spec.name))]
    async fn create_index(&self, spec: IndexSpec) -> VectorResult<()> {
        let (path, body) = wire::create_index_body(&spec)?;

        let response = self
            .client
            .post(format!("{}{}", self.controller_url, path))
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            warn!(index = %spec.name, "Index already exists, reusing it");
        } else {
            ensure_success(response, &spec.name).await?;
            info!(index = %spec.name, "Index creation accepted");
        }

        self.wait_until_ready(&spec.name).await
    }

    async fn index_stats(&self, name: &str) -> VectorResult<IndexStats> {
        let host = self.host(name).await?;

        let response = self
            .client
            .post(format!("{}/describe_index_stats", host))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let body: DescribeIndexStatsResponse = read_json(response, name).await?;
        Ok(body.into())
    }
}
