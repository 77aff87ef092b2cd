//! In-memory stand-in for the remote store

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use domain_vector::*;
use serde_json::json;

#[derive(Default)]
pub struct InMemoryStore {
    pub batches: Mutex<Vec<Vec<Record>>>,
    pub searches: Mutex<Vec<SearchQuery>>,
    pub created: Mutex<Vec<IndexSpec>>,
    /// Returned as-is by every search
    pub canned_hits: Vec<SearchHit>,
    pub existing_index: Option<String>,
    pub vector_count: u64,
    /// Fail the upsert call with this 1-based number
    pub fail_on_batch: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            canned_hits: hits,
            ..Self::default()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn upserted_ids(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|r| r.id.clone())
            .collect()
    }
}

#[async_trait]
impl VectorRepository for InMemoryStore {
    async fn upsert(&self, _index: &IndexRef, records: Vec<Record>) -> VectorResult<usize> {
        let mut batches = self.batches.lock().unwrap();
        if self.fail_on_batch == Some(batches.len() + 1) {
            return Err(VectorError::Store("503 Service Unavailable".to_string()));
        }
        let count = records.len();
        batches.push(records);
        Ok(count)
    }

    async fn search(&self, _index: &IndexRef, query: SearchQuery) -> VectorResult<Vec<SearchHit>> {
        self.searches.lock().unwrap().push(query);
        Ok(self.canned_hits.clone())
    }
}

#[async_trait]
impl IndexManager for InMemoryStore {
    async fn has_index(&self, name: &str) -> VectorResult<bool> {
        Ok(self.existing_index.as_deref() == Some(name))
    }

    async fn create_index(&self, spec: IndexSpec) -> VectorResult<()> {
        self.created.lock().unwrap().push(spec);
        Ok(())
    }

    async fn index_stats(&self, _name: &str) -> VectorResult<IndexStats> {
        Ok(IndexStats {
            total_vector_count: self.vector_count,
            dimension: Some(3),
        })
    }
}

/// A valid row with a 3-dimensional vector
pub fn valid_row(n: usize) -> SourceRow {
    SourceRow {
        id: n.to_string(),
        values: Some(vec![n as f32, 0.5, 0.25]),
        metadata: None,
        blob: Some(json!({ "text": format!("Question number {}?", n) })),
    }
}

/// A row with blank text
pub fn blank_row(n: usize) -> SourceRow {
    SourceRow {
        id: format!("blank-{}", n),
        values: Some(vec![0.0, 0.0, 0.0]),
        metadata: None,
        blob: Some(json!({ "text": "   " })),
    }
}
