use async_trait::async_trait;

use crate::error::VectorResult;
use crate::models::{IndexSpec, IndexStats, Record, SearchHit, SearchQuery, DEFAULT_NAMESPACE};

/// Which index, and which namespace inside it, an operation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRef {
    pub name: String,
    pub namespace: String,
}

impl IndexRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl std::fmt::Display for IndexRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.namespace)
    }
}

/// Data-plane operations against a remote vector index.
///
/// Everything the batch loader and the query path need; nothing else.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Insert-or-update one batch. Returns the number of records accepted.
    async fn upsert(&self, index: &IndexRef, records: Vec<Record>) -> VectorResult<usize>;

    /// Top-k similarity search; hits come back ranked by the store
    async fn search(&self, index: &IndexRef, query: SearchQuery) -> VectorResult<Vec<SearchHit>>;
}

/// Control-plane operations: index lifecycle and statistics
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexManager: Send + Sync {
    async fn has_index(&self, name: &str) -> VectorResult<bool>;

    /// Create the index and wait until the store reports it ready
    async fn create_index(&self, spec: IndexSpec) -> VectorResult<()>;

    async fn index_stats(&self, name: &str) -> VectorResult<IndexStats>;
}
