use std::sync::Arc;

use core_config::{env_or_default, env_parse_or_default};
use tracing::{error, info, instrument};

use crate::dataset::SourceRow;
use crate::embedding::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::ingest::{BatchUpserter, IngestOptions, UpsertReport};
use crate::models::{
    DEFAULT_NAMESPACE, EmbeddingModel, IndexSpec, IndexStats, QueryMode, SearchHit, SearchQuery,
};
use crate::repository::{IndexManager, IndexRef, VectorRepository};

/// Query-side settings for the finder
#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub index: IndexRef,
    pub top_k: u32,
    pub mode: QueryMode,
    /// Model used to embed questions in `QueryMode::Local`
    pub model: EmbeddingModel,
    /// Record field holding the question text
    pub text_field: String,
}

impl FinderConfig {
    pub fn new(index: IndexRef) -> Self {
        Self {
            index,
            top_k: 5,
            mode: QueryMode::default(),
            model: EmbeddingModel::default(),
            text_field: "question_text".to_string(),
        }
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_model(mut self, model: EmbeddingModel) -> Self {
        self.model = model;
        self
    }

    pub fn from_env() -> VectorResult<Self> {
        let name = env_or_default("QA_INDEX_NAME", "quora-questions");
        let namespace = env_or_default("QA_NAMESPACE", DEFAULT_NAMESPACE);

        let mode = env_or_default("QA_QUERY_MODE", "local")
            .parse::<QueryMode>()
            .map_err(|_| {
                VectorError::Config("QA_QUERY_MODE must be 'local' or 'integrated'".to_string())
            })?;

        let model = env_or_default("EMBEDDING_MODEL", EmbeddingModel::default().model_name())
            .parse::<EmbeddingModel>()
            .map_err(VectorError::Config)?;

        let top_k: u32 = env_parse_or_default("QA_TOP_K", 5)?;
        if top_k == 0 {
            return Err(VectorError::Config("QA_TOP_K must be at least 1".to_string()));
        }

        Ok(Self {
            index: IndexRef::new(name).with_namespace(namespace),
            top_k,
            mode,
            model,
            text_field: env_or_default("QA_TEXT_FIELD", "question_text"),
        })
    }
}

/// State of the target index after `ensure_index`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Index did not exist and was created
    Created,
    /// Index exists but holds no vectors
    Empty,
    /// Index exists and holds this many vectors
    Populated(u64),
}

impl IndexState {
    pub fn needs_data(&self) -> bool {
        !matches!(self, IndexState::Populated(_))
    }
}

/// Semantic question finder over a remote vector index
///
/// Combines the store with an optional embedding provider; which one turns
/// question text into a search is decided by `FinderConfig::mode`.
pub struct QaFinder<R> {
    repository: R,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    config: FinderConfig,
}

impl<R: VectorRepository> QaFinder<R> {
    pub fn new(repository: R, config: FinderConfig) -> Self {
        Self {
            repository,
            embedding_provider: None,
            config,
        }
    }

    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Turn question text into the store query for the configured mode
    async fn build_query(&self, question: &str) -> VectorResult<SearchQuery> {
        match self.config.mode {
            QueryMode::Integrated => Ok(SearchQuery::text(question, self.config.top_k)
                .with_fields(vec![self.config.text_field.clone()])),
            QueryMode::Local => {
                let provider = self.embedding_provider.as_ref().ok_or_else(|| {
                    VectorError::Config("No embedding provider configured".to_string())
                })?;

                let embedding = provider.embed(self.config.model, question).await?;
                if embedding.values.is_empty() {
                    return Err(VectorError::Embedding(
                        "Embedding provider returned an empty vector".to_string(),
                    ));
                }

                Ok(SearchQuery::vector(embedding.values, self.config.top_k))
            }
        }
    }

    /// Find questions similar to `question`, ranked by the store
    #[instrument(skip(self), fields(index = %self.config.index, mode = %self.config.mode))]
    pub async fn find_similar(&self, question: &str) -> VectorResult<Vec<SearchHit>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VectorError::Validation("Question is empty".to_string()));
        }

        let query = self.build_query(question).await?;
        self.repository.search(&self.config.index, query).await
    }

    /// Like `find_similar`, but a failed embedding or search is logged and
    /// treated as "no results".
    pub async fn find_similar_or_empty(&self, question: &str) -> Vec<SearchHit> {
        match self.find_similar(question).await {
            Ok(hits) => hits,
            Err(VectorError::Embedding(msg)) => {
                error!(error = %msg, "Error embedding question");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Error searching for similar questions");
                Vec::new()
            }
        }
    }

    /// Upsert source rows into the configured index in bounded batches
    pub async fn load<I>(&self, rows: I, options: IngestOptions) -> VectorResult<UpsertReport>
    where
        I: IntoIterator<Item = VectorResult<SourceRow>>,
    {
        BatchUpserter::new(&self.repository, self.config.index.clone(), options)
            .run(rows)
            .await
    }
}

impl<R: VectorRepository + IndexManager> QaFinder<R> {
    pub async fn stats(&self) -> VectorResult<IndexStats> {
        self.repository.index_stats(&self.config.index.name).await
    }

    /// Create the index if missing, and report whether it needs data
    pub async fn ensure_index(&self, spec: IndexSpec) -> VectorResult<IndexState> {
        if spec.name != self.config.index.name {
            return Err(VectorError::Validation(format!(
                "Index spec '{}' does not match configured index '{}'",
                spec.name, self.config.index.name
            )));
        }

        if !self.repository.has_index(&spec.name).await? {
            info!(index = %spec.name, "Creating index");
            self.repository.create_index(spec).await?;
            return Ok(IndexState::Created);
        }

        let stats = self.stats().await?;
        if stats.is_empty() {
            info!(index = %self.config.index.name, "Index exists but is empty");
            Ok(IndexState::Empty)
        } else {
            info!(
                index = %self.config.index.name,
                vectors = stats.total_vector_count,
                "Index already populated"
            );
            Ok(IndexState::Populated(stats.total_vector_count))
        }
    }
}
