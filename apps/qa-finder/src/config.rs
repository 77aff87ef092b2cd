//! Configuration for the Q&A finder

use std::path::PathBuf;

use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_or_default};
use domain_vector::{
    DEFAULT_BATCH_SIZE, DistanceMetric, EmbeddingProviderType, FinderConfig, IndexRef, IndexSpec,
    IngestOptions, MAX_TEXT_BATCH_SIZE, PineconeConfig, QueryMode,
};
use eyre::{Result, WrapErr, bail};

/// Where the index lives and how it is built and loaded
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// JSON Lines dataset used for loading and for the text lookup
    pub dataset: Option<PathBuf>,
    /// Vector size for a dense index
    pub dimension: u32,
    /// Similarity metric for a dense index
    pub metric: DistanceMetric,
    pub cloud: String,
    pub region: String,
    /// Server-side model for an integrated index
    pub embed_model: String,
    /// Stored as `source` metadata on text records
    pub source_tag: String,
}

impl FromEnv for IndexSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let dimension: u32 = env_parse_or_default("QA_DIMENSION", 384)?;
        if dimension == 0 {
            return Err(ConfigError::ParseError {
                key: "QA_DIMENSION".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            dataset: env_optional("QA_DATASET").map(PathBuf::from),
            dimension,
            metric: env_parse_or_default("QA_METRIC", DistanceMetric::default())?,
            cloud: env_or_default("QA_CLOUD", "aws"),
            region: env_or_default("QA_REGION", "us-east-1"),
            embed_model: env_or_default("QA_EMBED_MODEL", "llama-text-embed-v2"),
            source_tag: env_or_default("QA_SOURCE_TAG", "quora"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pinecone: PineconeConfig,
    pub finder: FinderConfig,
    pub index: IndexSettings,
    pub embedding_provider: EmbeddingProviderType,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            pinecone: PineconeConfig::from_env()
                .wrap_err("Failed to load Pinecone configuration")?,
            finder: FinderConfig::from_env().wrap_err("Failed to load finder configuration")?,
            index: IndexSettings::from_env().wrap_err("Failed to load index settings")?,
            embedding_provider: env_parse_or_default(
                "EMBEDDING_PROVIDER",
                EmbeddingProviderType::default(),
            )
            .wrap_err("Failed to load embedding provider")?,
        })
    }

    /// Reject settings that would only fail later at query time.
    ///
    /// In local mode the model must belong to the configured provider and
    /// produce vectors of the index dimension.
    pub fn validate(&self) -> Result<()> {
        if self.finder.mode != QueryMode::Local {
            return Ok(());
        }

        let model = self.finder.model;
        if model.provider() != self.embedding_provider {
            bail!(
                "Embedding model '{}' is served by {}, but EMBEDDING_PROVIDER is {}; \
                 set EMBEDDING_MODEL to a {} model",
                model,
                model.provider(),
                self.embedding_provider,
                self.embedding_provider
            );
        }
        if model.dimension() != self.index.dimension {
            bail!(
                "Embedding model '{}' produces {} dimensions, but QA_DIMENSION is {}",
                model,
                model.dimension(),
                self.index.dimension
            );
        }
        Ok(())
    }

    /// Command-line flags win over the environment
    pub fn with_overrides(mut self, index: Option<String>, mode: Option<QueryMode>) -> Self {
        if let Some(name) = index {
            self.finder.index = IndexRef::new(name).with_namespace(self.finder.index.namespace);
        }
        if let Some(mode) = mode {
            self.finder.mode = mode;
        }
        self
    }

    /// Index to create when it does not exist yet
    pub fn index_spec(&self) -> IndexSpec {
        let name = self.finder.index.name.clone();
        let spec = match self.finder.mode {
            QueryMode::Local => {
                IndexSpec::dense(name, self.index.dimension).with_metric(self.index.metric)
            }
            QueryMode::Integrated => IndexSpec::integrated(
                name,
                self.index.embed_model.clone(),
                self.finder.text_field.clone(),
            ),
        };
        spec.with_location(self.index.cloud.clone(), self.index.region.clone())
    }

    /// How dataset rows become records for the configured mode
    pub fn ingest_options(
        &self,
        batch_size: Option<usize>,
        max_records: Option<usize>,
    ) -> IngestOptions {
        let text_field = self.finder.text_field.clone();
        let options = match self.finder.mode {
            QueryMode::Local => IngestOptions::dense(self.index.dimension, text_field)
                .with_batch_size(batch_size.unwrap_or(DEFAULT_BATCH_SIZE)),
            QueryMode::Integrated => IngestOptions::text(text_field)
                .with_batch_size(batch_size.unwrap_or(MAX_TEXT_BATCH_SIZE))
                .with_metadata(
                    "source",
                    serde_json::Value::String(self.index.source_tag.clone()),
                ),
        };
        options.with_max_records(max_records)
    }
}
