//! Vector Domain Library
//!
//! Semantic question search over a hosted vector index, with the index,
//! nearest-neighbour search and (optionally) text embedding all done remotely.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    QaFinder     │  ← query strategy, index setup, batch loading
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐     ┌──────────────────┐
//! │ VectorRepository│     │ EmbeddingProvider│
//! │ + IndexManager  │     │    (trait)       │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//! ┌────────▼────────┐     ┌────────▼──────────────────┐
//! │PineconeRepository│    │ OpenAIProvider            │
//! │  (REST client)  │     │ PineconeInferenceProvider │
//! └─────────────────┘     └───────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_vector::{
//!     FinderConfig, IndexRef, IngestOptions, JsonLinesSource, PineconeRepository, QaFinder,
//!     QueryMode,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = PineconeRepository::from_env()?;
//! let config = FinderConfig::new(IndexRef::new("quora-simple-semantic"))
//!     .with_mode(QueryMode::Integrated);
//! let finder = QaFinder::new(repository, config);
//!
//! // Load questions, 96 records per request
//! let rows = JsonLinesSource::open("quora.jsonl")?;
//! let report = finder.load(rows, IngestOptions::text("question_text")).await?;
//! println!("upserted {} in {} batches", report.upserted, report.batches.len());
//!
//! for hit in finder.find_similar("How do I learn Python?").await? {
//!     println!("{} {:.4}", hit.id, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod display;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod lookup;
pub mod models;
pub mod pinecone;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use dataset::{JsonLinesSource, SourceRow};
pub use display::{render_results, write_results};
pub use embedding::{
    EmbeddingProvider, OpenAIConfig, OpenAIProvider, PineconeInferenceProvider,
};
pub use error::{VectorError, VectorResult};
pub use ingest::{
    BatchUpserter, DEFAULT_BATCH_SIZE, IngestOptions, MAX_TEXT_BATCH_SIZE, RecordShape,
    SkipReason, UpsertReport,
};
pub use lookup::{QuestionLookup, TEXT_UNAVAILABLE, TextResolver};
pub use models::{
    DEFAULT_NAMESPACE, DistanceMetric, EmbeddingModel, EmbeddingProviderType, EmbeddingResult,
    IndexKind, IndexSpec, IndexStats, Metadata, QueryInput, QueryMode, Record, RecordBody,
    SearchHit, SearchQuery,
};
pub use pinecone::{PineconeConfig, PineconeRepository};
pub use repository::{IndexManager, IndexRef, VectorRepository};
pub use service::{FinderConfig, IndexState, QaFinder};
