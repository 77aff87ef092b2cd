use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Flat metadata map attached to a record or returned with a hit.
///
/// Values are expected to be scalars (string, number, bool); the store
/// rejects nested objects.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "__default__";

/// Distance metric for similarity calculations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

/// How question text reaches the store at query time
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QueryMode {
    /// Embed locally through an `EmbeddingProvider`, then query by vector
    #[default]
    Local,
    /// Send raw text; the index embeds it server-side
    Integrated,
}

/// What kind of index to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexKind {
    /// Plain dense index fed with precomputed vectors
    Dense {
        dimension: u32,
        metric: DistanceMetric,
    },
    /// Index with a hosted embedding model mapped onto one text field
    Integrated { model: String, text_field: String },
}

/// Everything needed to create an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub cloud: String,
    pub region: String,
    pub kind: IndexKind,
}

impl IndexSpec {
    pub fn dense(name: impl Into<String>, dimension: u32) -> Self {
        Self {
            name: name.into(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            kind: IndexKind::Dense {
                dimension,
                metric: DistanceMetric::default(),
            },
        }
    }

    pub fn integrated(
        name: impl Into<String>,
        model: impl Into<String>,
        text_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            kind: IndexKind::Integrated {
                model: model.into(),
                text_field: text_field.into(),
            },
        }
    }

    pub fn with_location(mut self, cloud: impl Into<String>, region: impl Into<String>) -> Self {
        self.cloud = cloud.into();
        self.region = region.into();
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        if let IndexKind::Dense { metric: m, .. } = &mut self.kind {
            *m = metric;
        }
        self
    }
}

/// Index statistics as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: Option<u32>,
}

impl IndexStats {
    pub fn is_empty(&self) -> bool {
        self.total_vector_count == 0
    }
}

/// Payload of a record: a dense vector, or text for server-side embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordBody {
    Dense(Vec<f32>),
    Text { field: String, text: String },
}

/// A single item handed to the store's upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub body: RecordBody,
    pub metadata: Option<Metadata>,
}

impl Record {
    pub fn dense(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            body: RecordBody::Dense(values),
            metadata: None,
        }
    }

    pub fn text(id: impl Into<String>, field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: RecordBody::Text {
                field: field.into(),
                text: text.into(),
            },
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_dense(&self) -> bool {
        matches!(self.body, RecordBody::Dense(_))
    }
}

/// What to search with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryInput {
    Vector(Vec<f32>),
    Text(String),
}

/// Search query parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub input: QueryInput,
    pub top_k: u32,
    pub include_metadata: bool,
    /// Record fields to return with text searches
    pub fields: Vec<String>,
}

impl SearchQuery {
    pub fn vector(values: Vec<f32>, top_k: u32) -> Self {
        Self {
            input: QueryInput::Vector(values),
            top_k,
            include_metadata: true,
            fields: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>, top_k: u32) -> Self {
        Self {
            input: QueryInput::Text(text.into()),
            top_k,
            include_metadata: true,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

/// One ranked hit returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub metadata: Option<Metadata>,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// String value of a metadata field, if present and non-empty
    pub fn metadata_text(&self, field: &str) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get(field)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Embedding provider types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmbeddingProviderType {
    /// Any OpenAI-compatible `/embeddings` endpoint
    #[default]
    OpenAI,
    /// Pinecone's hosted inference `/embed` endpoint
    Pinecone,
}

/// Embedding model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbeddingModel {
    /// sentence-transformers all-MiniLM-L6-v2 (384 dimensions)
    #[default]
    AllMiniLmL6V2,
    /// OpenAI text-embedding-3-small (1536 dimensions)
    TextEmbedding3Small,
    /// OpenAI text-embedding-3-large (3072 dimensions)
    TextEmbedding3Large,
    /// Pinecone-hosted multilingual-e5-large (1024 dimensions)
    MultilingualE5Large,
    /// Pinecone-hosted llama-text-embed-v2 (1024 dimensions)
    LlamaTextEmbedV2,
}

impl EmbeddingModel {
    pub const ALL: [EmbeddingModel; 5] = [
        EmbeddingModel::AllMiniLmL6V2,
        EmbeddingModel::TextEmbedding3Small,
        EmbeddingModel::TextEmbedding3Large,
        EmbeddingModel::MultilingualE5Large,
        EmbeddingModel::LlamaTextEmbedV2,
    ];

    pub fn dimension(&self) -> u32 {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => 384,
            EmbeddingModel::TextEmbedding3Small => 1536,
            EmbeddingModel::TextEmbedding3Large => 3072,
            EmbeddingModel::MultilingualE5Large => 1024,
            EmbeddingModel::LlamaTextEmbedV2 => 1024,
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large => "text-embedding-3-large",
            EmbeddingModel::MultilingualE5Large => "multilingual-e5-large",
            EmbeddingModel::LlamaTextEmbedV2 => "llama-text-embed-v2",
        }
    }

    /// Get the provider type this model is normally served by
    pub fn provider(&self) -> EmbeddingProviderType {
        match self {
            EmbeddingModel::AllMiniLmL6V2
            | EmbeddingModel::TextEmbedding3Small
            | EmbeddingModel::TextEmbedding3Large => EmbeddingProviderType::OpenAI,
            EmbeddingModel::MultilingualE5Large | EmbeddingModel::LlamaTextEmbedV2 => {
                EmbeddingProviderType::Pinecone
            }
        }
    }
}

impl std::fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_name())
    }
}

impl std::str::FromStr for EmbeddingModel {
    type Err = String;

    /// Accepts the full model name, or the part after the last `/`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EmbeddingModel::ALL
            .into_iter()
            .find(|m| {
                let name = m.model_name();
                name.eq_ignore_ascii_case(wanted)
                    || name
                        .rsplit('/')
                        .next()
                        .is_some_and(|short| short.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| format!("unknown embedding model '{}'", wanted))
    }
}

/// Embedding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    pub dimension: u32,
}
