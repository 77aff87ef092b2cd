//! Pinecone REST request/response bodies and their conversions to domain types

use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};
use crate::models::{
    DistanceMetric, IndexKind, IndexSpec, IndexStats, Metadata, Record, RecordBody, SearchHit,
};

// ===== Control plane =====

#[derive(Debug, Deserialize)]
pub(crate) struct IndexDescription {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub dimension: Option<u32>,
    #[serde(default)]
    pub status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: Option<String>,
}

impl IndexDescription {
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }

    /// Data-plane base URL; the API returns a bare host name
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.host.trim_end_matches('/'))
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateIndexRequest<'a> {
    pub name: &'a str,
    pub dimension: u32,
    pub metric: DistanceMetric,
    pub spec: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ServerlessSpec<'a> {
    pub serverless: CloudRegion<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CloudRegion<'a> {
    pub cloud: &'a str,
    pub region: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateIndexForModelRequest<'a> {
    pub name: &'a str,
    pub cloud: &'a str,
    pub region: &'a str,
    pub embed: EmbedSpec<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbedSpec<'a> {
    pub model: &'a str,
    pub field_map: FieldMap<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FieldMap<'a> {
    pub text: &'a str,
}

/// Path and JSON body of the create call for an index spec
pub(crate) fn create_index_body(spec: &IndexSpec) -> VectorResult<(&'static str, serde_json::Value)> {
    let body = match &spec.kind {
        IndexKind::Dense { dimension, metric } => {
            if *dimension == 0 {
                return Err(VectorError::Validation(
                    "Index dimension must be greater than zero".to_string(),
                ));
            }
            (
                "/indexes",
                serde_json::to_value(CreateIndexRequest {
                    name: &spec.name,
                    dimension: *dimension,
                    metric: *metric,
                    spec: ServerlessSpec {
                        serverless: CloudRegion {
                            cloud: &spec.cloud,
                            region: &spec.region,
                        },
                    },
                })?,
            )
        }
        IndexKind::Integrated { model, text_field } => (
            "/indexes/create-for-model",
            serde_json::to_value(CreateIndexForModelRequest {
                name: &spec.name,
                cloud: &spec.cloud,
                region: &spec.region,
                embed: EmbedSpec {
                    model,
                    field_map: FieldMap { text: text_field },
                },
            })?,
        ),
    };
    Ok(body)
}

// ===== Data plane: stats =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeIndexStatsResponse {
    #[serde(default)]
    pub total_vector_count: u64,
    #[serde(default)]
    pub dimension: Option<u32>,
}

impl From<DescribeIndexStatsResponse> for IndexStats {
    fn from(resp: DescribeIndexStatsResponse) -> Self {
        IndexStats {
            total_vector_count: resp.total_vector_count,
            dimension: resp.dimension,
        }
    }
}

// ===== Data plane: vectors =====

#[derive(Debug, Serialize)]
pub(crate) struct UpsertVectorsRequest<'a> {
    pub vectors: Vec<WireVector>,
    pub namespace: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireVector {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpsertVectorsResponse {
    #[serde(default)]
    pub upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub namespace: &'a str,
    pub vector: &'a [f32],
    pub top_k: u32,
    pub include_metadata: bool,
    pub include_values: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl From<QueryMatch> for SearchHit {
    fn from(m: QueryMatch) -> Self {
        SearchHit {
            id: m.id,
            score: m.score,
            metadata: m.metadata.filter(|md| !md.is_empty()),
        }
    }
}

// ===== Data plane: records (integrated embedding) =====

#[derive(Debug, Serialize)]
pub(crate) struct SearchRecordsRequest<'a> {
    pub query: SearchRecordsQuery<'a>,
    #[serde(skip_serializing_if = "no_fields")]
    pub fields: &'a [String],
}

fn no_fields(fields: &&[String]) -> bool {
    fields.is_empty()
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRecordsQuery<'a> {
    pub inputs: TextInputs<'a>,
    pub top_k: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextInputs<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchRecordsResponse {
    pub result: SearchRecordsResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchRecordsResult {
    #[serde(default)]
    pub hits: Vec<RecordHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: f32,
    #[serde(default)]
    pub fields: Option<Metadata>,
}

impl From<RecordHit> for SearchHit {
    fn from(hit: RecordHit) -> Self {
        SearchHit {
            id: hit.id,
            score: hit.score,
            metadata: hit.fields.filter(|f| !f.is_empty()),
        }
    }
}

/// Split a batch into dense vectors; fails on any text record
pub(crate) fn dense_vectors(records: Vec<Record>) -> VectorResult<Vec<WireVector>> {
    records
        .into_iter()
        .map(|record| match record.body {
            RecordBody::Dense(values) => Ok(WireVector {
                id: record.id,
                values,
                metadata: record.metadata.filter(|m| !m.is_empty()),
            }),
            RecordBody::Text { .. } => Err(VectorError::Validation(format!(
                "Record {} carries text; a batch must be all dense or all text",
                record.id
            ))),
        })
        .collect()
}

/// Encode text records as the newline-delimited JSON body of a records upsert.
///
/// Each line is a flat object: `_id`, the embedded text field, then metadata.
pub(crate) fn records_ndjson(records: Vec<Record>) -> VectorResult<String> {
    let mut body = String::new();
    for record in records {
        let RecordBody::Text { field, text } = record.body else {
            return Err(VectorError::Validation(format!(
                "Record {} carries a vector; a batch must be all dense or all text",
                record.id
            )));
        };

        let mut line = record.metadata.unwrap_or_default();
        line.insert("_id".to_string(), serde_json::Value::String(record.id));
        line.insert(field, serde_json::Value::String(text));

        body.push_str(&serde_json::to_string(&line)?);
        body.push('\n');
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_dense_index_body() {
        let spec = IndexSpec::dense("quora-questions", 384);
        let (path, body) = create_index_body(&spec).unwrap();
        assert_eq!(path, "/indexes");
        assert_eq!(
            body,
            json!({
                "name": "quora-questions",
                "dimension": 384,
                "metric": "cosine",
                "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
            })
        );
    }

    #[test]
    fn test_create_integrated_index_body() {
        let spec = IndexSpec::integrated("quora-simple-semantic", "llama-text-embed-v2", "question_text");
        let (path, body) = create_index_body(&spec).unwrap();
        assert_eq!(path, "/indexes/create-for-model");
        assert_eq!(
            body,
            json!({
                "name": "quora-simple-semantic",
                "cloud": "aws",
                "region": "us-east-1",
                "embed": {
                    "model": "llama-text-embed-v2",
                    "field_map": { "text": "question_text" }
                }
            })
        );
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let spec = IndexSpec::dense("broken", 0);
        assert!(matches!(
            create_index_body(&spec),
            Err(VectorError::Validation(_))
        ));
    }

    #[test]
    fn test_index_description_base_url() {
        let desc: IndexDescription = serde_json::from_value(json!({
            "name": "quora-questions",
            "host": "quora-questions-abc123.svc.aped-4627-b74a.pinecone.io",
            "dimension": 384,
            "status": { "ready": true, "state": "Ready" }
        }))
        .unwrap();
        assert!(desc.is_ready());
        assert_eq!(
            desc.base_url(),
            "https://quora-questions-abc123.svc.aped-4627-b74a.pinecone.io"
        );

        let local: IndexDescription = serde_json::from_value(json!({
            "name": "local",
            "host": "http://localhost:5081/"
        }))
        .unwrap();
        assert!(!local.is_ready());
        assert_eq!(local.base_url(), "http://localhost:5081");
    }

    #[test]
    fn test_stats_response() {
        let resp: DescribeIndexStatsResponse = serde_json::from_value(json!({
            "namespaces": { "": { "vectorCount": 522931 } },
            "dimension": 384,
            "indexFullness": 0.0,
            "totalVectorCount": 522931
        }))
        .unwrap();
        let stats = IndexStats::from(resp);
        assert_eq!(stats.total_vector_count, 522931);
        assert_eq!(stats.dimension, Some(384));
        assert!(!stats.is_empty());
    }

    #[test]
    fn test_query_request_shape() {
        let vector = [0.1_f32, 0.2];
        let request = QueryRequest {
            namespace: "__default__",
            vector: &vector,
            top_k: 5,
            include_metadata: true,
            include_values: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["topK"], 5);
        assert_eq!(value["includeMetadata"], true);
        assert_eq!(value["includeValues"], false);
        assert_eq!(value["namespace"], "__default__");
    }

    #[test]
    fn test_query_matches_preserve_order() {
        let resp: QueryResponse = serde_json::from_value(json!({
            "matches": [
                { "id": "42", "score": 0.91, "metadata": { "text": "a" } },
                { "id": "7", "score": 0.85, "metadata": {} },
                { "id": "3", "score": 0.80 }
            ],
            "namespace": ""
        }))
        .unwrap();
        let hits: Vec<SearchHit> = resp.matches.into_iter().map(Into::into).collect();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["42", "7", "3"]);
        assert!(hits[0].metadata.is_some());
        assert!(hits[1].metadata.is_none());
        assert!(hits[2].metadata.is_none());
    }

    #[test]
    fn test_search_records_shapes() {
        let fields = vec!["question_text".to_string()];
        let request = SearchRecordsRequest {
            query: SearchRecordsQuery {
                inputs: TextInputs {
                    text: "What is machine learning?",
                },
                top_k: 5,
            },
            fields: &fields,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "query": { "inputs": { "text": "What is machine learning?" }, "top_k": 5 },
                "fields": ["question_text"]
            })
        );

        let resp: SearchRecordsResponse = serde_json::from_value(json!({
            "result": {
                "hits": [
                    { "_id": "11", "_score": 0.77, "fields": { "question_text": "What is ML?" } }
                ]
            },
            "usage": { "read_units": 6, "embed_total_tokens": 8 }
        }))
        .unwrap();
        let hit = SearchHit::from(resp.result.hits.into_iter().next().unwrap());
        assert_eq!(hit.id, "11");
        assert_eq!(hit.metadata_text("question_text"), Some("What is ML?"));
    }

    #[test]
    fn test_records_ndjson() {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), json!("quora"));
        let records = vec![
            Record::text("1", "question_text", "How do I learn Python?").with_metadata(metadata),
            Record::text("2", "question_text", "What is machine learning?"),
        ];

        let body = records_ndjson(records).unwrap();
        let lines: Vec<serde_json::Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            json!({ "_id": "1", "question_text": "How do I learn Python?", "source": "quora" })
        );
        assert_eq!(lines[1]["_id"], "2");
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_mixed_batches_rejected() {
        let mixed = vec![Record::dense("1", vec![0.1]), Record::text("2", "t", "x")];
        assert!(matches!(
            dense_vectors(mixed.clone()),
            Err(VectorError::Validation(_))
        ));
        assert!(matches!(
            records_ndjson(mixed),
            Err(VectorError::Validation(_))
        ));
    }
}
