//! End-to-end finder behaviour against an in-memory store

mod common;

use common::{InMemoryStore, valid_row};
use domain_vector::*;
use serde_json::json;

fn finder(store: InMemoryStore) -> QaFinder<InMemoryStore> {
    let config = FinderConfig::new(IndexRef::new("quora-simple-semantic"))
        .with_mode(QueryMode::Integrated)
        .with_top_k(3);
    QaFinder::new(store, config)
}

fn ranked_hits() -> Vec<SearchHit> {
    let text = |t: &str| json!({ "question_text": t }).as_object().cloned().unwrap();
    vec![
        SearchHit::new("10", 0.93127).with_metadata(text("How can I learn Python quickly?")),
        SearchHit::new("11", 0.85).with_metadata(text("What is the best way to learn Python?")),
        SearchHit::new("12", 0.5),
    ]
}

#[tokio::test]
async fn test_ensure_index_creates_missing_index() {
    let finder = finder(InMemoryStore::new());
    let spec = IndexSpec::integrated("quora-simple-semantic", "llama-text-embed-v2", "question_text");

    let state = finder.ensure_index(spec.clone()).await.unwrap();

    assert_eq!(state, IndexState::Created);
    assert!(state.needs_data());
    assert_eq!(*finder.repository().created.lock().unwrap(), vec![spec]);
}

#[tokio::test]
async fn test_ensure_index_reports_empty_and_populated() {
    let empty = finder(InMemoryStore {
        existing_index: Some("quora-simple-semantic".to_string()),
        ..InMemoryStore::new()
    });
    let spec = IndexSpec::integrated("quora-simple-semantic", "llama-text-embed-v2", "question_text");
    assert_eq!(empty.ensure_index(spec.clone()).await.unwrap(), IndexState::Empty);

    let populated = finder(InMemoryStore {
        existing_index: Some("quora-simple-semantic".to_string()),
        vector_count: 1200,
        ..InMemoryStore::new()
    });
    let state = populated.ensure_index(spec).await.unwrap();
    assert_eq!(state, IndexState::Populated(1200));
    assert!(!state.needs_data());
    assert!(populated.repository().created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ensure_index_rejects_other_name() {
    let finder = finder(InMemoryStore::new());
    let err = finder
        .ensure_index(IndexSpec::dense("something-else", 384))
        .await
        .unwrap_err();
    assert!(matches!(err, VectorError::Validation(_)));
}

#[tokio::test]
async fn test_integrated_search_sends_text_and_fields() {
    let finder = finder(InMemoryStore::with_hits(ranked_hits()));

    let hits = finder.find_similar("  How do I learn Python programming?  ").await.unwrap();
    assert_eq!(hits.len(), 3);

    let searches = finder.repository().searches.lock().unwrap();
    assert_eq!(
        searches[0].input,
        QueryInput::Text("How do I learn Python programming?".to_string())
    );
    assert_eq!(searches[0].top_k, 3);
    assert_eq!(searches[0].fields, vec!["question_text".to_string()]);
}

#[tokio::test]
async fn test_blank_question_is_not_searched() {
    let finder = finder(InMemoryStore::with_hits(ranked_hits()));

    assert!(finder.find_similar("   ").await.is_err());
    assert!(finder.find_similar_or_empty("").await.is_empty());
    assert!(finder.repository().searches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rendered_results_follow_store_order() {
    let finder = finder(InMemoryStore::with_hits(ranked_hits()));
    let hits = finder.find_similar("How do I learn Python programming?").await.unwrap();

    let lookup: QuestionLookup = [("12", "Is Python good for beginners?")].into_iter().collect();
    let resolver = TextResolver::new()
        .with_lookup(lookup)
        .with_metadata_field("question_text");
    let rendered = render_results("How do I learn Python programming?", &hits, &resolver);

    let scores: Vec<&str> = rendered.lines().filter(|l| l.contains("Score:")).collect();
    assert_eq!(
        scores,
        vec!["1. Score: 0.9313", "2. Score: 0.8500", "3. Score: 0.5000"]
    );

    let questions: Vec<&str> = rendered
        .lines()
        .filter_map(|l| l.strip_prefix("   Question: "))
        .collect();
    assert_eq!(
        questions,
        vec![
            "How can I learn Python quickly?",
            "What is the best way to learn Python?",
            "Is Python good for beginners?",
        ]
    );
    assert!(rendered.starts_with("Question: 'How do I learn Python programming?'\n"));
    assert!(rendered.contains("Found 3 similar questions:"));
}

#[tokio::test]
async fn test_unknown_id_shows_placeholder() {
    let finder = finder(InMemoryStore::with_hits(vec![SearchHit::new("404", 0.1)]));
    let hits = finder.find_similar("What is machine learning?").await.unwrap();

    let rendered = render_results("What is machine learning?", &hits, &TextResolver::new());
    assert!(rendered.contains(&format!("   Question: {}\n", TEXT_UNAVAILABLE)));
}

#[tokio::test]
async fn test_load_through_finder_then_lookup_from_same_rows() {
    let finder = finder(InMemoryStore::new());
    let rows: Vec<SourceRow> = (0..5).map(valid_row).collect();

    let report = finder
        .load(rows.iter().cloned().map(Ok), IngestOptions::text("question_text"))
        .await
        .unwrap();
    assert_eq!(report.upserted, 5);

    let lookup = QuestionLookup::from_rows(rows.into_iter().map(Ok)).unwrap();
    assert_eq!(lookup.len(), 5);
    assert_eq!(lookup.get("3"), Some("Question number 3?"));
}
