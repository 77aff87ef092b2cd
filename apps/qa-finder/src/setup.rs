//! Index preparation shared by every command that talks to the index

use std::io::Write;
use std::path::Path;

use domain_vector::{
    IndexManager, IndexSpec, IndexState, IngestOptions, JsonLinesSource, QaFinder, UpsertReport,
    VectorRepository,
};
use eyre::{Result, WrapErr, eyre};
use tracing::info;

/// Make sure the index exists and holds data, loading `dataset` when it is
/// new or empty, or always when `force` is set.
///
/// Returns the load report, or `None` when nothing was loaded.
pub async fn prepare_index<R, W>(
    finder: &QaFinder<R>,
    spec: IndexSpec,
    dataset: Option<&Path>,
    options: IngestOptions,
    force: bool,
    out: &mut W,
) -> Result<Option<UpsertReport>>
where
    R: VectorRepository + IndexManager,
    W: Write,
{
    let name = spec.name.clone();
    let state = finder
        .ensure_index(spec)
        .await
        .wrap_err_with(|| format!("Failed to prepare index '{}'", name))?;

    match state {
        IndexState::Created => writeln!(out, "Created index '{}'", name)?,
        IndexState::Empty => writeln!(out, "Index is empty, loading data...")?,
        IndexState::Populated(count) => writeln!(out, "Index contains {} vectors", count)?,
    }
    out.flush()?;

    if !state.needs_data() && !force {
        return Ok(None);
    }

    let dataset = dataset.ok_or_else(|| {
        eyre!(
            "Index '{}' has no data and no dataset is configured: \
             set QA_DATASET or run `qa-finder index --dataset PATH`",
            name
        )
    })?;

    info!(index = %name, dataset = %dataset.display(), "Loading dataset");
    let rows = JsonLinesSource::open(dataset)?;
    let report = finder
        .load(rows, options)
        .await
        .wrap_err("Batch load failed")?;

    writeln!(
        out,
        "Upserted {} records in {} batches ({} skipped)",
        report.upserted,
        report.batches.len(),
        report.skipped
    )?;
    out.flush()?;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use domain_vector::{
        FinderConfig, IndexRef, IndexStats, Record, SearchHit, SearchQuery, VectorResult,
    };

    const INDEX: &str = "quora-questions";

    /// Store that tracks index creation and upserted records
    #[derive(Default)]
    struct TrackingStore {
        exists: bool,
        vector_count: u64,
        created: Mutex<Vec<IndexSpec>>,
        upserted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VectorRepository for TrackingStore {
        async fn upsert(&self, _index: &IndexRef, records: Vec<Record>) -> VectorResult<usize> {
            let count = records.len();
            self.upserted
                .lock()
                .unwrap()
                .extend(records.into_iter().map(|r| r.id));
            Ok(count)
        }

        async fn search(
            &self,
            _index: &IndexRef,
            _query: SearchQuery,
        ) -> VectorResult<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl IndexManager for TrackingStore {
        async fn has_index(&self, name: &str) -> VectorResult<bool> {
            Ok(self.exists && name == INDEX)
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

    /// Writes a small dataset under the temp dir, one file per test
    fn dataset(test: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "qa-finder-{}-{}.jsonl",
            std::process::id(),
            test
        ));
        let rows = [
            r#"{"id": "1", "values": [0.1, 0.2, 0.3], "blob": {"text": "How do I learn Python?"}}"#,
            r#"{"id": "2", "values": [0.4, 0.5, 0.6], "blob": {"text": "What is machine learning?"}}"#,
            r#"{"id": "3", "values": [0.7, 0.8, 0.9], "blob": {"text": "   "}}"#,
        ];
        fs::write(&path, rows.join("\n")).unwrap();
        path
    }

    fn finder(store: TrackingStore) -> QaFinder<TrackingStore> {
        QaFinder::new(store, FinderConfig::new(IndexRef::new(INDEX)))
    }

    async fn prepare(
        finder: &QaFinder<TrackingStore>,
        dataset: Option<&Path>,
        force: bool,
    ) -> (Result<Option<UpsertReport>>, String) {
        let mut out = Vec::new();
        let result = prepare_index(
            finder,
            IndexSpec::dense(INDEX, 3),
            dataset,
            IngestOptions::dense(3, "question_text"),
            force,
            &mut out,
        )
        .await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_missing_index_is_created_and_loaded() {
        let path = dataset("created");
        let finder = finder(TrackingStore::default());

        let (result, out) = prepare(&finder, Some(&path), false).await;
        fs::remove_file(&path).ok();

        let report = result.unwrap().unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(finder.repository().created.lock().unwrap().len(), 1);
        assert_eq!(*finder.repository().upserted.lock().unwrap(), ["1", "2"]);
        assert_eq!(
            out,
            format!(
                "Created index '{}'\nUpserted 2 records in 1 batches (1 skipped)\n",
                INDEX
            )
        );
    }

    #[tokio::test]
    async fn test_empty_index_without_dataset_fails() {
        let finder = finder(TrackingStore {
            exists: true,
            ..TrackingStore::default()
        });

        let (result, out) = prepare(&finder, None, false).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("QA_DATASET"));
        assert_eq!(out, "Index is empty, loading data...\n");
        assert!(finder.repository().upserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_populated_index_is_left_alone() {
        let finder = finder(TrackingStore {
            exists: true,
            vector_count: 404_290,
            ..TrackingStore::default()
        });

        let (result, out) = prepare(&finder, None, false).await;

        assert!(result.unwrap().is_none());
        assert_eq!(out, "Index contains 404290 vectors\n");
        assert!(finder.repository().created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_force_reloads_populated_index() {
        let path = dataset("force");
        let finder = finder(TrackingStore {
            exists: true,
            vector_count: 2,
            ..TrackingStore::default()
        });

        let (result, _) = prepare(&finder, Some(&path), true).await;
        fs::remove_file(&path).ok();

        assert_eq!(result.unwrap().unwrap().upserted, 2);
        assert_eq!(finder.repository().upserted.lock().unwrap().len(), 2);
    }
}
