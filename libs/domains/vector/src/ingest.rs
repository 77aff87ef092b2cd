//! Batch upsert of source rows into a vector index.
//!
//! Rows are filtered, turned into records, packed into batches of at most
//! `batch_size`, and sent to the store one batch at a time. A rejected batch
//! aborts the run; nothing is retried or rolled back, so every valid row is
//! sent at most once.

use tracing::{debug, info, warn};

use crate::dataset::SourceRow;
use crate::error::{VectorError, VectorResult};
use crate::models::{Metadata, Record};
use crate::repository::{IndexRef, VectorRepository};

/// Default batch size for dense vector upserts
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Largest batch the store accepts for records embedded server-side
pub const MAX_TEXT_BATCH_SIZE: usize = 96;

/// How a valid row becomes a record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordShape {
    /// Precomputed vector of exactly `dimension` values; the text is kept
    /// in metadata under `text_field`
    Dense { dimension: u32, text_field: String },
    /// Raw text under `field`, embedded by the store
    Text { field: String },
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub batch_size: usize,
    /// Stop after this many valid rows
    pub max_records: Option<usize>,
    pub shape: RecordShape,
    /// Extra metadata merged into every record, e.g. `source: quora`
    pub extra_metadata: Metadata,
}

impl IngestOptions {
    pub fn dense(dimension: u32, text_field: impl Into<String>) -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_records: None,
            shape: RecordShape::Dense {
                dimension,
                text_field: text_field.into(),
            },
            extra_metadata: Metadata::new(),
        }
    }

    pub fn text(field: impl Into<String>) -> Self {
        Self {
            batch_size: MAX_TEXT_BATCH_SIZE,
            max_records: None,
            shape: RecordShape::Text {
                field: field.into(),
            },
            extra_metadata: Metadata::new(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_metadata.insert(key.into(), value);
        self
    }

    /// Batch size actually used: validated, and clamped for text records
    fn effective_batch_size(&self) -> VectorResult<usize> {
        if self.batch_size == 0 {
            return Err(VectorError::Validation(
                "Batch size must be at least 1".to_string(),
            ));
        }

        match self.shape {
            RecordShape::Text { .. } if self.batch_size > MAX_TEXT_BATCH_SIZE => {
                warn!(
                    requested = self.batch_size,
                    max = MAX_TEXT_BATCH_SIZE,
                    "Batch size too large for integrated embedding, clamping"
                );
                Ok(MAX_TEXT_BATCH_SIZE)
            }
            _ => Ok(self.batch_size),
        }
    }
}

/// Why a row was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyId,
    MissingText,
    MissingVector,
    DimensionMismatch { expected: usize, actual: usize },
}

/// Outcome of a completed load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Records the store reported as written
    pub upserted: usize,
    pub skipped: usize,
    /// Records sent in each upsert call, in call order
    pub batches: Vec<usize>,
    /// Whether the run stopped at `max_records` rather than at the end of the source
    pub capped: bool,
}

/// Turn one source row into a record, or say why it is skipped.
pub fn build_record(
    row: SourceRow,
    shape: &RecordShape,
    extra_metadata: &Metadata,
) -> Result<Record, SkipReason> {
    if row.id.trim().is_empty() {
        return Err(SkipReason::EmptyId);
    }
    let text = row.text().ok_or(SkipReason::MissingText)?.to_string();

    let mut metadata = scalar_metadata(row.metadata);
    for (key, value) in extra_metadata {
        metadata.insert(key.clone(), value.clone());
    }

    let record = match shape {
        RecordShape::Dense {
            dimension,
            text_field,
        } => {
            let values = row.values.ok_or(SkipReason::MissingVector)?;
            let expected = *dimension as usize;
            if values.len() != expected {
                return Err(SkipReason::DimensionMismatch {
                    expected,
                    actual: values.len(),
                });
            }
            metadata.insert(text_field.clone(), serde_json::Value::String(text));
            Record::dense(row.id, values)
        }
        RecordShape::Text { field } => Record::text(row.id, field.clone(), text),
    };

    Ok(if metadata.is_empty() {
        record
    } else {
        record.with_metadata(metadata)
    })
}

/// The store only takes flat metadata; nested values and nulls are dropped
fn scalar_metadata(metadata: Option<Metadata>) -> Metadata {
    metadata
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, v)| v.is_string() || v.is_number() || v.is_boolean())
        .collect()
}

/// Packs source rows into bounded batches and upserts them sequentially
pub struct BatchUpserter<'a, R: ?Sized> {
    repository: &'a R,
    index: IndexRef,
    options: IngestOptions,
}

impl<'a, R: VectorRepository + ?Sized> BatchUpserter<'a, R> {
    pub fn new(repository: &'a R, index: IndexRef, options: IngestOptions) -> Self {
        Self {
            repository,
            index,
            options,
        }
    }

    /// Run the load to completion, or until `max_records` valid rows are sent.
    ///
    /// The source is not advanced past the last row that is needed.
    pub async fn run<I>(&self, rows: I) -> VectorResult<UpsertReport>
    where
        I: IntoIterator<Item = VectorResult<SourceRow>>,
    {
        let batch_size = self.options.effective_batch_size()?;
        let max_records = self.options.max_records;
        let mut report = UpsertReport::default();

        if max_records == Some(0) {
            report.capped = true;
            return Ok(report);
        }

        let mut batch: Vec<Record> = Vec::with_capacity(batch_size);
        let mut accepted = 0usize;

        for row in rows {
            let row = row?;
            let id = row.id.clone();

            match build_record(row, &self.options.shape, &self.options.extra_metadata) {
                Ok(record) => {
                    batch.push(record);
                    accepted += 1;
                }
                Err(reason) => {
                    debug!(id = %id, reason = ?reason, "Skipping row");
                    report.skipped += 1;
                    continue;
                }
            }

            if batch.len() >= batch_size {
                self.flush(&mut batch, &mut report).await?;
            }

            if max_records.is_some_and(|max| accepted >= max) {
                report.capped = true;
                break;
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, &mut report).await?;
        }

        info!(
            index = %self.index,
            upserted = report.upserted,
            skipped = report.skipped,
            batches = report.batches.len(),
            capped = report.capped,
            "Batch load finished"
        );
        Ok(report)
    }

    async fn flush(&self, batch: &mut Vec<Record>, report: &mut UpsertReport) -> VectorResult<()> {
        let records = std::mem::take(batch);
        let size = records.len();

        let accepted = self
            .repository
            .upsert(&self.index, records)
            .await
            .map_err(|e| {
                warn!(
                    index = %self.index,
                    batch = report.batches.len() + 1,
                    upserted_so_far = report.upserted,
                    error = %e,
                    "Upsert failed, aborting load"
                );
                e
            })?;

        if accepted != size {
            warn!(sent = size, accepted, "Store accepted a different number of records");
        }

        report.upserted += accepted;
        report.batches.push(size);
        info!(
            batch = report.batches.len(),
            size,
            accepted,
            total = report.upserted,
            "Upserted batch"
        );
        Ok(())
    }
}
