use std::collections::HashMap;

use tracing::info;

use crate::dataset::SourceRow;
use crate::error::VectorResult;
use crate::models::SearchHit;

/// Fields checked, in order, for inline text on a hit
pub const DEFAULT_TEXT_FIELDS: [&str; 2] = ["question_text", "text"];

/// Shown when neither the lookup table nor the hit carries text
pub const TEXT_UNAVAILABLE: &str = "Text not available";

/// Id → question text, built once at startup from the source dataset
#[derive(Debug, Clone, Default)]
pub struct QuestionLookup {
    entries: HashMap<String, String>,
}

impl QuestionLookup {
    /// Build from source rows, keeping rows with an id and non-empty text.
    ///
    /// Stops at the first unreadable row.
    pub fn from_rows<I>(rows: I) -> VectorResult<Self>
    where
        I: IntoIterator<Item = VectorResult<SourceRow>>,
    {
        let mut entries = HashMap::new();
        for row in rows {
            let row = row?;
            if row.id.is_empty() {
                continue;
            }
            if let Some(text) = row.text() {
                entries.insert(row.id.clone(), text.to_string());
            }
        }

        info!(entries = entries.len(), "Built question text lookup");
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QuestionLookup {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Picks the best available text for a hit:
/// local lookup first, then inline metadata, then `TEXT_UNAVAILABLE`.
#[derive(Debug, Clone)]
pub struct TextResolver {
    lookup: Option<QuestionLookup>,
    metadata_fields: Vec<String>,
}

impl Default for TextResolver {
    fn default() -> Self {
        Self {
            lookup: None,
            metadata_fields: DEFAULT_TEXT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl TextResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup(mut self, lookup: QuestionLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Check `field` before the default metadata fields
    pub fn with_metadata_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.metadata_fields.retain(|f| *f != field);
        self.metadata_fields.insert(0, field);
        self
    }

    pub fn lookup(&self) -> Option<&QuestionLookup> {
        self.lookup.as_ref()
    }

    pub fn resolve<'a>(&'a self, hit: &'a SearchHit) -> &'a str {
        if let Some(text) = self.lookup.as_ref().and_then(|l| l.get(&hit.id)) {
            return text;
        }

        self.metadata_fields
            .iter()
            .find_map(|field| hit.metadata_text(field))
            .unwrap_or(TEXT_UNAVAILABLE)
    }
}
