//! Source rows for batch loading, read lazily from a JSON Lines file.
//!
//! Each line mirrors one row of a precomputed-embedding dataset:
//!
//! ```json
//! {"id": "412", "values": [0.01, ...], "metadata": {...}, "blob": {"text": "How do I ...?"}}
//! ```
//!
//! `id` may be a string or a number. The text used for display and for
//! server-side embedding is `blob.text`, trimmed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{VectorError, VectorResult};
use crate::models::Metadata;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceRow {
    #[serde(default, deserialize_with = "id_to_string")]
    pub id: String,
    #[serde(default)]
    pub values: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub blob: Option<serde_json::Value>,
}

impl SourceRow {
    /// Trimmed `blob.text`, if present and non-empty
    pub fn text(&self) -> Option<&str> {
        self.blob
            .as_ref()?
            .get("text")?
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

fn id_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Lazy iterator over the rows of a JSON Lines source.
///
/// Blank lines are skipped. A line that fails to parse yields an error
/// naming its line number; iteration may continue after it.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> VectorResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            VectorError::Dataset(format!("Cannot open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = VectorResult<SourceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    let line = self.buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(line).map_err(|e| {
                        VectorError::Dataset(format!("line {}: {}", self.line_no, e))
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
