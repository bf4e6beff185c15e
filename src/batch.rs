use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// One successful generation, still linked to the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub prompt_index: usize,
    pub prompt: String,
    pub response: String,
}

/// Successful responses for one model, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBatch {
    entries: Vec<ResponseEntry>,
}

impl ResponseBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: ResponseEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ResponseEntry] {
        &self.entries
    }

    /// Response texts only, in batch order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.response.as_str())
    }

    /// Write the batch as a pretty JSON array.
    pub async fn write_json(&self, path: &Path) -> Result<(), BenchError> {
        let json = serde_json::to_string_pretty(&self.entries)?;

        // Atomic write: temp file + rename prevents partial reads
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn read_json(path: &Path) -> Result<Self, BenchError> {
        let raw = tokio::fs::read(path).await?;
        let entries: Vec<ResponseEntry> = serde_json::from_slice(&raw)?;
        Ok(Self { entries })
    }
}

impl FromIterator<ResponseEntry> for ResponseBatch {
    fn from_iter<I: IntoIterator<Item = ResponseEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
