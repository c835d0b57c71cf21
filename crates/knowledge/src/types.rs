//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A retrievable passage produced by the chunker.
///
/// `index` reflects the passage's position in the original document and
/// becomes the `chunk_index` of the stored payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Position within the document (0-indexed)
    pub index: u32,

    /// Passage text
    pub content: String,

    /// Length in characters
    pub char_count: usize,

    /// Length in bytes
    pub byte_len: usize,
}

impl Passage {
    pub fn new(index: u32, content: String) -> Self {
        let char_count = content.chars().count();
        let byte_len = content.len();
        Self {
            index,
            content,
            char_count,
            byte_len,
        }
    }
}

/// Metadata stored alongside a vector.
///
/// `chunk_index` and `content` are always present; any other keys are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub chunk_index: u32,

    pub content: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Payload {
    pub fn new(chunk_index: u32, content: impl Into<String>) -> Self {
        Self {
            chunk_index,
            content: content.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Attach an extra key/value pair.
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Identifier of a stored vector, derived from collection and chunk index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorId(String);

impl VectorId {
    pub fn new(collection_id: &str, chunk_index: u32) -> Self {
        Self(format!("{}:{}", collection_id, chunk_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A search hit, ordered by descending similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub payload: Payload,

    pub similarity_score: f32,
}
