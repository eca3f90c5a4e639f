//! Chunk model: the atomic unit of embedding and retrieval.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key carrying the origin tag of a chunk (e.g. an upload label).
pub const SOURCE_KEY: &str = "source";

/// A contiguous text segment plus source metadata.
///
/// Produced by a chunker, consumed by embedding or returned to the caller.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry, builder-style.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Content length in characters.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The origin tag stored under [`SOURCE_KEY`], if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}
