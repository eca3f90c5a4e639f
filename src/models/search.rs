//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};

use super::chunk::Chunk;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// How results are selected from the candidate pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Pure nearest-neighbor by cosine distance
    #[default]
    Similarity,
    /// Maximal marginal relevance: relevance balanced against diversity
    Mmr,
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "similarity" | "default" => Ok(SearchMode::Similarity),
            "mmr" => Ok(SearchMode::Mmr),
            _ => Err(format!("unknown search type: {}", s)),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Similarity => write!(f, "similarity"),
            SearchMode::Mmr => write!(f, "mmr"),
        }
    }
}

/// Extra knobs for a search call. All optional; defaults come from
/// [`super::config::SearchConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Candidate pool size for MMR re-ranking. Defaults to 5x top_k.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_k: Option<usize>,

    /// MMR relevance/diversity balance in [0, 1]; 1.0 is pure relevance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda: Option<f32>,
}

/// A search request as received from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub query: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub search_type: SearchMode,

    #[serde(default)]
    pub content_only: bool,

    #[serde(default)]
    pub opts: SearchOptions,
}

fn default_top_k() -> usize {
    10
}

/// Search response: matched chunks in descending relevance order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub total: usize,
    pub contents: Vec<Chunk>,
}

impl SearchResults {
    pub fn new(contents: Vec<Chunk>) -> Self {
        Self {
            total: contents.len(),
            contents,
        }
    }
}
