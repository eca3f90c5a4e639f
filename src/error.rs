//! Error types for the knowledge-base CLI.

use thiserror::Error;

/// Errors raised while resolving a chunking strategy or splitting a file.
///
/// All variants surface synchronously to the caller; chunking never retries.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid splitter mode: {0}")]
    InvalidSplitter(String),

    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),

    #[error("file read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF extraction error: {0}")]
    Pdf(String),

    #[error("embedding error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors related to embedding providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("embedding provider unreachable: {0}")]
    Unavailable(String),

    #[error("missing provider credentials: {0}")]
    MissingCredentials(String),

    #[error("embedding request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors related to the per-collection vector index.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("index lock poisoned")]
    LockPoisoned,

    #[error("embedding error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors related to the durable task store.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error("task store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("task store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("task store lock poisoned")]
    LockPoisoned,
}

/// Errors related to embedding task lifecycle.
///
/// A failure inside a running worker is recorded in the task's persisted
/// status before the error reaches the worker's host task; status polling is
/// the only channel visible to outside callers.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("task map lock poisoned")]
    LockPoisoned,

    #[error("task store error: {0}")]
    Store(#[from] TaskStoreError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] StoreError),

    #[error("embedding error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors related to search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("embedding error: {0}")]
    Provider(#[from] ProviderError),
}

impl SearchError {
    /// True when the underlying cause is a missing collection.
    pub fn is_collection_not_found(&self) -> bool {
        matches!(self, SearchError::Store(StoreError::CollectionNotFound(_)))
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("task error: {0}")]
    Task(#[from] TaskError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}
