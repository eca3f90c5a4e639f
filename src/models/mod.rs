mod chunk;
mod config;
mod search;
mod task;

pub use chunk::{Chunk, SOURCE_KEY};
pub use config::{
    ChunkingConfig, Config, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL,
    DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL, DaemonConfig, EmbeddingConfig, ProviderKind,
    SearchConfig, StoreConfig, TaskStoreConfig,
};
pub use search::{OutputFormat, SearchMode, SearchOptions, SearchRequest, SearchResults};
pub use task::{EmbeddingRequest, TaskRecord, TaskState, TaskStatus};
