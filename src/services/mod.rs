pub mod provider;
mod search;
mod task_store;
mod tasks;
mod vector_store;

pub use provider::{EmbeddingProvider, cosine_similarity, create_provider};
pub use search::SearchExecutor;
pub use task_store::{SqliteTaskStore, TaskStore};
pub use tasks::TaskManager;
pub use vector_store::{DEFAULT_MMR_LAMBDA, DEFAULT_SOURCE, StoredPoint, VectorStore};
