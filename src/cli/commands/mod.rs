mod chunk;
mod collections;
mod config;
mod embed;
mod search;
mod serve;
mod status;
mod tags;
mod task;

pub use chunk::ChunkArgs;
pub use embed::EmbedArgs;
pub use search::SearchArgs;
pub use tags::TagsCommand;
pub use task::TaskCommand;

pub use chunk::handle_chunk;
pub use collections::handle_collections;
pub use config::ConfigCommand;
pub use config::handle_config;
pub use embed::handle_embed;
pub use search::handle_search;
pub use serve::handle_serve;
pub use status::handle_status;
pub use tags::handle_tags;
pub use task::handle_task;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::models::Config;
use crate::services::{SqliteTaskStore, TaskManager, VectorStore, create_provider};

/// Open the vector store for the configured provider and persist directory.
pub(crate) fn open_store(config: &Config) -> Result<Arc<VectorStore>> {
    let provider = create_provider(&config.embedding).context("failed to initialize provider")?;
    Ok(Arc::new(VectorStore::new(config.persist_dir(), provider)))
}

/// Open the task manager on top of the durable task store.
pub(crate) fn open_manager(config: &Config, store: Arc<VectorStore>) -> Result<TaskManager> {
    let durable = Arc::new(
        SqliteTaskStore::open(&config.task_db_path()).context("failed to open task store")?,
    );
    Ok(TaskManager::new(store, durable))
}
