use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{SqliteTaskStore, TaskStore, create_provider};

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let provider = create_provider(&config.embedding)?;
    let provider_reachable = match provider.health_check().await {
        Ok(()) => true,
        Err(e) => {
            if verbose {
                eprintln!("Provider health check failed: {}", e);
            }
            false
        }
    };

    let store = super::open_store(&config)?;
    let collections = store.collection_names()?;

    let task_db = config.task_db_path();
    let tasks_total = SqliteTaskStore::open(&task_db)
        .and_then(|s| s.list())
        .map(|tasks| tasks.len())
        .unwrap_or(0);

    let status = StatusInfo {
        provider: config.embedding.provider.to_string(),
        model: provider.model().to_string(),
        provider_reachable,
        persist_dir: config.persist_dir().display().to_string(),
        collections,
        task_db: task_db.display().to_string(),
        tasks_total,
    };

    print!("{}", formatter.format_status(&status));
    Ok(())
}
