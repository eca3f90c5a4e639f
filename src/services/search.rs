//! Search executor: validated similarity/diversity queries against a named
//! collection.

use std::sync::Arc;

use crate::error::SearchError;
use crate::models::{Chunk, SearchConfig, SearchMode, SearchOptions};
use crate::services::vector_store::VectorStore;

pub struct SearchExecutor {
    store: Arc<VectorStore>,
    config: SearchConfig,
}

impl SearchExecutor {
    pub fn new(store: Arc<VectorStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Run a query against a collection, ordered by descending relevance.
    ///
    /// An empty `tags` slice means no filtering. For MMR, `fetch_k`
    /// defaults to the configured multiple of `top_k` and must not be
    /// smaller than `top_k`.
    pub async fn search(
        &self,
        collection_name: &str,
        tags: &[String],
        query: &str,
        top_k: usize,
        mode: SearchMode,
        opts: &SearchOptions,
    ) -> Result<Vec<Chunk>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }
        if top_k < 1 {
            return Err(SearchError::InvalidQuery(
                "top_k must be at least 1".to_string(),
            ));
        }

        let mut opts = opts.clone();
        if mode == SearchMode::Mmr {
            let fetch_k = opts
                .fetch_k
                .unwrap_or(self.config.mmr_pool_multiplier * top_k);
            if fetch_k < top_k {
                return Err(SearchError::InvalidQuery(format!(
                    "fetch_k ({}) must be at least top_k ({})",
                    fetch_k, top_k
                )));
            }
            opts.fetch_k = Some(fetch_k);
        }

        let results = self
            .store
            .similarity_search(collection_name, query, top_k, mode, tags, &opts)
            .await?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::TaskState;
    use crate::services::provider::testing::HashProvider;
    use crate::services::task_store::SqliteTaskStore;
    use crate::services::tasks::TaskManager;
    use std::time::Duration;

    fn executor(store: &Arc<VectorStore>) -> SearchExecutor {
        SearchExecutor::new(Arc::clone(store), SearchConfig::default())
    }

    #[tokio::test]
    async fn test_rejects_zero_top_k() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(HashProvider)));
        let result = executor(&store)
            .search(
                "any",
                &[],
                "query",
                0,
                SearchMode::Similarity,
                &SearchOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(SearchError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_rejects_fetch_k_below_top_k() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(HashProvider)));
        let opts = SearchOptions {
            fetch_k: Some(2),
            lambda: None,
        };
        let result = executor(&store)
            .search("any", &[], "query", 5, SearchMode::Mmr, &opts)
            .await;
        assert!(matches!(result, Err(SearchError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_unknown_collection_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(HashProvider)));
        let result = executor(&store)
            .search(
                "never-written",
                &[],
                "query",
                3,
                SearchMode::Similarity,
                &SearchOptions::default(),
            )
            .await;
        match result {
            Err(error) => {
                assert!(error.is_collection_not_found());
                assert!(matches!(
                    error,
                    SearchError::Store(StoreError::CollectionNotFound(_))
                ));
            }
            Ok(_) => panic!("expected a collection-not-found error"),
        }
    }

    /// Full pipeline: submit ten short facts, wait for completion, then
    /// search the freshly built collection.
    #[tokio::test]
    async fn test_embed_then_search_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(HashProvider)));
        let durable = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
        let manager = TaskManager::new(Arc::clone(&store), durable);

        let texts: Vec<String> = [
            "Alice and Bob are siblings.",
            "Bob and Charlie are best friends.",
            "Charlie and Dave work together.",
            "Dave and Eve are neighbors.",
            "Eve and Alice went to the same school.",
            "Alice and Charlie are cousins.",
            "Bob and Dave play in the same football team.",
            "Charlie and Eve are in the same book club.",
            "Dave and Alice volunteer at the same charity.",
            "Eve and Bob are gym buddies.",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let task_id = manager.submit("test_embedding", vec![], texts).unwrap();
        for _ in 0..200 {
            let status = manager.get_status(&task_id).unwrap();
            if status.status.is_terminal() {
                assert_eq!(status.status, TaskState::Completed);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let results = executor(&store)
            .search(
                "test_embedding",
                &[],
                "Who are siblings?",
                3,
                SearchMode::Similarity,
                &SearchOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].content.contains("Alice and Bob are siblings."));
    }
}
