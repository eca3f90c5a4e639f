//! Vector store adapter: a persistent per-collection index behind the
//! configured embedding provider.
//!
//! Each collection is one JSON index file under the persist directory,
//! replaced atomically on every write. Every stored point gets a fresh
//! UUID, so concurrent writers into the same collection can never collide
//! on an id.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Chunk, SOURCE_KEY, SearchMode, SearchOptions};
use crate::services::provider::{EmbeddingProvider, cosine_similarity};

/// Origin tag recorded when a write carries no tags.
pub const DEFAULT_SOURCE: &str = "upload";

/// MMR relevance/diversity balance when the caller does not set one.
pub const DEFAULT_MMR_LAMBDA: f32 = 0.5;

/// One embedded chunk as persisted in a collection index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPoint {
    pub id: String,
    pub content: String,
    pub vector: Vec<f32>,
    pub metadata: BTreeMap<String, String>,

    #[serde(default)]
    pub created_at: String,
}

impl StoredPoint {
    fn source(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .map(String::as_str)
            .unwrap_or(DEFAULT_SOURCE)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexData {
    points: HashMap<String, StoredPoint>,
}

/// In-process handle on one collection's index file.
struct CollectionIndex {
    path: PathBuf,
    data: RwLock<IndexData>,
}

impl CollectionIndex {
    fn open(path: PathBuf) -> Result<Self, StoreError> {
        let data = if path.exists() {
            let content = fs::read(&path)?;
            serde_json::from_slice(&content)?
        } else {
            IndexData::default()
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn insert(&self, point: StoredPoint) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|_| StoreError::LockPoisoned)?;
        data.points.insert(point.id.clone(), point);
        self.write_to_disk(&data)
    }

    /// Atomic replace: serialize to a temp file, then rename over the index.
    fn write_to_disk(&self, data: &IndexData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("tmp");
        let json = serde_json::to_vec(data)?;
        fs::write(&temp_path, json)?;
        fs::rename(temp_path, &self.path)?;
        Ok(())
    }

    fn scored_points(
        &self,
        query_vector: &[f32],
        tag_filter: &[String],
        limit: usize,
    ) -> Result<Vec<(StoredPoint, f32)>, StoreError> {
        let data = self.data.read().map_err(|_| StoreError::LockPoisoned)?;

        let mut results: Vec<(StoredPoint, f32)> = data
            .points
            .values()
            .filter(|point| tag_filter.is_empty() || tag_filter.iter().any(|t| t == point.source()))
            .map(|point| {
                let score = cosine_similarity(query_vector, &point.vector);
                (point.clone(), score)
            })
            .collect();

        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        results.truncate(limit);

        Ok(results)
    }

    fn source_tags(&self) -> Result<BTreeSet<String>, StoreError> {
        let data = self.data.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(data
            .points
            .values()
            .map(|point| point.source().to_string())
            .collect())
    }

    fn delete_by_source(&self, tag: &str) -> Result<usize, StoreError> {
        let mut data = self.data.write().map_err(|_| StoreError::LockPoisoned)?;
        let before = data.points.len();
        data.points.retain(|_, point| point.source() != tag);
        let removed = before - data.points.len();
        if removed > 0 {
            self.write_to_disk(&data)?;
        }
        Ok(removed)
    }
}

/// Uniform interface over the embedding provider and the on-disk index.
pub struct VectorStore {
    persist_dir: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    open: RwLock<HashMap<String, Arc<CollectionIndex>>>,
}

impl VectorStore {
    pub fn new(persist_dir: impl Into<PathBuf>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            persist_dir: persist_dir.into(),
            provider,
            open: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.persist_dir.join(format!("{}.json", name))
    }

    /// Collection names map directly to file names; keep them boring.
    fn validate_name(name: &str) -> Result<(), StoreError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
        if valid {
            Ok(())
        } else {
            Err(StoreError::InvalidCollectionName(name.to_string()))
        }
    }

    /// Handle on a collection, creating it implicitly when `create` is set.
    fn open_collection(&self, name: &str, create: bool) -> Result<Arc<CollectionIndex>, StoreError> {
        Self::validate_name(name)?;

        if let Some(index) = self
            .open
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(name)
        {
            return Ok(Arc::clone(index));
        }

        let path = self.collection_path(name);
        if !create && !path.exists() {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }

        let mut open = self.open.write().map_err(|_| StoreError::LockPoisoned)?;
        // Double-checked: another caller may have opened it meanwhile.
        if let Some(index) = open.get(name) {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(CollectionIndex::open(path)?);
        open.insert(name.to_string(), Arc::clone(&index));
        Ok(index)
    }

    /// Embed one chunk and persist it into the named collection, minting a
    /// fresh unique id for the stored point.
    pub async fn embed_and_store(
        &self,
        collection_name: &str,
        chunk: &Chunk,
        tags: &[String],
    ) -> Result<String, StoreError> {
        let index = self.open_collection(collection_name, true)?;

        let texts = vec![chunk.content.clone()];
        let vector = self
            .provider
            .embed_batch(&texts)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StoreError::Provider(crate::error::ProviderError::InvalidResponse(
                    "empty embedding response".to_string(),
                ))
            })?;

        let mut metadata = chunk.metadata.clone();
        let source = tags.first().cloned().unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        metadata.insert(SOURCE_KEY.to_string(), source);

        let id = Uuid::new_v4().to_string();
        index.insert(StoredPoint {
            id: id.clone(),
            content: chunk.content.clone(),
            vector,
            metadata,
            created_at: chrono::Utc::now().to_rfc3339(),
        })?;

        Ok(id)
    }

    /// Query the named collection, ordered by descending relevance.
    ///
    /// `tag_filter` restricts candidates to points whose source tag is in
    /// the set; an empty set means no filter.
    pub async fn similarity_search(
        &self,
        collection_name: &str,
        query: &str,
        top_k: usize,
        mode: SearchMode,
        tag_filter: &[String],
        opts: &SearchOptions,
    ) -> Result<Vec<Chunk>, StoreError> {
        let index = self.open_collection(collection_name, false)?;
        let query_vector = self.provider.embed_query(query).await?;

        let selected = match mode {
            SearchMode::Similarity => index.scored_points(&query_vector, tag_filter, top_k)?,
            SearchMode::Mmr => {
                let fetch_k = opts.fetch_k.unwrap_or(top_k * 5).max(top_k);
                let lambda = opts.lambda.unwrap_or(DEFAULT_MMR_LAMBDA);
                let pool = index.scored_points(&query_vector, tag_filter, fetch_k)?;
                mmr_select(pool, top_k, lambda)
            }
        };

        Ok(selected
            .into_iter()
            .map(|(point, score)| {
                let mut chunk = Chunk::new(point.content);
                chunk.metadata = point.metadata;
                chunk
                    .with_metadata("id", point.id)
                    .with_metadata("score", format!("{:.4}", score))
            })
            .collect())
    }

    /// Names of all collections that exist on disk or are open in-process.
    pub fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = BTreeSet::new();

        if self.persist_dir.exists() {
            for entry in fs::read_dir(&self.persist_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json")
                    && let Some(stem) = path.file_stem()
                {
                    names.insert(stem.to_string_lossy().to_string());
                }
            }
        }

        for name in self
            .open
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .keys()
        {
            names.insert(name.clone());
        }

        Ok(names.into_iter().collect())
    }

    /// Distinct source tags stored in a collection.
    pub fn collection_tags(&self, collection_name: &str) -> Result<BTreeSet<String>, StoreError> {
        let index = self.open_collection(collection_name, false)?;
        index.source_tags()
    }

    /// Remove every point carrying the given source tag. Returns how many
    /// points were removed.
    pub fn delete_tag(&self, collection_name: &str, tag: &str) -> Result<usize, StoreError> {
        let index = self.open_collection(collection_name, false)?;
        index.delete_by_source(tag)
    }
}

/// Greedy maximal-marginal-relevance selection over a scored candidate
/// pool: each step takes the candidate maximizing
/// `lambda * relevance - (1 - lambda) * max-similarity-to-selected`.
fn mmr_select(
    mut pool: Vec<(StoredPoint, f32)>,
    top_k: usize,
    lambda: f32,
) -> Vec<(StoredPoint, f32)> {
    let mut selected: Vec<(StoredPoint, f32)> = Vec::with_capacity(top_k);

    while selected.len() < top_k && !pool.is_empty() {
        let mut best_index = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (i, (candidate, relevance)) in pool.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|(chosen, _)| cosine_similarity(&candidate.vector, &chosen.vector))
                .fold(0.0f32, f32::max);
            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_index = i;
            }
        }

        selected.push(pool.swap_remove(best_index));
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::testing::HashProvider;

    fn store(dir: &Path) -> VectorStore {
        VectorStore::new(dir, Arc::new(HashProvider))
    }

    #[tokio::test]
    async fn test_store_mints_fresh_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let chunk = Chunk::new("same content");

        let id_a = store.embed_and_store("notes", &chunk, &[]).await.unwrap();
        let id_b = store.embed_and_store("notes", &chunk, &[]).await.unwrap();
        assert_ne!(id_a, id_b);

        let results = store
            .similarity_search(
                "notes",
                "same content",
                10,
                SearchMode::Similarity,
                &[],
                &SearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_orders_by_relevance() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        for text in [
            "Alice and Bob are siblings.",
            "Bob and Charlie are best friends.",
            "Dave and Eve are neighbors.",
        ] {
            store
                .embed_and_store("family", &Chunk::new(text), &[])
                .await
                .unwrap();
        }

        let results = store
            .similarity_search(
                "family",
                "Who are siblings?",
                3,
                SearchMode::Similarity,
                &[],
                &SearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].content.contains("Alice and Bob are siblings."));
    }

    #[tokio::test]
    async fn test_tag_filter_restricts_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        store
            .embed_and_store("mixed", &Chunk::new("tagged text"), &["docs".to_string()])
            .await
            .unwrap();
        store
            .embed_and_store("mixed", &Chunk::new("other text"), &["web".to_string()])
            .await
            .unwrap();

        let results = store
            .similarity_search(
                "mixed",
                "text",
                10,
                SearchMode::Similarity,
                &["docs".to_string()],
                &SearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "tagged text");

        // Empty tag set means no filter.
        let all = store
            .similarity_search(
                "mixed",
                "text",
                10,
                SearchMode::Similarity,
                &[],
                &SearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_mmr_diversifies_near_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        for text in [
            "the cat sat on the mat",
            "the cat sat on the mat again",
            "the cat sat on that same mat",
            "dogs chase squirrels in the park",
        ] {
            store
                .embed_and_store("pets", &Chunk::new(text), &[])
                .await
                .unwrap();
        }

        let opts = SearchOptions {
            fetch_k: Some(4),
            lambda: None,
        };
        let similarity = store
            .similarity_search("pets", "cat on the mat", 3, SearchMode::Similarity, &[], &opts)
            .await
            .unwrap();
        let mmr = store
            .similarity_search("pets", "cat on the mat", 3, SearchMode::Mmr, &[], &opts)
            .await
            .unwrap();

        assert_eq!(similarity.len(), 3);
        assert_eq!(mmr.len(), 3);
        let similarity_contents: Vec<&str> =
            similarity.iter().map(|c| c.content.as_str()).collect();
        let mmr_contents: Vec<&str> = mmr.iter().map(|c| c.content.as_str()).collect();
        assert_ne!(similarity_contents, mmr_contents);
        assert!(mmr_contents.contains(&"dogs chase squirrels in the park"));
    }

    #[tokio::test]
    async fn test_missing_collection_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let result = store
            .similarity_search(
                "ghost",
                "anything",
                3,
                SearchMode::Similarity,
                &[],
                &SearchOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(StoreError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_index_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = store(dir.path());
            store
                .embed_and_store("persist", &Chunk::new("remember me"), &[])
                .await
                .unwrap();
        }

        let reopened = store(dir.path());
        let results = reopened
            .similarity_search(
                "persist",
                "remember me",
                1,
                SearchMode::Similarity,
                &[],
                &SearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "remember me");
    }

    #[tokio::test]
    async fn test_collection_names_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .embed_and_store("alpha", &Chunk::new("a"), &["docs".to_string()])
            .await
            .unwrap();
        store
            .embed_and_store("beta", &Chunk::new("b"), &[])
            .await
            .unwrap();

        assert_eq!(store.collection_names().unwrap(), vec!["alpha", "beta"]);
        let tags = store.collection_tags("alpha").unwrap();
        assert!(tags.contains("docs"));
        let beta_tags = store.collection_tags("beta").unwrap();
        assert!(beta_tags.contains(DEFAULT_SOURCE));
    }

    #[tokio::test]
    async fn test_delete_tag_removes_points() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .embed_and_store("clean", &Chunk::new("keep"), &["keep".to_string()])
            .await
            .unwrap();
        store
            .embed_and_store("clean", &Chunk::new("drop"), &["drop".to_string()])
            .await
            .unwrap();

        assert_eq!(store.delete_tag("clean", "drop").unwrap(), 1);
        let results = store
            .similarity_search(
                "clean",
                "drop",
                10,
                SearchMode::Similarity,
                &[],
                &SearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "keep");
    }

    #[test]
    fn test_invalid_collection_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let result = store.collection_tags("../escape");
        assert!(matches!(result, Err(StoreError::InvalidCollectionName(_))));
    }
}
