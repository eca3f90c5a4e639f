//! Embedding provider abstraction.
//!
//! Two interchangeable backends implement the same `embed` contract: a
//! local-network Ollama service and an OpenAI-compatible cloud API. The
//! backend is selected once at startup from configuration, never per call.

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::{EmbeddingConfig, ProviderKind};

/// Capability of turning text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of documents, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let texts = vec![text.to_string()];
        let embeddings = self.embed_batch(&texts).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("empty embedding response".to_string()))
    }

    /// Output dimensionality of this provider's vectors.
    fn dimension(&self) -> usize;

    /// Model identifier, for status reporting.
    fn model(&self) -> &str;

    /// Cheap reachability probe, for status reporting.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Build the configured provider. Credential validation happens here so a
/// misconfigured cloud provider fails before any task is spawned.
pub fn create_provider(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
    match config.provider {
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(config)?)),
        ProviderKind::OpenAi => {
            let api_key = config.resolved_api_key().ok_or_else(|| {
                ProviderError::MissingCredentials(
                    "OpenAI API key not found in configuration or environment".to_string(),
                )
            })?;
            Ok(Arc::new(OpenAiProvider::new(config, api_key)?))
        }
    }
}

/// Cosine similarity between two vectors; 0.0 when either has no norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic in-process providers for exercising embedding-dependent
    //! paths without a network.

    use std::hash::{DefaultHasher, Hash, Hasher};

    use super::*;

    pub const FAKE_DIMENSION: usize = 256;

    /// Bag-of-words provider: each lower-cased token is hashed into a
    /// bucket, counts are normalized. Shared vocabulary means high cosine
    /// similarity, so relevance ordering behaves like a real model.
    pub struct HashProvider;

    impl HashProvider {
        pub fn vector(text: &str) -> Vec<f32> {
            let mut vector = vec![0.0f32; FAKE_DIMENSION];
            for token in text
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
            {
                let mut hasher = DefaultHasher::new();
                token.hash(&mut hasher);
                vector[(hasher.finish() % FAKE_DIMENSION as u64) as usize] += 1.0;
            }
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut vector {
                    *value /= norm;
                }
            }
            vector
        }
    }

    #[async_trait]
    impl EmbeddingProvider for HashProvider {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }

        fn dimension(&self) -> usize {
            FAKE_DIMENSION
        }

        fn model(&self) -> &str {
            "hash-test-model"
        }

        async fn health_check(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    /// Provider that fails every call, for failure-path tests.
    pub struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Err(ProviderError::Unavailable(
                "test provider is always down".to_string(),
            ))
        }

        fn dimension(&self) -> usize {
            FAKE_DIMENSION
        }

        fn model(&self) -> &str {
            "failing-test-model"
        }

        async fn health_check(&self) -> Result<(), ProviderError> {
            Err(ProviderError::Unavailable(
                "test provider is always down".to_string(),
            ))
        }
    }
}
