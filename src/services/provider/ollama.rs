//! Ollama embedding provider: a local-network embedding service reached by
//! base URL and model name.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::ProviderError;
use crate::models::EmbeddingConfig;

pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    truncate: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.resolved_url().trim_end_matches('/').to_string(),
            model: config.resolved_model(),
            dimension: config.dimension as usize,
            batch_size: config.batch_size as usize,
        })
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
            truncate: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::Unavailable(format!(
                        "cannot reach Ollama at {}: {}",
                        self.base_url, e
                    ))
                } else {
                    ProviderError::RequestFailed(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable(format!(
                "Ollama error ({}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if embed_response.embeddings.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "got {} embeddings for {} inputs",
                embed_response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(embed_response.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            all_embeddings.extend(self.embed_single_batch(batch).await?);
        }
        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            ProviderError::Unavailable(format!("cannot reach Ollama at {}: {}", self.base_url, e))
        })?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "Ollama health check failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_OLLAMA_URL;

    #[test]
    fn test_provider_creation() {
        let provider = OllamaProvider::new(&EmbeddingConfig::default()).unwrap();
        assert_eq!(provider.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(provider.model(), crate::models::DEFAULT_OLLAMA_MODEL);
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: Some("http://localhost:11434/".to_string()),
            ..Default::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
    }
}
