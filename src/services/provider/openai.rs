//! OpenAI-compatible embedding provider: cloud API reached with an API key,
//! requesting a fixed output dimensionality.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::ProviderError;
use crate::models::EmbeddingConfig;

pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| {
                ProviderError::MissingCredentials("API key contains invalid characters".to_string())
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let endpoint = format!(
            "{}/embeddings",
            config.resolved_url().trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            model: config.resolved_model(),
            dimension: config.dimension as usize,
            batch_size: config.batch_size as usize,
        })
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimension,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::Unavailable(format!(
                        "cannot reach embedding API at {}: {}",
                        self.endpoint, e
                    ))
                } else {
                    ProviderError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::MissingCredentials(
                "embedding API rejected the configured key".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable(format!(
                "embedding API error ({}): {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "got {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        parsed.data.sort_by_key(|entry| entry.index);
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
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
        let url = self.endpoint.replace("/embeddings", "/models");
        let response = self.client.get(&url).send().await.map_err(|e| {
            ProviderError::Unavailable(format!("cannot reach embedding API: {}", e))
        })?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::MissingCredentials(
                "embedding API rejected the configured key".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "embedding API health check failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderKind;

    #[test]
    fn test_endpoint_from_base_url() {
        let config = EmbeddingConfig {
            provider: ProviderKind::OpenAi,
            url: Some("https://api.example.com/v1/".to_string()),
            ..Default::default()
        };
        let provider = OpenAiProvider::new(&config, "sk-test".to_string()).unwrap();
        assert_eq!(provider.endpoint, "https://api.example.com/v1/embeddings");
        assert_eq!(provider.dimension(), 768);
    }
}
