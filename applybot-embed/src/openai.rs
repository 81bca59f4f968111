use crate::traits::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Create a new client for the given endpoint, API key and model.
    pub fn new(endpoint: String, api_key: String, model: String) -> EmbeddingResult<Self> {
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::Config("OpenAI auth_token is empty".into()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EmbeddingError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let mut out = self.embed_batch(&[text.to_string()]).await?;
        out.pop()
            .ok_or_else(|| EmbeddingError::Api("Empty embeddings response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(EmbeddingError::Api(format!("HTTP {status}: {snippet}")));
        }

        let mut parsed: EmbeddingsResponse = resp.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::Api(format!(
                "Requested {} embeddings, received {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> bool {
        match self.embed("ping").await {
            Ok(v) => !v.is_empty(),
            Err(e) => {
                tracing::warn!("OpenAI embeddings health check failed: {e}");
                false
            }
        }
    }
}
