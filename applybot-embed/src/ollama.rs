use crate::traits::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

/// Ollama client for local embedding models.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    /// Create a new client and verify server/model availability, pulling the
    /// model when the server does not have it yet.
    pub async fn new(base_url: String, model: String) -> EmbeddingResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| EmbeddingError::Config(format!("Failed to create HTTP client: {e}")))?;

        let embedder = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        };

        embedder.check_server().await?;
        embedder.ensure_model_available().await?;

        Ok(embedder)
    }

    async fn check_server(&self) -> EmbeddingResult<()> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| EmbeddingError::ModelNotAvailable(OLLAMA_CONNECTION_ERROR.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(EmbeddingError::ModelNotAvailable(
                OLLAMA_CONNECTION_ERROR.to_string(),
            ))
        }
    }

    async fn ensure_model_available(&self) -> EmbeddingResult<()> {
        let models = self.fetch_available_models().await?;
        let tagged = format!("{}:latest", self.model);

        if !models.iter().any(|m| *m == self.model || *m == tagged) {
            tracing::info!(model = %self.model, "embedding model not found locally, pulling");
            self.pull_model().await?;
        }

        Ok(())
    }

    async fn fetch_available_models(&self) -> EmbeddingResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            return Ok(Vec::new());
        }

        let val: JsonValue = resp.json().await?;

        let models = val
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.get("name").and_then(|n| n.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn pull_model(&self) -> EmbeddingResult<()> {
        let url = format!("{}/api/pull", self.base_url);
        let payload = json!({
            "model": self.model,
            "stream": false
        });

        let resp = self.client.post(&url).json(&payload).send().await?;

        if resp.status().is_success() {
            tracing::info!(model = %self.model, "pulled embedding model");
            Ok(())
        } else {
            Err(EmbeddingError::ModelNotAvailable(format!(
                "Failed to pull {}: HTTP {}",
                self.model,
                resp.status()
            )))
        }
    }

    async fn request(&self, input: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let payload = json!({
            "model": self.model,
            "input": input,
        });

        let resp = self.client.post(&url).json(&payload).send().await?;
        if !resp.status().is_success() {
            return Err(EmbeddingError::Api(format!(
                "Embed failed: HTTP {}",
                resp.status()
            )));
        }

        let val: JsonValue = resp.json().await?;
        let embeddings: Vec<Vec<f32>> = val
            .get("embeddings")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| EmbeddingError::Api(format!("Malformed embed response: {e}")))?
            .unwrap_or_default();

        if embeddings.len() != input.len() {
            return Err(EmbeddingError::Api(format!(
                "Requested {} embeddings, received {}",
                input.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let mut out = self.request(&[text.to_string()]).await?;
        out.pop()
            .ok_or_else(|| EmbeddingError::Api("Empty embed response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> bool {
        self.check_server().await.is_ok()
    }
}
