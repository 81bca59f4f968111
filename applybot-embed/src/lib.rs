//! Provider‑agnostic text embeddings for the answer resolver.
//!
//! This crate exposes a common [`traits::Embedder`] interface, cosine
//! distance helpers, and concrete providers for Ollama, OpenAI-compatible
//! HTTP endpoints, and a local feature-hashing embedder. It also provides a
//! convenience function to initialize a provider from an
//! [`applybot_common::EmbeddingConfig`].
//!
//! # Examples
//! ```
//! use applybot_common::EmbeddingConfig;
//! use applybot_embed::ensure_embedder_ready;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> applybot_common::Result<()> {
//! let cfg = EmbeddingConfig::Hashing { dimensions: 256 };
//! let embedder = ensure_embedder_ready(&cfg).await?;
//! assert_eq!(embedder.embed("hello").await?.len(), 256);
//! # Ok(())
//! # }
//! ```
pub mod hashing;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;
pub mod traits;

use applybot_common::{ApplyError, EmbeddingConfig};
use hashing::HashingEmbedder;
use std::sync::Arc;
use traits::Embedder;

pub use traits::{cosine_distance, nearest, EmbeddingError};

/// Build the configured provider and make sure it can serve requests
/// (for Ollama this pulls the model if needed).
pub async fn ensure_embedder_ready(
    config: &EmbeddingConfig,
) -> applybot_common::Result<Arc<dyn Embedder + Send + Sync + 'static>> {
    let embedder: Arc<dyn Embedder + Send + Sync> = match config {
        #[cfg(feature = "ollama")]
        EmbeddingConfig::Ollama { endpoint, model } => Arc::new(
            ollama::OllamaEmbedder::new(endpoint.clone(), model.clone()).await?,
        ),
        #[cfg(feature = "openai")]
        EmbeddingConfig::Openai {
            endpoint,
            model,
            auth_token,
        } => Arc::new(openai::OpenAiEmbedder::new(
            endpoint.clone(),
            auth_token.clone(),
            model.clone(),
        )?),
        EmbeddingConfig::Hashing { dimensions } => Arc::new(HashingEmbedder::new(*dimensions)?),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(ApplyError::Config(
                "embedding provider not enabled".to_string(),
            ))
        }
    };

    tracing::info!(model = embedder.model_name(), "embedding provider ready");
    Ok(embedder)
}
