use applybot_common::ApplyError;
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum EmbeddingError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Embedding has {got} dimensions, expected {expected}")]
    Dimension { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<EmbeddingError> for ApplyError {
    fn from(err: EmbeddingError) -> Self {
        ApplyError::Embedding(err.to_string())
    }
}

pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

/// A function from text to a fixed-length vector whose cosine distance is
/// meaningful for similarity.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one string.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed several strings, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Check if the embedding service is available
    async fn health_check(&self) -> bool;
}

/// `1 - cos(a, b)`; zero vectors are maximally distant from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na.sqrt() * nb.sqrt())
}

/// Index of the candidate nearest to `query`; ties resolve to the earliest.
pub fn nearest(query: &[f32], candidates: &[Vec<f32>]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let d = cosine_distance(query, c);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}
