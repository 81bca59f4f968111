//! In-process embedding by feature hashing.
//!
//! Words and character trigrams are hashed (blake3) into a fixed number of
//! signed buckets and the result is L2-normalised. Texts that share
//! vocabulary end up close in cosine distance. Needs no model download and
//! is fully deterministic.
use crate::traits::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

pub struct HashingEmbedder {
    dimensions: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> EmbeddingResult<Self> {
        if dimensions == 0 {
            return Err(EmbeddingError::Config(
                "hashing embedder needs at least one dimension".into(),
            ));
        }
        Ok(Self {
            dimensions,
            name: format!("feature-hashing-{dimensions}"),
        })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = blake3::hash(feature.as_bytes());
        let bytes = digest.as_bytes();
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(word) % self.dimensions as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let words = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());

        for word in words {
            self.add_feature(&mut vector, &format!("w:{word}"), WORD_WEIGHT);
            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for tri in padded.windows(3) {
                let gram: String = tri.iter().collect();
                self.add_feature(&mut vector, &format!("t:{gram}"), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::cosine_distance;

    #[tokio::test]
    async fn shared_vocabulary_is_closer() {
        let e = HashingEmbedder::new(384).unwrap();
        let q = e.embed("Would you be willing to relocate for this role?").await.unwrap();
        let near = e.embed("Are you willing to relocate?").await.unwrap();
        let far = e.embed("How many years of Python experience do you have?").await.unwrap();
        assert!(cosine_distance(&q, &near) < cosine_distance(&q, &far));
    }

    #[tokio::test]
    async fn deterministic_and_normalised() {
        let e = HashingEmbedder::new(64).unwrap();
        let a = e.embed("Full Name").await.unwrap();
        let b = e.embed("full   name").await.unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(e.embed("").await.unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }
}
