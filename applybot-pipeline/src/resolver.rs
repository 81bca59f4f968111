//! Semantic answer resolution.
//!
//! A live question is matched to the knowledge base entry whose embedded
//! question is nearest by cosine distance. For closed-form questions the
//! stored answer is then matched, the same way, onto the options the page
//! actually offers, so the result is always one of them.
//!
//! The question index is embedded lazily on first use and kept for the life
//! of the resolver. With a fixed knowledge base and a deterministic provider
//! the same input always resolves to the same answer.
use crate::knowledge::{KnowledgeBase, normalize_question};
use applybot_common::{ApplyError, Result};
use applybot_embed::traits::Embedder;
use applybot_embed::{EmbeddingError, nearest};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct AnswerResolver {
    knowledge: KnowledgeBase,
    embedder: Arc<dyn Embedder + Send + Sync>,
    index: OnceCell<Vec<Vec<f32>>>,
}

impl AnswerResolver {
    pub fn new(knowledge: KnowledgeBase, embedder: Arc<dyn Embedder + Send + Sync>) -> Self {
        Self {
            knowledge,
            embedder,
            index: OnceCell::new(),
        }
    }

    async fn index(&self) -> Result<&[Vec<f32>]> {
        let index = self
            .index
            .get_or_try_init(|| async {
                let keys: Vec<String> = self.knowledge.iter().map(|(q, _)| q.to_string()).collect();
                let vectors = self.embedder.embed_batch(&keys).await?;
                if vectors.len() != keys.len() {
                    return Err(ApplyError::from(EmbeddingError::Api(format!(
                        "embedded {} of {} questions",
                        vectors.len(),
                        keys.len()
                    ))));
                }
                tracing::debug!(
                    entries = keys.len(),
                    model = self.embedder.model_name(),
                    "question index built"
                );
                Ok(vectors)
            })
            .await?;
        Ok(index.as_slice())
    }

    /// Answer `question`. With `choices` the result is one of them.
    pub async fn resolve(&self, question: &str, choices: &[String]) -> Result<String> {
        if self.knowledge.is_empty() {
            return Err(ApplyError::NoKnowledge);
        }

        let stored = match self.knowledge.get(question) {
            Some(answer) => answer.to_string(),
            None => self.nearest_answer(question).await?,
        };

        if choices.is_empty() {
            return Ok(stored);
        }
        if let Some(exact) = choices
            .iter()
            .find(|c| c.trim().eq_ignore_ascii_case(stored.trim()))
        {
            return Ok(exact.clone());
        }

        let target = self.embedder.embed(&stored).await?;
        let options = self.embedder.embed_batch(choices).await?;
        check_dimensions(&target, &options)?;
        let pick = nearest(&target, &options).unwrap_or(0);
        tracing::debug!(question, stored = %stored, picked = %choices[pick], "mapped answer onto choices");
        Ok(choices[pick].clone())
    }

    async fn nearest_answer(&self, question: &str) -> Result<String> {
        let index = self.index().await?;
        let query = self.embedder.embed(&normalize_question(question)).await?;
        check_dimensions(&query, index)?;
        let pos = nearest(&query, index).ok_or(ApplyError::NoKnowledge)?;
        self.knowledge
            .iter()
            .nth(pos)
            .map(|(_, answer)| answer.to_string())
            .ok_or(ApplyError::NoKnowledge)
    }
}

fn check_dimensions(query: &[f32], candidates: &[Vec<f32>]) -> Result<()> {
    match candidates.iter().find(|c| c.len() != query.len()) {
        Some(bad) => Err(EmbeddingError::Dimension {
            expected: query.len(),
            got: bad.len(),
        }
        .into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applybot_embed::hashing::HashingEmbedder;

    fn resolver(entries: &[(&str, &str)]) -> AnswerResolver {
        let kb: KnowledgeBase = entries.iter().copied().collect();
        AnswerResolver::new(kb, Arc::new(HashingEmbedder::new(512).unwrap()))
    }

    #[tokio::test]
    async fn empty_knowledge_fails_fast() {
        let r = resolver(&[]);
        let err = r.resolve("Anything?", &[]).await.unwrap_err();
        assert!(matches!(err, ApplyError::NoKnowledge));
    }

    #[tokio::test]
    async fn exact_questions_skip_the_index() {
        let r = resolver(&[("Phone number", "555-0100")]);
        assert_eq!(r.resolve("Phone Number *", &[]).await.unwrap(), "555-0100");
        assert!(r.index.get().is_none());
    }

    #[tokio::test]
    async fn reworded_question_maps_onto_live_choice() {
        let r = resolver(&[("Are you willing to relocate?", "No")]);
        let choices = vec!["Yes".to_string(), "No".to_string()];
        let answer = r
            .resolve("Would you be willing to relocate for this role?", &choices)
            .await
            .unwrap();
        assert_eq!(answer, "No");
    }
}
