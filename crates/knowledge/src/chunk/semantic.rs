//! Semantic splitter: groups sentences whose embeddings are similar.

use super::{char_len, ChunkConfig, ChunkStrategy};
use crate::embeddings::Embedder;
use crate::vector_index::cosine_similarity;
use docqa_core::AppResult;
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Sentences join a group only when their similarity to the seed exceeds this.
pub const SEMANTIC_THRESHOLD: f32 = 0.5;

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("valid sentence pattern"));

pub struct SemanticSplitter {
    embedder: Arc<dyn Embedder>,
    threshold: f32,
}

impl SemanticSplitter {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            threshold: SEMANTIC_THRESHOLD,
        }
    }
}

#[async_trait::async_trait]
impl ChunkStrategy for SemanticSplitter {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn split(&self, text: &str, config: &ChunkConfig) -> AppResult<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(vec![text.to_string()]);
        }

        let embeddings = self.embedder.embed_batch(&sentences).await?;
        Ok(group_sentences(
            &sentences,
            &embeddings,
            self.threshold,
            config.max_size,
        ))
    }
}

/// Sentences with their terminators, trimmed, empties dropped.
fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Greedy grouping in seed order. Each unused sentence starts a group and
/// pulls in every later unused sentence similar to it, while the group's
/// length stays under `max_size`.
fn group_sentences(
    sentences: &[String],
    embeddings: &[Vec<f32>],
    threshold: f32,
    max_size: usize,
) -> Vec<String> {
    let mut used = vec![false; sentences.len()];
    let mut groups = Vec::new();

    for i in 0..sentences.len() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let mut group = vec![sentences[i].as_str()];
        let mut group_len = char_len(&sentences[i]);

        for j in (i + 1)..sentences.len() {
            if used[j] {
                continue;
            }
            let similarity = cosine_similarity(&embeddings[i], &embeddings[j]);
            let sentence_len = char_len(&sentences[j]);
            if similarity > threshold && group_len + sentence_len < max_size {
                group.push(sentences[j].as_str());
                group_len += sentence_len;
                used[j] = true;
            }
        }

        groups.push(group.join(" "));
    }

    tracing::debug!(
        "Grouped {} sentences into {} semantic chunks",
        sentences.len(),
        groups.len()
    );

    groups
}
