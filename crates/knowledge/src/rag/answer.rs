//! Question answering over one document collection.
//!
//! Embeds the question, searches the collection and extracts the sentence
//! that shares the most words with the question. Every failure is turned
//! into an explanatory answer rather than an error.

use crate::embeddings::EmbeddingService;
use crate::rag::types::RagAnswer;
use crate::types::SearchResult;
use crate::vector_index::VectorIndex;
use docqa_core::{AppResult, ErrorKind};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

/// Characters of context used when no sentence matches the question.
const FALLBACK_PREFIX_CHARS: usize = 200;

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("valid sentence pattern"));

/// Answers questions from passages stored in a vector index.
#[derive(Clone)]
pub struct Retriever {
    embeddings: EmbeddingService,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embeddings: EmbeddingService, index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            embeddings,
            index,
            top_k,
        }
    }

    /// Answer `question` from the given collection.
    #[tracing::instrument(skip(self, question))]
    pub async fn answer(&self, question: &str, collection_id: Option<&str>) -> RagAnswer {
        let Some(collection_id) = collection_id.filter(|id| !id.trim().is_empty()) else {
            tracing::debug!("No collection given, skipping search");
            return RagAnswer::no_collection();
        };

        let results = match self.retrieve(question, collection_id).await {
            Ok(results) => results,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Collection '{}' not found: {}", collection_id, e);
                return RagAnswer::not_found();
            }
            Err(e) => {
                tracing::warn!("Search in '{}' failed: {}", collection_id, e);
                return RagAnswer::failed(e);
            }
        };

        if results.is_empty() {
            tracing::info!("No passages found in '{}'", collection_id);
            return RagAnswer::no_results();
        }

        tracing::info!(
            "Retrieved {} passages from '{}' (top score: {:.3})",
            results.len(),
            collection_id,
            results[0].similarity_score
        );

        let context = results
            .iter()
            .map(|r| r.payload.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        RagAnswer::with_sources(compose_answer(question, &context), results)
    }

    async fn retrieve(&self, question: &str, collection_id: &str) -> AppResult<Vec<SearchResult>> {
        let query_vector = self.embeddings.embed_query(question).await?;
        self.index
            .search(collection_id, &query_vector, self.top_k)
            .await
    }
}

/// Build the answer text from the concatenated passage context.
pub fn compose_answer(question: &str, context: &str) -> String {
    let excerpt = match best_sentence(question, context) {
        Some(sentence) => sentence,
        None => truncate(context, FALLBACK_PREFIX_CHARS),
    };
    format!("Based on the document: {}", excerpt)
}

/// The sentence sharing the most distinct words with the question.
/// Ties go to the earliest sentence; `None` when nothing overlaps.
pub fn best_sentence(question: &str, context: &str) -> Option<String> {
    let question_words = word_set(question);
    if question_words.is_empty() {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;

    for sentence in SENTENCE.find_iter(context).map(|m| m.as_str().trim()) {
        if sentence.is_empty() {
            continue;
        }
        let score = word_set(sentence).intersection(&question_words).count();
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((sentence, score));
        }
    }

    best.map(|(sentence, _)| sentence.to_string())
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
