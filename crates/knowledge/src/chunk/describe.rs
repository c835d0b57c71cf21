//! Per-passage statistics for display and bookkeeping.
//!
//! Informational only; retrieval never reads these.

use crate::types::Passage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence end pattern"));
static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("valid keyword pattern"));

const PREVIEW_CHARS: usize = 100;
const KEYWORD_COUNT: usize = 5;

/// Statistics for one passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub chunk_index: u32,
    pub word_count: usize,
    pub char_count: usize,
    pub sentence_count: usize,

    /// Most frequent words of four or more letters, lowercased
    pub keywords: Vec<String>,

    /// First 100 characters, with `...` appended when truncated
    pub preview: String,

    /// SHA-256 of the content, hex encoded
    pub content_hash: String,
}

/// Summarize each passage.
pub fn describe(passages: &[Passage]) -> Vec<ChunkSummary> {
    passages
        .iter()
        .map(|passage| {
            let content = &passage.content;
            let lower = content.to_lowercase();
            let words: Vec<&str> = KEYWORD.find_iter(&lower).map(|m| m.as_str()).collect();

            ChunkSummary {
                chunk_index: passage.index,
                word_count: content.split_whitespace().count(),
                char_count: passage.char_count,
                sentence_count: SENTENCE_END
                    .split(content)
                    .filter(|s| !s.trim().is_empty())
                    .count(),
                keywords: top_keywords(&words),
                preview: preview(content),
                content_hash: content_hash(content),
            }
        })
        .collect()
}

/// Highest-frequency words; ties go to the word seen first.
fn top_keywords(words: &[&str]) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, word) in words.iter().enumerate() {
        counts.entry(*word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(KEYWORD_COUNT)
        .map(|(word, _, _)| word.to_string())
        .collect()
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
