//! Structure-aware splitter for documents with headings.
//!
//! Patterns are tried in order and the first one with any match decides the
//! section boundaries. Oversized sections go through the recursive splitter;
//! text without structure is handled by the recursive splitter entirely.

use super::recursive::split_recursive;
use super::{char_len, ChunkConfig, ChunkStrategy};
use docqa_core::AppResult;
use regex::Regex;
use std::sync::LazyLock;

/// Section markers in priority order.
static SECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Chapter / Section / Part headings
        r"\n\s*(?:Chapter|Section|Part)\s+\d+",
        // Numbered sections
        r"\n\s*\d+\.\s+[A-Z]",
        // ALL CAPS header lines
        r"\n\s*[A-Z][A-Z\s]+\n",
        // Markdown headings
        r"\n\s*#{1,6}\s+",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid section pattern"))
    .collect()
});

pub struct StructuralSplitter;

#[async_trait::async_trait]
impl ChunkStrategy for StructuralSplitter {
    fn name(&self) -> &'static str {
        "custom"
    }

    async fn split(&self, text: &str, config: &ChunkConfig) -> AppResult<Vec<String>> {
        for re in SECTION_PATTERNS.iter() {
            let starts: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();
            if starts.is_empty() {
                continue;
            }

            tracing::debug!("Section pattern {:?} matched {} times", re.as_str(), starts.len());
            return Ok(split_at(text, &starts, config));
        }

        tracing::debug!("No document structure found, using recursive splitting");
        Ok(split_recursive(text, config))
    }
}

/// Cut `text` at each boundary. Sections longer than `max_size` are split
/// recursively.
fn split_at(text: &str, starts: &[usize], config: &ChunkConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut last = 0;

    let push_section = |section: &str, chunks: &mut Vec<String>| {
        let section = section.trim();
        if section.is_empty() {
            return;
        }
        if char_len(section) > config.max_size {
            chunks.extend(split_recursive(section, config));
        } else {
            chunks.push(section.to_string());
        }
    };

    for &start in starts {
        if start > last {
            push_section(&text[last..start], &mut chunks);
        }
        last = start;
    }
    push_section(&text[last..], &mut chunks);

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn split(text: &str, max_size: usize) -> Vec<String> {
        StructuralSplitter
            .split(text, &ChunkConfig { max_size, overlap: 0 })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_splits_on_chapter_headings() {
        let text = "Preface text.\nChapter 1\nThe beginning.\nChapter 2\nThe end.";
        let chunks = split(text, 1000).await;

        assert_eq!(
            chunks,
            vec![
                "Preface text.",
                "Chapter 1\nThe beginning.",
                "Chapter 2\nThe end."
            ]
        );
    }

    #[tokio::test]
    async fn test_first_matching_pattern_wins() {
        // Both markdown headings and numbered sections are present
        let text = "Intro\n1. First point\nbody\n## Heading\nmore";
        let chunks = split(text, 1000).await;

        assert_eq!(chunks, vec!["Intro", "1. First point\nbody\n## Heading\nmore"]);
    }

    #[tokio::test]
    async fn test_markdown_headings() {
        let text = "# Title\nintro\n## Part A\nalpha\n## Part B\nbeta";
        let chunks = split(text, 1000).await;

        assert_eq!(chunks, vec!["# Title\nintro", "## Part A\nalpha", "## Part B\nbeta"]);
    }

    #[tokio::test]
    async fn test_oversized_section_is_split_recursively() {
        let body = "word ".repeat(30);
        let text = format!("Lead.\nSection 1\n{}", body);
        let chunks = split(&text, 40).await;

        assert_eq!(chunks[0], "Lead.");
        assert!(chunks.len() > 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40);
        }
    }

    #[tokio::test]
    async fn test_unstructured_text_falls_back_to_recursive() {
        let text = "just some plain lowercase text without any headings at all";
        let chunks = split(text, 1000).await;
        assert_eq!(chunks, vec![text]);
    }
}
