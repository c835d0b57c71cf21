//! Recursive splitter: paragraphs, then sentences, then words, then characters.
//!
//! Pieces are accumulated into a buffer until the next one would push it past
//! `max_size`. The finished buffer is emitted and its last `overlap`
//! characters seed the next passage. A piece that is itself longer than
//! `max_size` is split at the next finer tier. No passage exceeds
//! `max_size + overlap` characters.

use super::{char_len, ChunkConfig, ChunkStrategy};
use docqa_core::AppResult;
use unicode_segmentation::UnicodeSegmentation;

pub struct RecursiveSplitter;

#[async_trait::async_trait]
impl ChunkStrategy for RecursiveSplitter {
    fn name(&self) -> &'static str {
        "recursive"
    }

    async fn split(&self, text: &str, config: &ChunkConfig) -> AppResult<Vec<String>> {
        Ok(split_recursive(text, config))
    }
}

/// Split `text` with the recursive tiers. Used directly by the structural
/// splitter for oversized sections.
pub(crate) fn split_recursive(text: &str, config: &ChunkConfig) -> Vec<String> {
    let mut acc = Accumulator::new(config.max_size, config.overlap);
    for paragraph in Tier::Paragraph.split(text, config.max_size) {
        acc.push(paragraph, Tier::Paragraph, Tier::Paragraph.separator());
    }
    acc.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Paragraph,
    Sentence,
    Word,
    Char,
}

impl Tier {
    fn separator(self) -> &'static str {
        match self {
            Tier::Paragraph => "\n\n",
            Tier::Sentence | Tier::Word => " ",
            Tier::Char => "",
        }
    }

    fn finer(self) -> Option<Tier> {
        match self {
            Tier::Paragraph => Some(Tier::Sentence),
            Tier::Sentence => Some(Tier::Word),
            Tier::Word => Some(Tier::Char),
            Tier::Char => None,
        }
    }

    fn split(self, text: &str, max_size: usize) -> Vec<&str> {
        match self {
            Tier::Paragraph => text.split("\n\n").collect(),
            Tier::Sentence => text.split_sentence_bounds().collect(),
            Tier::Word => text.split_whitespace().collect(),
            Tier::Char => {
                let mut pieces = Vec::new();
                let mut start = 0;
                for (count, (idx, _)) in text.char_indices().enumerate() {
                    if count > 0 && count % max_size == 0 {
                        pieces.push(&text[start..idx]);
                        start = idx;
                    }
                }
                if start < text.len() {
                    pieces.push(&text[start..]);
                }
                pieces
            }
        }
    }
}

struct Accumulator {
    max_size: usize,
    overlap: usize,
    buffer: String,
    buffer_len: usize,
    /// Whether the buffer holds anything beyond the overlap seed
    has_content: bool,
    chunks: Vec<String>,
}

impl Accumulator {
    fn new(max_size: usize, overlap: usize) -> Self {
        Self {
            max_size,
            overlap,
            buffer: String::new(),
            buffer_len: 0,
            has_content: false,
            chunks: Vec::new(),
        }
    }

    /// Add a piece, joined to the buffer with `separator`.
    fn push(&mut self, piece: &str, tier: Tier, separator: &str) {
        let piece = piece.trim();
        if piece.is_empty() {
            return;
        }

        let piece_len = char_len(piece);
        if self.buffer_len + self.separator_len(separator) + piece_len <= self.max_size {
            self.append(piece, piece_len, separator);
            return;
        }

        if self.has_content {
            self.flush();
        }

        if piece_len > self.max_size {
            if let Some(finer) = tier.finer() {
                for (i, sub) in finer.split(piece, self.max_size).into_iter().enumerate() {
                    // The first sub-piece keeps the separator of the tier it came from
                    let sep = if i == 0 { separator } else { finer.separator() };
                    self.push(sub, finer, sep);
                }
                return;
            }
        }

        // Shorten the seed so seed + piece stays within max_size + overlap
        let budget = (self.max_size + self.overlap)
            .saturating_sub(piece_len + self.separator_len(separator));
        let keep = self.overlap.min(budget).min(self.buffer_len);
        self.reseed(keep);
        self.append(piece, piece_len, separator);
    }

    fn separator_len(&self, separator: &str) -> usize {
        if self.buffer.is_empty() {
            0
        } else {
            char_len(separator)
        }
    }

    fn append(&mut self, piece: &str, piece_len: usize, separator: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push_str(separator);
            self.buffer_len += char_len(separator);
        }
        self.buffer.push_str(piece);
        self.buffer_len += piece_len;
        self.has_content = true;
    }

    /// Emit the buffer and keep its tail as the next seed.
    fn flush(&mut self) {
        let chunk = self.buffer.trim();
        if !chunk.is_empty() {
            self.chunks.push(chunk.to_string());
        }
        self.has_content = false;
        self.reseed(self.overlap);
    }

    /// Keep at most the last `keep` characters of the buffer.
    fn reseed(&mut self, keep: usize) {
        let trimmed = self.buffer.trim_end();
        let len = char_len(trimmed);
        let seed = match trimmed.char_indices().nth(len.saturating_sub(keep)) {
            Some((idx, _)) if keep > 0 => trimmed[idx..].trim_start().to_string(),
            _ => String::new(),
        };
        self.buffer_len = char_len(&seed);
        self.buffer = seed;
    }

    fn finish(mut self) -> Vec<String> {
        if self.has_content {
            self.flush();
        }
        self.chunks
    }
}
