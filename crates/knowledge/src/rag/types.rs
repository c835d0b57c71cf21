//! RAG response types.

use crate::types::SearchResult;
use serde::{Deserialize, Serialize};

/// Name reported in `tools_used` whenever a vector search was attempted.
pub const VECTOR_SEARCH_TOOL: &str = "vector_search";

pub const NO_COLLECTION_MESSAGE: &str =
    "No document was specified, so no context could be searched.";

pub const NO_RESULTS_MESSAGE: &str =
    "Sorry, I could not find relevant information in the uploaded document.";

pub const NOT_FOUND_MESSAGE: &str =
    "The requested document was not found or has not been processed yet.";

/// Response from answering a question over one document collection.
///
/// Failures during retrieval are reported in `response_text`; a value of
/// this type is always produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    /// Answer text shown to the user
    pub response_text: String,

    /// Passages the answer was drawn from, best match first
    pub sources: Vec<SearchResult>,

    /// Tools invoked while answering
    pub tools_used: Vec<String>,
}

impl RagAnswer {
    /// Answer with no sources.
    pub fn message(text: impl Into<String>, searched: bool) -> Self {
        Self {
            response_text: text.into(),
            sources: Vec::new(),
            tools_used: tools(searched),
        }
    }

    /// Answer drawn from retrieved passages.
    pub fn with_sources(text: String, sources: Vec<SearchResult>) -> Self {
        Self {
            response_text: text,
            sources,
            tools_used: tools(true),
        }
    }

    pub fn no_collection() -> Self {
        Self::message(NO_COLLECTION_MESSAGE, false)
    }

    pub fn no_results() -> Self {
        Self::message(NO_RESULTS_MESSAGE, true)
    }

    pub fn not_found() -> Self {
        Self::message(NOT_FOUND_MESSAGE, true)
    }

    /// A retrieval failure explained to the user.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::message(
            format!("An error occurred while searching the document: {}", error),
            true,
        )
    }
}

fn tools(searched: bool) -> Vec<String> {
    if searched {
        vec![VECTOR_SEARCH_TOOL.to_string()]
    } else {
        Vec::new()
    }
}
