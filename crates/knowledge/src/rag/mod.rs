//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Answers are extractive: the best matching sentence from the retrieved
//! passages, cited with the passages themselves.

pub mod answer;
pub mod types;

pub use answer::{best_sentence, compose_answer, Retriever};
pub use types::RagAnswer;
