//! Concrete embedder implementations.

pub mod hashing;
pub mod ollama;
