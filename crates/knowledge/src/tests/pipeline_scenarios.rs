//! End-to-end scenarios: chunk, index, retrieve and answer.

use crate::chunk::{ChunkConfig, ChunkMethod, Chunker};
use crate::embeddings::providers::hashing::HashingEmbedder;
use crate::embeddings::{Embedder, EmbeddingService};
use crate::ingest::DocumentProcessor;
use crate::memory_index::InMemoryIndex;
use crate::rag::{RagAnswer, Retriever};
use crate::types::Payload;
use crate::vector_index::VectorIndex;
use docqa_core::config::UploadSettings;
use std::sync::Arc;

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::new(384))
}

fn processor(max_size: usize, overlap: usize) -> DocumentProcessor {
    let embedder = embedder();
    DocumentProcessor::new(
        Chunker::new(ChunkConfig::new(max_size, overlap).unwrap(), Arc::clone(&embedder)).unwrap(),
        EmbeddingService::new(embedder),
        Arc::new(InMemoryIndex::new()),
        UploadSettings::default(),
    )
}

#[tokio::test]
async fn test_two_short_paragraphs_make_one_chunk() {
    let chunker = Chunker::new(ChunkConfig::new(1000, 200).unwrap(), embedder()).unwrap();
    let passages = chunker
        .chunk(
            "Para one is short.\n\nPara two is also short.",
            ChunkMethod::Recursive,
        )
        .await
        .unwrap();

    assert_eq!(passages.len(), 1);
    assert_eq!(
        passages[0].content,
        "Para one is short.\n\nPara two is also short."
    );
}

#[tokio::test]
async fn test_semantic_single_sentence_unchanged() {
    let chunker = Chunker::new(ChunkConfig::default(), embedder()).unwrap();
    let passages = chunker
        .chunk("Only one sentence here.", ChunkMethod::Semantic)
        .await
        .unwrap();

    let contents: Vec<&str> = passages.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["Only one sentence here."]);
}

#[tokio::test]
async fn test_search_returns_matching_chunk() {
    let index = InMemoryIndex::new();
    let vectors = [
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
    ];
    for (i, vector) in vectors.iter().enumerate() {
        index
            .add("c1", vector.clone(), Payload::new(i as u32, format!("content {}", i)))
            .await
            .unwrap();
    }

    let results = index.search("c1", &[0.0, 1.0, 0.0], 1).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].payload.content, "content 1");
    assert_eq!(results[0].payload.chunk_index, 1);
}

#[tokio::test]
async fn test_unknown_collection_answer() {
    let retriever = Retriever::new(
        EmbeddingService::new(embedder()),
        Arc::new(InMemoryIndex::new()),
        5,
    );
    let answer = retriever
        .answer("unrelated question", Some("nonexistent_collection"))
        .await;

    assert_eq!(answer, RagAnswer::no_results());
    assert_eq!(
        answer.response_text,
        "Sorry, I could not find relevant information in the uploaded document."
    );
}

#[tokio::test]
async fn test_ingest_then_answer() {
    let processor = processor(120, 20);
    let text = "Acme Corp was founded in 1987 by two engineers.\n\n\
                The company headquarters moved to Porto in 2004.\n\n\
                Annual revenue reached twelve million euros last year.";

    let report = processor
        .process_text("17", text, ChunkMethod::Recursive, None)
        .await
        .unwrap();
    assert!(report.chunk_count >= 2);

    let answer = processor
        .retriever(3)
        .answer("Where are the company headquarters?", Some(&report.collection_id))
        .await;

    assert_eq!(
        answer.response_text,
        "Based on the document: The company headquarters moved to Porto in 2004."
    );
    assert!(!answer.sources.is_empty());
    assert_eq!(answer.tools_used, vec!["vector_search"]);
}

#[tokio::test]
async fn test_deleted_document_no_longer_answers() {
    let processor = processor(200, 20);
    let report = processor
        .process_text("5", "Shipping takes three days.", ChunkMethod::Recursive, None)
        .await
        .unwrap();

    processor.delete_document(&report.collection_id).await.unwrap();

    let answer = processor
        .retriever(5)
        .answer("How long does shipping take?", Some(&report.collection_id))
        .await;
    assert_eq!(answer, RagAnswer::no_results());
}

#[tokio::test]
async fn test_concurrent_ingestion_keeps_collections_isolated() {
    let processor = processor(80, 10);
    let mut tasks = tokio::task::JoinSet::new();

    for doc in 0..6 {
        let processor = processor.clone();
        tasks.spawn(async move {
            let text = format!(
                "Document {} talks about topic {}.\n\nIt has a second paragraph too.",
                doc, doc
            );
            processor
                .process_text(&format!("doc{}", doc), &text, ChunkMethod::Recursive, None)
                .await
                .unwrap()
        });
    }

    let mut reports = Vec::new();
    while let Some(result) = tasks.join_next().await {
        reports.push(result.unwrap());
    }

    let index = processor.index();
    for report in &reports {
        assert_eq!(
            index.count(&report.collection_id).await.unwrap(),
            report.chunk_count
        );
        let query = vec![0.5; 384];
        for hit in index.search(&report.collection_id, &query, 10).await.unwrap() {
            assert_eq!(hit.payload.extra["file_id"], report.document_id.as_str());
        }
    }
}
