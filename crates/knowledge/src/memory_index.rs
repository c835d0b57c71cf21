//! In-process vector index with exact cosine search.
//!
//! Collections live in memory only and are lost when the process exits.
//! Each collection has its own lock, so writers to different collections
//! never contend; writers to the same collection are serialized.

use crate::types::{Payload, SearchResult, VectorId};
use crate::vector_index::{cosine_similarity, VectorIndex};
use docqa_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
struct Entry {
    vector: Vec<f32>,
    payload: Payload,
}

/// Entries in insertion order, with a lookup from chunk index to position.
#[derive(Debug, Default)]
struct Store {
    entries: Vec<Entry>,
    positions: HashMap<u32, usize>,
}

impl Store {
    fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.vector.len())
    }

    /// Insert or overwrite in place, keeping the original position.
    fn upsert(&mut self, entry: Entry) {
        match self.positions.get(&entry.payload.chunk_index) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions
                    .insert(entry.payload.chunk_index, self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

type Collection = Arc<RwLock<Store>>;

/// Brute-force vector index keyed by collection id.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, collection_id: &str) -> AppResult<Option<Collection>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.get(collection_id).cloned())
    }

    fn get_or_create(&self, collection_id: &str) -> AppResult<Collection> {
        if let Some(collection) = self.get(collection_id)? {
            return Ok(collection);
        }

        let mut collections = self.collections.write().map_err(poisoned)?;
        let collection = collections
            .entry(collection_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Created in-memory collection '{}'", collection_id);
                Arc::new(RwLock::new(Store::default()))
            });
        Ok(Arc::clone(collection))
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::Other("In-memory index lock poisoned".to_string())
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn create_collection(&self, collection_id: &str) -> AppResult<()> {
        self.get_or_create(collection_id)?;
        Ok(())
    }

    async fn add(
        &self,
        collection_id: &str,
        vector: Vec<f32>,
        payload: Payload,
    ) -> AppResult<VectorId> {
        let collection = self.get_or_create(collection_id)?;
        let mut store = collection.write().map_err(poisoned)?;

        if let Some(dimensions) = store.dimensions() {
            if dimensions != vector.len() {
                return Err(AppError::InvalidArgument(format!(
                    "Vector dimension {} does not match collection '{}' dimension {}",
                    vector.len(),
                    collection_id,
                    dimensions
                )));
            }
        }

        let id = VectorId::new(collection_id, payload.chunk_index);
        store.upsert(Entry { vector, payload });

        Ok(id)
    }

    async fn delete_collection(&self, collection_id: &str) -> AppResult<()> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        if collections.remove(collection_id).is_some() {
            tracing::debug!("Deleted in-memory collection '{}'", collection_id);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection_id: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<SearchResult>> {
        let Some(collection) = self.get(collection_id)? else {
            return Ok(Vec::new());
        };
        let store = collection.read().map_err(poisoned)?;

        let Some(dimensions) = store.dimensions() else {
            return Ok(Vec::new());
        };
        if top_k == 0 {
            return Ok(Vec::new());
        }

        if dimensions != query_vector.len() {
            return Err(AppError::InvalidArgument(format!(
                "Query dimension {} does not match collection '{}' dimension {}",
                query_vector.len(),
                collection_id,
                dimensions
            )));
        }

        // NaN scores (from NaN components) never rank
        let mut scored: Vec<(usize, f32)> = store
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&entry.vector, query_vector)))
            .filter(|(_, score)| !score.is_nan())
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity_score)| SearchResult {
                payload: store.entries[i].payload.clone(),
                similarity_score,
            })
            .collect())
    }

    async fn count(&self, collection_id: &str) -> AppResult<usize> {
        match self.get(collection_id)? {
            Some(collection) => Ok(collection.read().map_err(poisoned)?.entries.len()),
            None => Ok(0),
        }
    }
}
