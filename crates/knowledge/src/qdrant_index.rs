//! Qdrant-backed vector index over the REST API.
//!
//! Collections are created with the configured dimension and cosine distance;
//! the metric cannot change without recreating the collection. Point ids are
//! the passage `chunk_index`, so re-adding a chunk overwrites it.
//! Requests are not retried: failures surface immediately as
//! `BackendUnavailable`, or `NotFound` for HTTP 404.

use crate::types::{Payload, SearchResult, VectorId};
use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const DISTANCE: &str = "Cosine";

/// Vector index stored in a Qdrant server.
#[derive(Debug)]
pub struct QdrantIndex {
    client: Client,
    base_url: Url,
    dimensions: usize,
    /// Collections known to exist, to skip redundant existence checks on add
    known: Mutex<HashSet<String>>,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Deserialize)]
struct CollectionInfoResponse {
    result: CollectionInfo,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    /// Either a single vector config or a map of named vectors
    vectors: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: Vec<Point<'a>>,
}

#[derive(Debug, Serialize)]
struct Point<'a> {
    id: u64,
    vector: &'a [f32],
    payload: &'a Payload,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

impl QdrantIndex {
    /// Create a client for the Qdrant server at `url` (e.g. `http://localhost:6333`).
    pub fn new(url: &str, dimensions: usize) -> AppResult<Self> {
        let base_url = Url::parse(url)
            .map_err(|e| AppError::Config(format!("Invalid Qdrant URL '{}': {}", url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("Invalid Qdrant URL '{}'", url)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::BackendUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            dimensions,
            known: Mutex::new(HashSet::new()),
        })
    }

    /// `{base}/collections/{collection_id}/{suffix...}`, with the id
    /// percent-encoded as a single path segment.
    fn collection_url(&self, collection_id: &str, suffix: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Invalid Qdrant URL '{}'", self.base_url)))?
            .pop_if_empty()
            .push("collections")
            .push(collection_id)
            .extend(suffix);
        Ok(url)
    }

    /// Send a request and map transport errors and status codes.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&B>,
    ) -> AppResult<reqwest::Response> {
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Qdrant request {} {} failed: {}", method, url, e);
            AppError::BackendUnavailable(format!("Qdrant unreachable: {}", e))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Qdrant resource not found: {}", url)));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::BackendUnavailable(format!(
                "Qdrant returned {} for {} {}: {}",
                status, method, url, text
            )));
        }

        Ok(response)
    }

    /// An existing collection is reused only with our size and distance.
    fn check_existing(&self, collection_id: &str, vectors: &serde_json::Value) -> AppResult<()> {
        let size = vectors.get("size").and_then(|v| v.as_u64());
        let distance = vectors.get("distance").and_then(|v| v.as_str());

        if size == Some(self.dimensions as u64) && distance == Some(DISTANCE) {
            return Ok(());
        }

        Err(AppError::InvalidArgument(format!(
            "Qdrant collection '{}' exists with vectors {} (expected size {} and {} distance)",
            collection_id, vectors, self.dimensions, DISTANCE
        )))
    }

    fn is_known(&self, collection_id: &str) -> AppResult<bool> {
        let known = self.known.lock().map_err(poisoned)?;
        Ok(known.contains(collection_id))
    }

    fn remember(&self, collection_id: &str, exists: bool) -> AppResult<()> {
        let mut known = self.known.lock().map_err(poisoned)?;
        if exists {
            known.insert(collection_id.to_string());
        } else {
            known.remove(collection_id);
        }
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::Other("Qdrant collection cache lock poisoned".to_string())
}

#[async_trait::async_trait]
impl VectorIndex for QdrantIndex {
    fn backend_name(&self) -> &str {
        "qdrant"
    }

    #[instrument(skip(self))]
    async fn create_collection(&self, collection_id: &str) -> AppResult<()> {
        let url = self.collection_url(collection_id, &[])?;

        match self.send::<()>(Method::GET, &url, None).await {
            Ok(response) => {
                let info: CollectionInfoResponse = response.json().await.map_err(|e| {
                    AppError::BackendUnavailable(format!(
                        "Invalid Qdrant collection response: {}",
                        e
                    ))
                })?;
                self.check_existing(collection_id, &info.result.config.params.vectors)?;
                debug!("Qdrant collection '{}' already exists", collection_id);
                return self.remember(collection_id, true);
            }
            Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: self.dimensions,
                distance: DISTANCE,
            },
        };
        self.send(Method::PUT, &url, Some(&body)).await?;

        debug!(
            "Created Qdrant collection '{}' (dimensions: {})",
            collection_id, self.dimensions
        );
        self.remember(collection_id, true)
    }

    async fn add(
        &self,
        collection_id: &str,
        vector: Vec<f32>,
        payload: Payload,
    ) -> AppResult<VectorId> {
        let mut ids = self
            .add_batch(collection_id, vec![(vector, payload)])
            .await?;
        ids.pop()
            .ok_or_else(|| AppError::Other("Qdrant upsert returned no id".to_string()))
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn add_batch(
        &self,
        collection_id: &str,
        entries: Vec<(Vec<f32>, Payload)>,
    ) -> AppResult<Vec<VectorId>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        if !self.is_known(collection_id)? {
            self.create_collection(collection_id).await?;
        }

        let points: Vec<Point<'_>> = entries
            .iter()
            .map(|(vector, payload)| Point {
                id: u64::from(payload.chunk_index),
                vector,
                payload,
            })
            .collect();

        let mut url = self.collection_url(collection_id, &["points"])?;
        url.query_pairs_mut().append_pair("wait", "true");
        self.send(Method::PUT, &url, Some(&UpsertRequest { points }))
            .await?;

        Ok(entries
            .iter()
            .map(|(_, payload)| VectorId::new(collection_id, payload.chunk_index))
            .collect())
    }

    async fn delete_collection(&self, collection_id: &str) -> AppResult<()> {
        let url = self.collection_url(collection_id, &[])?;

        match self.send::<()>(Method::DELETE, &url, None).await {
            Ok(_) | Err(AppError::NotFound(_)) => {
                debug!("Deleted Qdrant collection '{}'", collection_id);
                self.remember(collection_id, false)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, query_vector))]
    async fn search(
        &self,
        collection_id: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let url = self.collection_url(collection_id, &["points", "search"])?;
        let body = SearchRequest {
            vector: query_vector,
            limit: top_k,
            with_payload: true,
        };

        let response = match self.send(Method::POST, &url, Some(&body)).await {
            Ok(response) => response,
            Err(AppError::NotFound(_)) => {
                debug!("Qdrant collection '{}' not found, no results", collection_id);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            AppError::BackendUnavailable(format!("Invalid Qdrant search response: {}", e))
        })?;

        Ok(parsed
            .result
            .into_iter()
            .filter_map(|point| {
                point.payload.map(|payload| SearchResult {
                    payload,
                    similarity_score: point.score,
                })
            })
            .take(top_k)
            .collect())
    }

    async fn count(&self, collection_id: &str) -> AppResult<usize> {
        let url = self.collection_url(collection_id, &["points", "count"])?;
        let body = serde_json::json!({ "exact": true });

        match self.send(Method::POST, &url, Some(&body)).await {
            Ok(response) => {
                let parsed: CountResponse = response.json().await.map_err(|e| {
                    AppError::BackendUnavailable(format!("Invalid Qdrant count response: {}", e))
                })?;
                Ok(parsed.result.count)
            }
            Err(AppError::NotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn collection_info(size: usize, distance: &str) -> String {
        serde_json::json!({
            "result": {
                "status": "green",
                "config": {"params": {"vectors": {"size": size, "distance": distance}}}
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_collection_skips_existing() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/collections/c1")
            .with_status(200)
            .with_body(collection_info(4, "Cosine"))
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/collections/c1")
            .expect(0)
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 4).unwrap();
        index.create_collection("c1").await.unwrap();

        get.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_existing_collection_with_other_config_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        for (name, size, distance) in [("small", 8, "Cosine"), ("dot", 4, "Dot")] {
            server
                .mock("GET", format!("/collections/{}", name).as_str())
                .with_status(200)
                .with_body(collection_info(size, distance))
                .create_async()
                .await;
        }
        let put = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 4).unwrap();
        for name in ["small", "dot"] {
            let result = index.create_collection(name).await;
            assert!(matches!(result, Err(AppError::InvalidArgument(_))), "{}", name);
        }
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_to_mismatched_collection_does_not_upsert() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/c1")
            .with_status(200)
            .with_body(collection_info(3, "Cosine"))
            .create_async()
            .await;
        let upsert = server
            .mock("PUT", "/collections/c1/points")
            .expect(0)
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 2).unwrap();
        let result = index.add("c1", vec![0.1, 0.2], Payload::new(0, "zero")).await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
        upsert.assert_async().await;
    }

    #[tokio::test]
    async fn test_collection_id_is_one_path_segment() {
        let mut server = mockito::Server::new_async().await;
        let delete = server
            .mock("DELETE", "/collections/docs%2F2024%3Fdraft%23a")
            .with_status(200)
            .with_body(r#"{"result": true}"#)
            .expect(1)
            .create_async()
            .await;

        let index = QdrantIndex::new(&format!("{}/", server.url()), 2).unwrap();
        index.delete_collection("docs/2024?draft#a").await.unwrap();

        delete.assert_async().await;
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let result = QdrantIndex::new("not a url", 2);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_create_collection_uses_cosine() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/c1")
            .with_status(404)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/collections/c1")
            .match_body(Matcher::Json(serde_json::json!({
                "vectors": {"size": 4, "distance": "Cosine"}
            })))
            .with_status(200)
            .with_body(r#"{"result": true}"#)
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 4).unwrap();
        index.create_collection("c1").await.unwrap();

        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_uses_chunk_index_as_point_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/c1")
            .with_status(200)
            .with_body(collection_info(2, "Cosine"))
            .create_async()
            .await;
        let upsert = server
            .mock("PUT", "/collections/c1/points")
            .match_query(Matcher::UrlEncoded("wait".into(), "true".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""id":7,"#.to_string()),
                Matcher::Regex(r#""chunk_index":7"#.to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"result": {"status": "completed"}}"#)
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 2).unwrap();
        let id = index
            .add("c1", vec![0.1, 0.2], Payload::new(7, "seven"))
            .await
            .unwrap();

        assert_eq!(id.as_str(), "c1:7");
        upsert.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_parses_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/collections/c1/points/search")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "limit": 2, "with_payload": true
            })))
            .with_status(200)
            .with_body(
                r#"{"result": [
                    {"id": 1, "score": 0.93, "payload": {"chunk_index": 1, "content": "one", "file_id": "f"}},
                    {"id": 0, "score": 0.41, "payload": {"chunk_index": 0, "content": "zero"}}
                ]}"#,
            )
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 2).unwrap();
        let results = index.search("c1", &[0.1, 0.2], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].payload.content, "one");
        assert_eq!(results[0].payload.extra["file_id"], "f");
        assert!((results[0].similarity_score - 0.93).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_missing_collection_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/collections/missing/points/search")
            .with_status(404)
            .with_body(r#"{"status": {"error": "Collection `missing` doesn't exist!"}}"#)
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 2).unwrap();
        let results = index.search("missing", &[0.1, 0.2], 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_collection_is_noop() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/collections/missing")
            .with_status(404)
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 2).unwrap();
        assert!(index.delete_collection("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_server_error_is_backend_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/collections/c1/points/search")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let index = QdrantIndex::new(&server.url(), 2).unwrap();
        let result = index.search("c1", &[0.1, 0.2], 3).await;
        assert!(matches!(result, Err(AppError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_backend_unavailable() {
        let index = QdrantIndex::new("http://127.0.0.1:1", 2).unwrap();
        let result = index.create_collection("c1").await;
        assert!(matches!(result, Err(AppError::BackendUnavailable(_))));
    }
}
