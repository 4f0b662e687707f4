//! Pinecone vector store backend.
//!
//! Provides [`PineconeVectorStore`] which implements [`VectorStore`] against the
//! Pinecone data-plane REST API using `reqwest`. Namespaces map directly to
//! Pinecone namespaces within one index.
//!
//! This module is only available when the `pinecone` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_context::pinecone::PineconeVectorStore;
//!
//! let store = PineconeVectorStore::connect("pc-...", "career-coach").await?;
//! let matches = store.search("stuart", &query_embedding, 5).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{Metadata, SearchMatch, VectorRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The Pinecone control-plane endpoint used to resolve index hosts.
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// The API version sent with every request.
const API_VERSION: &str = "2024-07";

/// A [`VectorStore`] backed by a [Pinecone](https://www.pinecone.io/) index.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    host: String,
}

impl PineconeVectorStore {
    /// Create a store for an index served at `host`.
    ///
    /// `host` may omit the scheme, as the control plane reports it.
    pub fn new(api_key: impl Into<String>, host: impl AsRef<str>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Self::map_err("API key must not be empty".into()));
        }
        Ok(Self { client: reqwest::Client::new(), api_key, host: normalize_host(host.as_ref()) })
    }

    /// Resolve the host of `index_name` through the control plane and connect to it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the index cannot be described.
    pub async fn connect(api_key: impl Into<String>, index_name: &str) -> Result<Self> {
        let api_key = api_key.into();
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{CONTROL_PLANE_URL}/indexes/{index_name}"))
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| Self::map_err(format!("describe index '{index_name}' failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(backend = "pinecone", index = index_name, %status, "describe index failed");
            return Err(Self::map_err(format!("describe index '{index_name}' returned {status}: {body}")));
        }

        let description: IndexDescription = response
            .json()
            .await
            .map_err(|e| Self::map_err(format!("failed to parse index description: {e}")))?;

        debug!(backend = "pinecone", index = index_name, host = %description.host, "resolved index host");
        let mut store = Self::new(api_key, &description.host)?;
        store.client = client;
        Ok(store)
    }

    /// Create a store from `PINECONE_API_KEY` and either `PINECONE_INDEX_HOST`
    /// or, when that is unset, the host of `index_name`.
    pub async fn from_env(index_name: &str) -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| Self::map_err("PINECONE_API_KEY environment variable not set".into()))?;
        match std::env::var("PINECONE_INDEX_HOST") {
            Ok(host) => Self::new(api_key, host),
            Err(_) => Self::connect(api_key, index_name).await,
        }
    }

    /// The data-plane base URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn map_err(message: String) -> RagError {
        RagError::VectorStoreError { backend: "pinecone".to_string(), message }
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "pinecone", path, error = %e, "request failed");
                Self::map_err(format!("request to {path} failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(backend = "pinecone", path, %status, "API error");
            return Err(Self::map_err(format!("{path} returned {status}: {body}")));
        }
        Ok(response)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [&'a str],
    namespace: &'a str,
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.post("/vectors/upsert", &UpsertRequest { vectors: records, namespace }).await?;
        debug!(backend = "pinecone", namespace, count = records.len(), "upserted records");
        Ok(())
    }

    async fn delete(&self, namespace: &str, ids: &[&str]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.post("/vectors/delete", &DeleteRequest { ids, namespace }).await?;
        debug!(backend = "pinecone", namespace, count = ids.len(), "deleted records");
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchMatch>> {
        let request = QueryRequest {
            namespace,
            vector: embedding,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let response: QueryResponse = self
            .post("/query", &request)
            .await?
            .json()
            .await
            .map_err(|e| Self::map_err(format!("failed to parse query response: {e}")))?;

        debug!(backend = "pinecone", namespace, count = response.matches.len(), "query completed");
        Ok(response
            .matches
            .into_iter()
            .map(|m| SearchMatch { id: m.id, score: m.score, metadata: m.metadata.unwrap_or_default() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn hosts_get_https_scheme() {
        assert_eq!(normalize_host("idx-abc.svc.pinecone.io"), "https://idx-abc.svc.pinecone.io");
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn query_request_uses_camel_case() {
        let vector = [0.1f32, 0.2];
        let body = QueryRequest {
            namespace: "stuart",
            vector: &vector,
            top_k: 5,
            include_metadata: true,
            include_values: false,
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["topK"], json!(5));
        assert_eq!(value["includeMetadata"], json!(true));
        assert_eq!(value["namespace"], json!("stuart"));
    }

    #[test]
    fn query_response_tolerates_missing_metadata() {
        let response: QueryResponse = serde_json::from_value(json!({
            "matches": [
                {"id": "doc_0", "score": 0.91, "metadata": {"text": "Tailor your resume."}},
                {"id": "doc_1", "score": 0.42}
            ],
            "namespace": "stuart"
        }))
        .unwrap();
        assert_eq!(response.matches.len(), 2);
        assert!(response.matches[1].metadata.is_none());
    }

    #[test]
    fn upsert_request_shape() {
        let records = vec![VectorRecord {
            id: "doc_0".into(),
            values: vec![1.0],
            metadata: Metadata::from([("text".to_string(), json!("hi"))]),
        }];
        let value =
            serde_json::to_value(UpsertRequest { vectors: &records, namespace: "ns" }).unwrap();
        assert_eq!(
            value,
            json!({"vectors": [{"id": "doc_0", "values": [1.0], "metadata": {"text": "hi"}}], "namespace": "ns"})
        );
    }
}
