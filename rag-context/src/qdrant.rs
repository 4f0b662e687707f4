//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! One Qdrant collection backs the store. Namespaces are a `namespace` payload
//! field filtered on at search time, and record ids are mapped to UUIDv5 point
//! ids (Qdrant only accepts integers and UUIDs); the original id is kept in the
//! payload under `id`. Record metadata is nested under `metadata` so that its
//! keys never collide with these fields.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_context::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334", "career-coach")?;
//! store.ensure_collection(1536).await?;
//! let matches = store.search("stuart", &query_embedding, 5).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
    PointStruct, PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Number, Value};
use tracing::debug;
use uuid::Uuid;

use crate::document::{Metadata, SearchMatch, VectorRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const NAMESPACE_FIELD: &str = "namespace";
const ID_FIELD: &str = "id";
const METADATA_FIELD: &str = "metadata";

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    pub fn new(url: &str, collection: impl Into<String>) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client, collection: collection.into() })
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant, collection: impl Into<String>) -> Self {
        Self { client, collection: collection.into() }
    }

    /// Create the backing collection with cosine distance. No-op if it exists.
    pub async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        if collections.collections.iter().any(|c| c.name == self.collection) {
            debug!(collection = %self.collection, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, dimensions, "created qdrant collection");
        Ok(())
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStoreError { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn namespace_filter(namespace: &str) -> Filter {
        Filter::must([Condition::matches(NAMESPACE_FIELD, namespace.to_string())])
    }
}

/// Deterministic point id for a record id within a namespace.
fn point_uuid(namespace: &str, id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{namespace}/{id}").as_bytes()).to_string()
}

/// Payload stored for `record`: its id, namespace and nested metadata.
fn payload_json(namespace: &str, record: &VectorRecord) -> Value {
    let metadata: Map<String, Value> =
        record.metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let mut payload = Map::new();
    payload.insert(ID_FIELD.to_string(), Value::String(record.id.clone()));
    payload.insert(NAMESPACE_FIELD.to_string(), Value::String(namespace.to_string()));
    payload.insert(METADATA_FIELD.to_string(), Value::Object(metadata));
    Value::Object(payload)
}

/// Split a stored payload back into the record id and its metadata.
fn from_payload(payload: &HashMap<String, QdrantValue>) -> (String, Metadata) {
    let id = match payload.get(ID_FIELD).map(to_json) {
        Some(Value::String(id)) => id,
        _ => String::new(),
    };
    let metadata = match payload.get(METADATA_FIELD).map(to_json) {
        Some(Value::Object(fields)) => fields.into_iter().collect(),
        _ => Metadata::new(),
    };
    (id, metadata)
}

/// Convert a Qdrant payload value back to JSON.
fn to_json(value: &QdrantValue) -> Value {
    match &value.kind {
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => Value::from(*i),
        Some(Kind::DoubleValue(d)) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
        Some(Kind::ListValue(list)) => Value::Array(list.values.iter().map(to_json).collect()),
        Some(Kind::StructValue(s)) => {
            Value::Object(s.fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
        }
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points = records
            .iter()
            .map(|record| {
                let payload =
                    Payload::try_from(payload_json(namespace, record)).map_err(Self::map_err)?;
                Ok(PointStruct::new(
                    point_uuid(namespace, &record.id),
                    record.values.clone(),
                    payload,
                ))
            })
            .collect::<Result<Vec<PointStruct>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, namespace, count = records.len(), "upserted records to qdrant");
        Ok(())
    }

    async fn delete(&self, namespace: &str, ids: &[&str]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.iter().map(|id| point_uuid(namespace, id).into()).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, namespace, count = ids.len(), "deleted points from qdrant");
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchMatch>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding.to_vec(), top_k as u64)
                    .filter(Self::namespace_filter(namespace))
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let matches = response
            .result
            .into_iter()
            .map(|scored| {
                let (id, metadata) = from_payload(&scored.payload);
                SearchMatch { id, score: scored.score, metadata }
            })
            .collect();

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use qdrant_client::qdrant::Struct;

    use super::*;

    #[test]
    fn point_ids_are_deterministic_per_namespace() {
        assert_eq!(point_uuid("a", "doc_0"), point_uuid("a", "doc_0"));
        assert_ne!(point_uuid("a", "doc_0"), point_uuid("b", "doc_0"));
        assert!(Uuid::parse_str(&point_uuid("a", "doc_0")).is_ok());
    }

    #[test]
    fn payload_values_convert_to_json() {
        let value = QdrantValue { kind: Some(Kind::StringValue("resume".into())) };
        assert_eq!(to_json(&value), Value::String("resume".into()));
        let value = QdrantValue { kind: Some(Kind::IntegerValue(3)) };
        assert_eq!(to_json(&value), Value::from(3));
        assert_eq!(to_json(&QdrantValue { kind: None }), Value::Null);
    }

    fn string_value(s: &str) -> QdrantValue {
        QdrantValue { kind: Some(Kind::StringValue(s.to_string())) }
    }

    #[test]
    fn reserved_names_in_metadata_survive_round_trip() {
        let record = VectorRecord {
            id: "doc_7".into(),
            values: vec![0.1, 0.2],
            metadata: Metadata::from([
                ("text".to_string(), Value::from("Follow up within a day.")),
                ("id".to_string(), Value::from("crm-991")),
                ("namespace".to_string(), Value::from("alumni")),
            ]),
        };

        let stored = payload_json("stuart", &record);
        assert_eq!(stored[ID_FIELD], "doc_7");
        assert_eq!(stored[NAMESPACE_FIELD], "stuart");
        assert_eq!(stored[METADATA_FIELD]["id"], "crm-991");

        let nested: HashMap<String, QdrantValue> = record
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), string_value(v.as_str().unwrap())))
            .collect();
        let payload = HashMap::from([
            (ID_FIELD.to_string(), string_value("doc_7")),
            (NAMESPACE_FIELD.to_string(), string_value("stuart")),
            (
                METADATA_FIELD.to_string(),
                QdrantValue { kind: Some(Kind::StructValue(Struct { fields: nested })) },
            ),
        ]);
        let (id, metadata) = from_payload(&payload);
        assert_eq!(id, "doc_7");
        assert_eq!(metadata, record.metadata);
    }
}
