//! Databases API.

use crate::client::AppwriteClient;
use crate::query;
use async_trait::async_trait;
use registry_core::{Query, RecordStore, ServiceResult, StoredDocument, UniqueId};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// A document as returned by Appwrite: caller attributes plus `$`-prefixed metadata.
#[derive(Debug, Deserialize)]
struct DocumentBody {
    #[serde(rename = "$id")]
    id: UniqueId,
    #[serde(rename = "$collectionId", default)]
    collection_id: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl DocumentBody {
    fn into_stored(self, collection_id: &UniqueId) -> StoredDocument {
        let fields = self
            .fields
            .into_iter()
            .filter(|(key, _)| !key.starts_with('$'))
            .collect();

        StoredDocument {
            id: self.id,
            collection_id: self
                .collection_id
                .unwrap_or_else(|| collection_id.to_string()),
            fields,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<DocumentBody>,
}

fn documents_path(database_id: &UniqueId, collection_id: &UniqueId) -> String {
    format!(
        "/databases/{}/collections/{}/documents",
        database_id, collection_id
    )
}

#[async_trait]
impl RecordStore for AppwriteClient {
    async fn create_document(
        &self,
        database_id: &UniqueId,
        collection_id: &UniqueId,
        document_id: &UniqueId,
        payload: &Map<String, Value>,
    ) -> ServiceResult<StoredDocument> {
        let body = json!({
            "documentId": document_id.as_str(),
            "data": payload,
        });

        let created: DocumentBody = self
            .send_json(
                self.request(Method::POST, &documents_path(database_id, collection_id))
                    .json(&body),
            )
            .await?;
        Ok(created.into_stored(collection_id))
    }

    async fn list_documents(
        &self,
        database_id: &UniqueId,
        collection_id: &UniqueId,
        queries: &[Query],
    ) -> ServiceResult<Vec<StoredDocument>> {
        let list: DocumentList = self
            .send_json(
                self.request(Method::GET, &documents_path(database_id, collection_id))
                    .query(&query::params(queries)),
            )
            .await?;

        Ok(list
            .documents
            .into_iter()
            .map(|d| d.into_stored(collection_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_for, has_credentials, id};
    use axum::extract::{Path, RawQuery};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    const DOCUMENTS: &str = "/databases/:db/collections/:coll/documents";

    fn stored_json(id: &str, data: &Value) -> Value {
        let mut doc = json!({
            "$id": id,
            "$collectionId": "patients",
            "$databaseId": "db1",
            "$createdAt": "2024-01-01T00:00:00.000+00:00",
            "$updatedAt": "2024-01-01T00:00:00.000+00:00",
            "$permissions": []
        });
        if let (Some(target), Some(data)) = (doc.as_object_mut(), data.as_object()) {
            target.extend(data.clone());
        }
        doc
    }

    fn payload() -> Map<String, Value> {
        json!({
            "userId": "u1",
            "name": "Jane Doe",
            "gender": "female",
            "identificationDocumentId": null,
            "privacyConsent": true
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_document_wraps_payload_and_strips_metadata() {
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let routes = Router::new().route(
            DOCUMENTS,
            post(
                move |Path((db, coll)): Path<(String, String)>,
                      headers: HeaderMap,
                      Json(body): Json<Value>| {
                    let captured = captured.clone();
                    async move {
                        assert!(has_credentials(&headers));
                        assert_eq!((db.as_str(), coll.as_str()), ("db1", "patients"));
                        let doc_id = body["documentId"].as_str().unwrap_or_default().to_string();
                        let stored = stored_json(&doc_id, &body["data"]);
                        *captured.lock().unwrap() = Some(body);
                        (StatusCode::CREATED, Json(stored))
                    }
                },
            ),
        );
        let client = client_for(routes).await;

        let document = client
            .create_document(&id("db1"), &id("patients"), &id("d1"), &payload())
            .await
            .expect("create_document should succeed");

        assert_eq!(document.id.as_str(), "d1");
        assert_eq!(document.collection_id, "patients");
        assert_eq!(document.fields, payload());

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["documentId"], "d1");
        assert_eq!(body["data"], Value::Object(payload()));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_validation() {
        let routes = Router::new().route(
            DOCUMENTS,
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Invalid document structure: Unknown attribute: \"blobFile\"",
                        "code": 400,
                        "type": "document_invalid_structure"
                    })),
                )
            }),
        );
        let client = client_for(routes).await;

        let err = client
            .create_document(&id("db1"), &id("patients"), &id("d1"), &payload())
            .await
            .unwrap_err();

        assert!(err.is_schema_mismatch());
    }

    #[tokio::test]
    async fn test_list_documents_sends_queries() {
        let seen = Arc::new(Mutex::new(String::new()));
        let captured = seen.clone();
        let routes = Router::new().route(
            DOCUMENTS,
            get(move |RawQuery(raw): RawQuery| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = raw.unwrap_or_default();
                    Json(json!({
                        "total": 1,
                        "documents": [stored_json("d1", &Value::Object(payload()))]
                    }))
                }
            }),
        );
        let client = client_for(routes).await;

        let documents = client
            .list_documents(
                &id("db1"),
                &id("patients"),
                &[Query::equal("userId", "u1"), Query::limit(1)],
            )
            .await
            .expect("list_documents should succeed");

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].fields.get("userId"), Some(&json!("u1")));
        assert!(documents[0].fields.keys().all(|k| !k.starts_with('$')));

        let raw = seen.lock().unwrap().clone();
        let uri: axum::http::Uri = format!("/?{}", raw).parse().unwrap();
        let pairs = axum::extract::Query::<Vec<(String, String)>>::try_from_uri(&uri)
            .unwrap()
            .0;
        let queries: Vec<Value> = pairs
            .iter()
            .map(|(_, v)| serde_json::from_str(v).unwrap())
            .collect();
        assert_eq!(
            queries,
            vec![
                json!({"method": "equal", "attribute": "userId", "values": ["u1"]}),
                json!({"method": "limit", "values": [1]}),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_list() {
        let routes = Router::new().route(
            DOCUMENTS,
            get(|| async { Json(json!({"total": 0, "documents": []})) }),
        );
        let client = client_for(routes).await;

        let documents = client
            .list_documents(&id("db1"), &id("patients"), &[])
            .await
            .unwrap();
        assert!(documents.is_empty());
    }
}
