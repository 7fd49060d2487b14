//! Capabilities the registry consumes from the hosted backend.
//!
//! Each trait mirrors one backend service. Implementations translate backend failures into
//! [`ServiceError`] so the registry can tell conflicts and missing resources apart from
//! transient failures.

use crate::error::ServiceResult;
use crate::patient::IdentificationDocument;
use crate::user::{NewUser, UserAccount};
use async_trait::async_trait;
use registry_id::UniqueId;
use registry_types::EmailAddress;
use serde_json::{Map, Value};

/// Account management.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Create an account. Fails with [`ServiceError::Conflict`](crate::ServiceError::Conflict)
    /// when the email is already registered.
    async fn create(&self, user_id: &UniqueId, user: &NewUser) -> ServiceResult<UserAccount>;

    /// Fetch an account. Fails with [`ServiceError::NotFound`](crate::ServiceError::NotFound)
    /// for an unknown id.
    async fn get(&self, user_id: &UniqueId) -> ServiceResult<UserAccount>;

    /// Accounts whose email matches exactly.
    async fn list_by_email(&self, email: &EmailAddress) -> ServiceResult<Vec<UserAccount>>;
}

/// Binary file storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upload(
        &self,
        bucket_id: &UniqueId,
        file_id: &UniqueId,
        document: &IdentificationDocument,
    ) -> ServiceResult<StoredFile>;

    async fn delete(&self, bucket_id: &UniqueId, file_id: &UniqueId) -> ServiceResult<()>;
}

/// Structured document persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_document(
        &self,
        database_id: &UniqueId,
        collection_id: &UniqueId,
        document_id: &UniqueId,
        payload: &Map<String, Value>,
    ) -> ServiceResult<StoredDocument>;

    async fn list_documents(
        &self,
        database_id: &UniqueId,
        collection_id: &UniqueId,
        queries: &[Query],
    ) -> ServiceResult<Vec<StoredDocument>>;
}

/// A file accepted by the document store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub id: UniqueId,
    pub name: String,
    pub size_bytes: u64,
}

/// A document held by the record store.
///
/// `fields` holds the caller-defined attributes; service metadata is not included.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
    pub id: UniqueId,
    pub collection_id: String,
    pub fields: Map<String, Value>,
}

/// Filters and modifiers understood by list operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// Attribute equals any of the given values.
    Equal { attribute: String, values: Vec<Value> },
    /// Return at most this many results.
    Limit(u32),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn limit(limit: u32) -> Self {
        Query::Limit(limit)
    }

    /// True if `fields` satisfies this query. Modifiers such as [`Query::Limit`] always match.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Query::Equal { attribute, values } => fields
                .get(attribute)
                .is_some_and(|actual| values.iter().any(|v| v == actual)),
            Query::Limit(_) => true,
        }
    }
}
