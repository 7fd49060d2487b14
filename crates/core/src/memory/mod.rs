//! Process-local implementations of the backend capabilities.
//!
//! These stores back the registry in tests and in local development
//! (`REGISTRY_BACKEND=memory`). They follow the same failure contract as the hosted backend:
//! duplicate emails and duplicate ids are conflicts, unknown ids are not found.

use crate::error::{ServiceError, ServiceFailure, ServiceResult};
use crate::patient::IdentificationDocument;
use crate::services::{DocumentStore, IdentityService, Query, RecordStore, StoredDocument, StoredFile};
use crate::user::{NewUser, UserAccount};
use async_trait::async_trait;
use registry_id::UniqueId;
use registry_types::EmailAddress;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> ServiceResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ServiceError::Transient(ServiceFailure::new("in-memory store lock poisoned")))
}

fn conflict(kind: &str, message: String) -> ServiceError {
    ServiceError::Conflict(ServiceFailure::new(message).with_code(409).with_kind(kind))
}

fn not_found(kind: &str, message: String) -> ServiceError {
    ServiceError::NotFound(ServiceFailure::new(message).with_code(404).with_kind(kind))
}

/// Accounts held in memory, unique by id and by email.
#[derive(Debug, Default)]
pub struct MemoryIdentityService {
    users: Mutex<Vec<UserAccount>>,
}

impl MemoryIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.users).map(|u| u.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityService for MemoryIdentityService {
    async fn create(&self, user_id: &UniqueId, user: &NewUser) -> ServiceResult<UserAccount> {
        let mut users = lock(&self.users)?;

        if users.iter().any(|u| u.id == *user_id) {
            return Err(conflict(
                "user_already_exists",
                format!("a user with id {} already exists", user_id),
            ));
        }
        if users.iter().any(|u| u.email == user.email.as_str()) {
            return Err(conflict(
                "user_already_exists",
                format!("a user with email {} already exists", user.email),
            ));
        }

        let account = UserAccount {
            id: user_id.clone(),
            email: user.email.to_string(),
            phone: user.phone.to_string(),
            name: user.name.to_string(),
        };
        users.push(account.clone());
        Ok(account)
    }

    async fn get(&self, user_id: &UniqueId) -> ServiceResult<UserAccount> {
        lock(&self.users)?
            .iter()
            .find(|u| u.id == *user_id)
            .cloned()
            .ok_or_else(|| not_found("user_not_found", format!("user {} not found", user_id)))
    }

    async fn list_by_email(&self, email: &EmailAddress) -> ServiceResult<Vec<UserAccount>> {
        Ok(lock(&self.users)?
            .iter()
            .filter(|u| u.email == email.as_str())
            .cloned()
            .collect())
    }
}

/// Files held in memory, keyed by bucket and file id.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    files: Mutex<HashMap<(UniqueId, UniqueId), IdentificationDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, bucket_id: &UniqueId, file_id: &UniqueId) -> bool {
        lock(&self.files)
            .map(|f| f.contains_key(&(bucket_id.clone(), file_id.clone())))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        lock(&self.files).map(|f| f.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn upload(
        &self,
        bucket_id: &UniqueId,
        file_id: &UniqueId,
        document: &IdentificationDocument,
    ) -> ServiceResult<StoredFile> {
        let mut files = lock(&self.files)?;
        let key = (bucket_id.clone(), file_id.clone());
        if files.contains_key(&key) {
            return Err(conflict(
                "storage_file_already_exists",
                format!("file {} already exists", file_id),
            ));
        }
        files.insert(key, document.clone());

        Ok(StoredFile {
            id: file_id.clone(),
            name: document.file_name().to_string(),
            size_bytes: document.len() as u64,
        })
    }

    async fn delete(&self, bucket_id: &UniqueId, file_id: &UniqueId) -> ServiceResult<()> {
        lock(&self.files)?
            .remove(&(bucket_id.clone(), file_id.clone()))
            .map(|_| ())
            .ok_or_else(|| {
                not_found(
                    "storage_file_not_found",
                    format!("file {} not found", file_id),
                )
            })
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    database_id: UniqueId,
    document: StoredDocument,
}

/// Documents held in memory.
///
/// Attributes registered with [`MemoryRecordStore::with_unique_attribute`] behave like a
/// unique index: creating a second document with the same value is a conflict.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    documents: Mutex<Vec<StoredEntry>>,
    unique: Vec<(String, String)>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique_attribute(
        mut self,
        collection_id: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        self.unique.push((collection_id.into(), attribute.into()));
        self
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).map(|d| d.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_document(
        &self,
        database_id: &UniqueId,
        collection_id: &UniqueId,
        document_id: &UniqueId,
        payload: &Map<String, Value>,
    ) -> ServiceResult<StoredDocument> {
        let mut documents = lock(&self.documents)?;
        let in_collection = |entry: &&StoredEntry| {
            entry.database_id == *database_id
                && entry.document.collection_id == collection_id.as_str()
        };

        if documents
            .iter()
            .filter(in_collection)
            .any(|e| e.document.id == *document_id)
        {
            return Err(conflict(
                "document_already_exists",
                format!("document {} already exists", document_id),
            ));
        }

        for (collection, attribute) in &self.unique {
            if collection != collection_id.as_str() {
                continue;
            }
            let Some(value) = payload.get(attribute) else {
                continue;
            };
            if documents
                .iter()
                .filter(in_collection)
                .any(|e| e.document.fields.get(attribute) == Some(value))
            {
                return Err(conflict(
                    "document_already_exists",
                    format!("a document with {} = {} already exists", attribute, value),
                ));
            }
        }

        let document = StoredDocument {
            id: document_id.clone(),
            collection_id: collection_id.to_string(),
            fields: payload.clone(),
        };
        documents.push(StoredEntry {
            database_id: database_id.clone(),
            document: document.clone(),
        });
        Ok(document)
    }

    async fn list_documents(
        &self,
        database_id: &UniqueId,
        collection_id: &UniqueId,
        queries: &[Query],
    ) -> ServiceResult<Vec<StoredDocument>> {
        let limit = queries
            .iter()
            .filter_map(|q| match q {
                Query::Limit(n) => Some(*n as usize),
                _ => None,
            })
            .min()
            .unwrap_or(usize::MAX);

        Ok(lock(&self.documents)?
            .iter()
            .filter(|e| {
                e.database_id == *database_id
                    && e.document.collection_id == collection_id.as_str()
            })
            .filter(|e| queries.iter().all(|q| q.matches(&e.document.fields)))
            .take(limit)
            .map(|e| e.document.clone())
            .collect())
    }
}
