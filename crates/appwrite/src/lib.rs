//! # Registry Appwrite
//!
//! Appwrite implementation of the registry backend capabilities.
//!
//! [`AppwriteClient`] talks to the Appwrite REST API with a server API key and implements:
//! - [`IdentityService`](registry_core::IdentityService) over the Users API
//! - [`DocumentStore`](registry_core::DocumentStore) over the Storage API
//! - [`RecordStore`](registry_core::RecordStore) over the Databases API
//!
//! Every non-success response is translated into a [`ServiceError`](registry_core::ServiceError)
//! from the status code and the `{message, code, type}` error body.

mod client;
mod databases;
mod error;
mod query;
mod storage;
mod users;

#[cfg(test)]
mod test_support;

pub use client::{AppwriteClient, AppwriteConfig, KEY_HEADER, PROJECT_HEADER};
pub use error::{AppwriteError, AppwriteResult};
pub use storage::CHUNK_SIZE;
