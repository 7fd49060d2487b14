//! # Registry Core
//!
//! Core business logic for the patient registry.
//!
//! This crate contains the registry facade and the types it works with:
//! - Account creation and lookup through an identity service
//! - Patient registration with an optional identification document upload
//! - Patient lookup by user account
//! - Capability traits for the hosted backend, plus in-memory implementations
//!
//! **No API concerns**: HTTP servers, request authentication and wire types belong in
//! `api-rest` or `api-shared`. The hosted backend client lives in `registry-appwrite`.

pub mod birth_date;
pub mod config;
pub mod constants;
pub mod error;
pub mod memory;
pub mod observer;
pub mod patient;
pub mod registry;
pub mod services;
pub mod user;

pub use birth_date::BirthDateInput;
pub use config::{BackendKind, RegistryConfig};
pub use error::{RegistryError, RegistryResult, ServiceError, ServiceFailure, ServiceResult};
pub use observer::{Operation, RegistryEvent, RegistryObserver, TracingObserver};
pub use patient::{IdentificationDocument, Patient, PatientRecord, RegisterPatientParams};
pub use registry::PatientRegistry;
pub use services::{DocumentStore, IdentityService, Query, RecordStore, StoredDocument, StoredFile};
pub use user::{NewUser, UserAccount};

pub use registry_id::{IdError, UniqueId};
pub use registry_types::{EmailAddress, NonEmptyText, TextError};
