//! Structured diagnostics emitted by the registry.
//!
//! The registry reports what happened through an injected [`RegistryObserver`]; it never logs
//! directly. [`TracingObserver`] is the default and forwards every event to `tracing`.

use crate::error::{RegistryError, ServiceError};
use registry_id::UniqueId;

/// Registry operation an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    CreateUser,
    GetUser,
    RegisterPatient,
    GetPatient,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::CreateUser => "create_user",
            Operation::GetUser => "get_user",
            Operation::RegisterPatient => "register_patient",
            Operation::GetPatient => "get_patient",
        }
    }
}

#[derive(Debug)]
pub enum RegistryEvent<'a> {
    /// A registration request arrived.
    RegistrationReceived {
        user_id: &'a UniqueId,
        birth_date_kind: Option<&'static str>,
        document_present: bool,
        optional_fields: usize,
    },
    /// The record payload is ready to be submitted.
    PayloadPrepared {
        user_id: &'a UniqueId,
        keys: Vec<&'a str>,
    },
    DocumentUploaded {
        file_id: &'a UniqueId,
        size_bytes: u64,
    },
    /// Account creation hit a duplicate email and the existing account was returned.
    UserConflictResolved {
        email: &'a str,
        user_id: &'a UniqueId,
    },
    /// Create reported the email as taken but no account matched it.
    UserConflictUnresolved {
        email: &'a str,
    },
    DuplicatePatientRejected {
        user_id: &'a UniqueId,
    },
    /// Caller input failed validation before any backend call.
    InputRejected {
        operation: Operation,
        error: &'a RegistryError,
    },
    /// A stored patient document did not parse as a patient record.
    UnreadableRecord {
        operation: Operation,
        document_id: &'a UniqueId,
        error: &'a RegistryError,
    },
    ServiceFailed {
        operation: Operation,
        error: &'a ServiceError,
    },
    /// The record store rejected the payload shape; the collection attributes need checking.
    SchemaMismatch {
        error: &'a ServiceError,
    },
    /// An uploaded file was removed after record creation failed.
    UploadCompensated {
        file_id: &'a UniqueId,
    },
    CompensationFailed {
        file_id: &'a UniqueId,
        error: &'a ServiceError,
    },
}

impl RegistryEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::RegistrationReceived { .. } => "registration_received",
            RegistryEvent::PayloadPrepared { .. } => "payload_prepared",
            RegistryEvent::DocumentUploaded { .. } => "document_uploaded",
            RegistryEvent::UserConflictResolved { .. } => "user_conflict_resolved",
            RegistryEvent::UserConflictUnresolved { .. } => "user_conflict_unresolved",
            RegistryEvent::DuplicatePatientRejected { .. } => "duplicate_patient_rejected",
            RegistryEvent::InputRejected { .. } => "input_rejected",
            RegistryEvent::UnreadableRecord { .. } => "unreadable_record",
            RegistryEvent::ServiceFailed { .. } => "service_failed",
            RegistryEvent::SchemaMismatch { .. } => "schema_mismatch",
            RegistryEvent::UploadCompensated { .. } => "upload_compensated",
            RegistryEvent::CompensationFailed { .. } => "compensation_failed",
        }
    }
}

/// Receives registry diagnostics.
pub trait RegistryObserver: Send + Sync {
    fn record(&self, event: &RegistryEvent<'_>);
}

/// Forwards registry events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl RegistryObserver for TracingObserver {
    fn record(&self, event: &RegistryEvent<'_>) {
        match event {
            RegistryEvent::RegistrationReceived {
                user_id,
                birth_date_kind,
                document_present,
                optional_fields,
            } => tracing::debug!(
                %user_id,
                birth_date_kind = birth_date_kind.unwrap_or("absent"),
                document_present,
                optional_fields,
                "registration received"
            ),
            RegistryEvent::PayloadPrepared { user_id, keys } => {
                tracing::debug!(%user_id, keys = ?keys, "patient payload prepared")
            }
            RegistryEvent::DocumentUploaded {
                file_id,
                size_bytes,
            } => tracing::info!(%file_id, size_bytes, "identification document uploaded"),
            RegistryEvent::UserConflictResolved { email, user_id } => tracing::info!(
                email,
                %user_id,
                "email already registered, returning existing account"
            ),
            RegistryEvent::UserConflictUnresolved { email } => tracing::error!(
                email,
                "email reported as registered but no matching account was found"
            ),
            RegistryEvent::DuplicatePatientRejected { user_id } => {
                tracing::warn!(%user_id, "patient already registered for user")
            }
            RegistryEvent::InputRejected { operation, error } => tracing::warn!(
                operation = operation.as_str(),
                error = %error,
                "request rejected"
            ),
            RegistryEvent::UnreadableRecord {
                operation,
                document_id,
                error,
            } => tracing::error!(
                operation = operation.as_str(),
                %document_id,
                error = %error,
                "stored patient document could not be read"
            ),
            RegistryEvent::ServiceFailed { operation, error } => tracing::error!(
                operation = operation.as_str(),
                code = error.code(),
                kind = error.kind(),
                error = %error,
                "backend request failed"
            ),
            RegistryEvent::SchemaMismatch { error } => tracing::error!(
                kind = error.kind(),
                "possible schema mismatch, check the patient collection attributes"
            ),
            RegistryEvent::UploadCompensated { file_id } => {
                tracing::warn!(%file_id, "removed uploaded document after record failure")
            }
            RegistryEvent::CompensationFailed { file_id, error } => tracing::error!(
                %file_id,
                error = %error,
                "failed to remove uploaded document, file is orphaned"
            ),
        }
    }
}
