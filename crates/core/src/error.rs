use crate::constants::SCHEMA_MISMATCH_KIND;
use registry_id::{IdError, UniqueId};
use registry_types::TextError;
use std::fmt;

/// Diagnostic detail reported by a remote service.
///
/// `code` is the HTTP-style status the service returned, `kind` its machine-readable error
/// type (for example `user_already_exists`). Either may be absent for transport failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceFailure {
    pub code: Option<u16>,
    pub kind: Option<String>,
    pub message: String,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            kind: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        match (self.code, self.kind.as_deref()) {
            (Some(code), Some(kind)) => write!(f, " (code {}, type {})", code, kind),
            (Some(code), None) => write!(f, " (code {})", code),
            (None, Some(kind)) => write!(f, " (type {})", kind),
            (None, None) => Ok(()),
        }
    }
}

/// Failure categories reported by the identity service, document store and record store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The resource already exists (for example, a duplicate email).
    #[error("conflict: {0}")]
    Conflict(ServiceFailure),
    #[error("not found: {0}")]
    NotFound(ServiceFailure),
    /// The service rejected the payload shape, including schema mismatches.
    #[error("validation failed: {0}")]
    Validation(ServiceFailure),
    #[error("upload failed: {0}")]
    Upload(ServiceFailure),
    /// Authentication, permission or other client-side rejection.
    #[error("request rejected: {0}")]
    Rejected(ServiceFailure),
    /// Network or service-side failure.
    #[error("transient failure: {0}")]
    Transient(ServiceFailure),
}

impl ServiceError {
    pub fn failure(&self) -> &ServiceFailure {
        match self {
            ServiceError::Conflict(f)
            | ServiceError::NotFound(f)
            | ServiceError::Validation(f)
            | ServiceError::Upload(f)
            | ServiceError::Rejected(f)
            | ServiceError::Transient(f) => f,
        }
    }

    pub fn code(&self) -> Option<u16> {
        self.failure().code
    }

    pub fn kind(&self) -> Option<&str> {
        self.failure().kind.as_deref()
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }

    /// True when the record store reported that the payload does not fit the collection schema.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, ServiceError::Validation(_)) && self.kind() == Some(SCHEMA_MISMATCH_KIND)
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
    #[error("invalid identifier: {0}")]
    Id(#[from] IdError),
    #[error("invalid birth date: {0}")]
    InvalidBirthDate(String),
    #[error("failed to serialize patient payload: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize stored patient: {0}")]
    Deserialization(serde_json::Error),
    #[error("patient record {document_id} was stored but could not be read back: {source}")]
    UnreadableCreatedRecord {
        document_id: UniqueId,
        #[source]
        source: serde_json::Error,
    },

    #[error("a patient is already registered for user {user_id}")]
    PatientAlreadyRegistered { user_id: UniqueId },
    #[error("email {email} is already taken but no matching account was found")]
    UnresolvedUserConflict { email: String },

    #[error("identity service error: {0}")]
    Identity(#[source] ServiceError),
    #[error("document store error: {0}")]
    DocumentStore(#[source] ServiceError),
    #[error("record store error: {0}")]
    RecordStore(#[source] ServiceError),

    #[error(
        "record creation failed and removing uploaded file {file_id} also failed: record={record_error}; cleanup={cleanup_error}"
    )]
    CleanupAfterRecordFailed {
        file_id: UniqueId,
        #[source]
        record_error: Box<RegistryError>,
        cleanup_error: ServiceError,
    },
}

impl RegistryError {
    /// Returns the remote service error behind this failure, if there is one.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            RegistryError::Identity(e)
            | RegistryError::DocumentStore(e)
            | RegistryError::RecordStore(e) => Some(e),
            RegistryError::CleanupAfterRecordFailed { record_error, .. } => {
                record_error.service_error()
            }
            _ => None,
        }
    }
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
