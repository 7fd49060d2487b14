use api_shared::{AuthError, ErrorRes};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use registry_core::{RegistryError, ServiceError};

/// A failed request: the status to return and the error body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorRes,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorRes::new(code, message),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
    }
}

fn from_service(err: &ServiceError, message: String) -> ApiError {
    match err {
        ServiceError::NotFound(_) => ApiError::not_found(message),
        ServiceError::Validation(_) => {
            ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", message)
        }
        ServiceError::Conflict(_) => ApiError::new(StatusCode::CONFLICT, "conflict", message),
        ServiceError::Upload(_) => ApiError::new(StatusCode::BAD_GATEWAY, "upload_failed", message),
        ServiceError::Rejected(_) | ServiceError::Transient(_) => {
            ApiError::new(StatusCode::BAD_GATEWAY, "service_unavailable", message)
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match &err {
            RegistryError::InvalidInput(_) | RegistryError::Text(_) | RegistryError::Id(_) => {
                ApiError::bad_request(message)
            }
            RegistryError::InvalidBirthDate(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_birth_date", message)
            }
            RegistryError::PatientAlreadyRegistered { .. } => {
                ApiError::new(StatusCode::CONFLICT, "patient_already_registered", message)
            }
            RegistryError::UnresolvedUserConflict { .. } => {
                ApiError::new(StatusCode::CONFLICT, "user_conflict_unresolved", message)
            }
            RegistryError::Identity(e)
            | RegistryError::DocumentStore(e)
            | RegistryError::RecordStore(e) => from_service(e, message),
            RegistryError::CleanupAfterRecordFailed { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "cleanup_failed", message)
            }
            RegistryError::Deserialization(_) | RegistryError::UnreadableCreatedRecord { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "invalid_stored_record", message)
            }
            RegistryError::Serialization(_) => {
                tracing::error!("Serialization error: {:?}", err);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal error",
                )
            }
        }
    }
}
