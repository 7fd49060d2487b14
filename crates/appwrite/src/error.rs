use registry_core::{ServiceError, ServiceFailure};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::fmt;

/// Errors raised while building an [`AppwriteClient`](crate::AppwriteClient).
///
/// Failures of individual requests are reported as [`ServiceError`] instead.
#[derive(Debug, thiserror::Error)]
pub enum AppwriteError {
    #[error("invalid Appwrite endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Appwrite API key must not be empty")]
    MissingApiKey,
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type AppwriteResult<T> = std::result::Result<T, AppwriteError>;

/// Error body returned by every Appwrite endpoint.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Map a response status onto the service error taxonomy.
pub(crate) fn classify(status: StatusCode, failure: ServiceFailure) -> ServiceError {
    match status.as_u16() {
        400 => ServiceError::Validation(failure),
        404 => ServiceError::NotFound(failure),
        409 => ServiceError::Conflict(failure),
        429 => ServiceError::Transient(failure),
        401..=499 => ServiceError::Rejected(failure),
        _ => ServiceError::Transient(failure),
    }
}

/// Read the error body from a failed response.
pub(crate) async fn from_response(response: Response) -> ServiceError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    classify(status, parse_failure(status, &text))
}

fn parse_failure(status: StatusCode, text: &str) -> ServiceFailure {
    let body = serde_json::from_str::<ErrorBody>(text).unwrap_or_else(|_| ErrorBody {
        message: text.trim().to_string(),
        ..Default::default()
    });

    let message = if body.message.is_empty() {
        status.to_string()
    } else {
        body.message
    };
    let failure = ServiceFailure::new(message).with_code(body.code.unwrap_or(status.as_u16()));
    match body.kind {
        Some(kind) => failure.with_kind(kind),
        None => failure,
    }
}

pub(crate) fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Transient(ServiceFailure::new(err.to_string()).with_kind("network_failure"))
}

pub(crate) fn malformed_response(err: impl fmt::Display) -> ServiceError {
    ServiceError::Rejected(
        ServiceFailure::new(format!("unexpected response body: {}", err))
            .with_kind("malformed_response"),
    )
}

/// Storage reports every failure except a duplicate file id as an upload failure.
pub(crate) fn upload_failure(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Conflict(_) | ServiceError::Upload(_) => err,
        other => ServiceError::Upload(other.failure().clone()),
    }
}
