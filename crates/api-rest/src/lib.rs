//! # API REST
//!
//! REST API implementation for the patient registry.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON and multipart bodies, CORS, API key checks)
//!
//! Uses `api-shared` for wire types and `registry-core` for the registry itself.

#![warn(rust_2018_idioms)]

mod error;
mod handlers;
mod middleware;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use registry_core::PatientRegistry;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Largest request body accepted, sized for an identification document upload.
pub const MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: PatientRegistry,
    api_key: Arc<str>,
}

impl AppState {
    /// `api_key` is the value callers must send in the `x-api-key` header.
    pub fn new(registry: PatientRegistry, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            registry,
            api_key: api_key.into(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::create_user,
        handlers::get_user,
        handlers::register_patient,
        handlers::get_patient
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::CreateUserReq,
        api_shared::UserRes,
        api_shared::RegisterPatientReq,
        api_shared::PatientRes,
        handlers::RegisterPatientForm
    ))
)]
pub struct ApiDoc;

/// Build the REST application.
///
/// `/health` and the API documentation are open; every other route requires the API key.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users", post(handlers::create_user))
        .route("/users/:id", get(handlers::get_user))
        .route("/patients", post(handlers::register_patient))
        .route("/patients/:user_id", get(handlers::get_patient))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
