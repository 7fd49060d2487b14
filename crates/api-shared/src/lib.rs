//! # API Shared
//!
//! Shared utilities and definitions for the registry API.
//!
//! Contains:
//! - Wire types for requests and responses (`wire` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest`.

pub mod auth;
pub mod health;
pub mod wire;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::HealthService;
pub use wire::*;
