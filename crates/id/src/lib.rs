//! Identifier utilities for records held by the hosted backend.
//!
//! Every user account, stored file and record document is addressed by a string identifier.
//! The backend accepts caller-chosen identifiers as long as they follow its identifier rules:
//!
//! - Length: 1 to 36 characters
//! - Characters: `a-z`, `A-Z`, `0-9`, `.`, `-` and `_`
//! - Must not start with a special character (`.`, `-`, `_`)
//!
//! This crate provides [`UniqueId`], a wrapper that *guarantees* those rules once constructed.
//!
//! ## Generated identifiers
//! [`UniqueId::generate`] allocates a fresh identifier for a create request. Generated ids use a
//! **32 lowercase hexadecimal character** form (a v4 UUID without hyphens), for example
//! `550e8400e29b41d4a716446655440000`. That form always satisfies the rules above.
//!
//! ## Parsed identifiers
//! Identifiers assigned elsewhere (for example by the backend, or supplied in a request path)
//! are validated with [`UniqueId::parse`]. Parsing does not normalise case or strip characters;
//! the identifier is kept byte-for-byte so lookups match exactly.

mod service;

pub use service::{UniqueId, MAX_ID_LEN};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid identifier: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
