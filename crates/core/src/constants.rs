//! Constants used throughout the registry core crate.
//!
//! Attribute names and form keys are part of the stored data contract; changing them breaks
//! compatibility with existing records and clients.

/// Record attribute holding the owning user account id.
pub const USER_ID_ATTRIBUTE: &str = "userId";

/// Identity attribute used for exact email lookups.
pub const EMAIL_ATTRIBUTE: &str = "email";

/// Form key carrying the identification document bytes.
pub const BLOB_FILE_FIELD: &str = "blobFile";

/// Form key carrying the identification document filename.
pub const FILE_NAME_FIELD: &str = "fileName";

/// Error type reported by the record store when a payload does not match the collection schema.
pub const SCHEMA_MISMATCH_KIND: &str = "document_invalid_structure";

/// Endpoint used to derive file URLs when running against the in-memory backends.
pub const LOCAL_ENDPOINT: &str = "http://localhost/v1";
