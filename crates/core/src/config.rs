//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the registry as an
//! `Arc<RegistryConfig>`. Request handling never reads process-wide environment variables.

use crate::{RegistryError, RegistryResult};
use registry_id::UniqueId;
use std::str::FromStr;

/// Backend identifiers and the service endpoint, resolved at startup.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    endpoint: String,
    project_id: UniqueId,
    database_id: UniqueId,
    patient_collection_id: UniqueId,
    bucket_id: UniqueId,
}

impl RegistryConfig {
    /// Create a new `RegistryConfig`.
    ///
    /// The endpoint must be an `http://` or `https://` URL; a trailing `/` is removed so that
    /// derived URLs never contain `//`. All identifiers must satisfy the backend id rules.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidInput`] for a malformed endpoint and
    /// [`RegistryError::Id`] for an invalid identifier.
    pub fn new(
        endpoint: &str,
        project_id: &str,
        database_id: &str,
        patient_collection_id: &str,
        bucket_id: &str,
    ) -> RegistryResult<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        let has_scheme = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_scheme {
            return Err(RegistryError::InvalidInput(format!(
                "endpoint must be an http(s) URL, got: '{}'",
                endpoint
            )));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            project_id: UniqueId::parse(project_id.trim())?,
            database_id: UniqueId::parse(database_id.trim())?,
            patient_collection_id: UniqueId::parse(patient_collection_id.trim())?,
            bucket_id: UniqueId::parse(bucket_id.trim())?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &UniqueId {
        &self.project_id
    }

    pub fn database_id(&self) -> &UniqueId {
        &self.database_id
    }

    pub fn patient_collection_id(&self) -> &UniqueId {
        &self.patient_collection_id
    }

    pub fn bucket_id(&self) -> &UniqueId {
        &self.bucket_id
    }

    /// URL a viewing client uses to fetch an uploaded identification document.
    ///
    /// Format: `{endpoint}/storage/buckets/{bucket}/files/{file}/view?project={project}`.
    pub fn file_view_url(&self, file_id: &UniqueId) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.endpoint, self.bucket_id, file_id, self.project_id
        )
    }
}

/// Which implementation backs the identity, document and record capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// The hosted Appwrite service.
    #[default]
    Appwrite,
    /// Process-local stores; data is lost on restart.
    Memory,
}

impl FromStr for BackendKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "appwrite" => Ok(BackendKind::Appwrite),
            "memory" => Ok(BackendKind::Memory),
            other => Err(RegistryError::InvalidInput(format!(
                "unknown backend '{}' (expected 'appwrite' or 'memory')",
                other
            ))),
        }
    }
}

/// Parse the backend kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`BackendKind::Appwrite`].
pub fn backend_kind_from_env_value(value: Option<String>) -> RegistryResult<BackendKind> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<BackendKind>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}
