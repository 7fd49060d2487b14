use crate::error::{self, AppwriteError, AppwriteResult};
use registry_core::{RegistryConfig, ServiceResult, UniqueId};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt;

pub const PROJECT_HEADER: &str = "x-appwrite-project";
pub const KEY_HEADER: &str = "x-appwrite-key";

/// Connection settings for an Appwrite project.
#[derive(Clone)]
pub struct AppwriteConfig {
    endpoint: String,
    project_id: UniqueId,
    api_key: String,
}

impl AppwriteConfig {
    /// Validate connection settings. The endpoint must be an `http` or `https` URL; a trailing
    /// `/` is trimmed.
    pub fn new(
        endpoint: impl AsRef<str>,
        project_id: UniqueId,
        api_key: impl Into<String>,
    ) -> AppwriteResult<Self> {
        let endpoint = endpoint.as_ref().trim().trim_end_matches('/');
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppwriteError::InvalidEndpoint(endpoint.to_string()));
        }

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppwriteError::MissingApiKey);
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            project_id,
            api_key,
        })
    }

    /// Settings for the project named by a registry configuration.
    pub fn for_registry(cfg: &RegistryConfig, api_key: impl Into<String>) -> AppwriteResult<Self> {
        Self::new(cfg.endpoint(), cfg.project_id().clone(), api_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &UniqueId {
        &self.project_id
    }
}

impl fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Server-side Appwrite client.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AppwriteClient {
    pub fn new(cfg: &AppwriteConfig) -> AppwriteResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            PROJECT_HEADER,
            HeaderValue::from_str(cfg.project_id.as_str())?,
        );
        let mut key = HeaderValue::from_str(&cfg.api_key)?;
        key.set_sensitive(true);
        headers.insert(KEY_HEADER, key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
        })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.endpoint, path))
    }

    /// Send a request, turning any non-success status into a [`ServiceError`](registry_core::ServiceError).
    pub(crate) async fn send(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let response = request.send().await.map_err(error::transport)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let err = error::from_response(response).await;
        tracing::debug!(status = status.as_u16(), error = %err, "Appwrite request failed");
        Err(err)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ServiceResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(error::malformed_response)
    }
}
