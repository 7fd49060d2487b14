//! Storage API.
//!
//! Files up to [`CHUNK_SIZE`] go up in a single multipart request. Larger files are sent as a
//! series of chunks, each with a `Content-Range` header; every chunk after the first names the
//! file it belongs to with `x-appwrite-id`.

use crate::client::AppwriteClient;
use crate::error;
use async_trait::async_trait;
use registry_core::{
    DocumentStore, IdentificationDocument, ServiceError, ServiceFailure, ServiceResult, StoredFile,
    UniqueId,
};
use reqwest::header::CONTENT_RANGE;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;

/// Largest body Appwrite accepts in one upload request.
pub const CHUNK_SIZE: usize = 5 * 1024 * 1024;

const UPLOAD_ID_HEADER: &str = "x-appwrite-id";

#[derive(Debug, Deserialize)]
struct FileBody {
    #[serde(rename = "$id")]
    id: UniqueId,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "sizeOriginal")]
    size_original: Option<u64>,
}

fn file_form(file_id: &UniqueId, file_name: &str, bytes: &[u8]) -> Form {
    Form::new()
        .text("fileId", file_id.to_string())
        .part("file", Part::bytes(bytes.to_vec()).file_name(file_name.to_string()))
}

impl AppwriteClient {
    async fn upload_file(
        &self,
        path: &str,
        file_id: &UniqueId,
        document: &IdentificationDocument,
    ) -> ServiceResult<FileBody> {
        let bytes = document.bytes();
        if bytes.len() <= CHUNK_SIZE {
            let request = self
                .request(Method::POST, path)
                .multipart(file_form(file_id, document.file_name(), bytes));
            return self.send_json(request).await;
        }

        let total = bytes.len();
        let mut uploaded = None;
        for (index, chunk) in bytes.chunks(CHUNK_SIZE).enumerate() {
            let start = index * CHUNK_SIZE;
            let end = start + chunk.len() - 1;

            let mut request = self
                .request(Method::POST, path)
                .header(CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, total))
                .multipart(file_form(file_id, document.file_name(), chunk));
            if index > 0 {
                request = request.header(UPLOAD_ID_HEADER, file_id.as_str());
            }

            uploaded = Some(self.send_json::<FileBody>(request).await?);
            tracing::debug!(file_id = %file_id, start, end, total, "uploaded chunk");
        }

        uploaded.ok_or_else(|| ServiceError::Upload(ServiceFailure::new("no chunks were sent")))
    }
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn upload(
        &self,
        bucket_id: &UniqueId,
        file_id: &UniqueId,
        document: &IdentificationDocument,
    ) -> ServiceResult<StoredFile> {
        let path = format!("/storage/buckets/{}/files", bucket_id);
        let file = self
            .upload_file(&path, file_id, document)
            .await
            .map_err(error::upload_failure)?;

        Ok(StoredFile {
            id: file.id,
            name: file.name,
            size_bytes: file.size_original.unwrap_or(document.len() as u64),
        })
    }

    async fn delete(&self, bucket_id: &UniqueId, file_id: &UniqueId) -> ServiceResult<()> {
        let path = format!("/storage/buckets/{}/files/{}", bucket_id, file_id);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}
