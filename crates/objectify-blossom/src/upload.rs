//! `PUT /upload` against a Blossom server.

use async_trait::async_trait;
use objectify_core::{BinaryObject, BlobDescriptor, Event};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::auth::authorization_header;
use crate::error::UploadError;
use crate::{BlobStore, BlossomClient};

impl BlossomClient {
    /// Upload `blob` with `authorization` as credential and parse the
    /// returned descriptor.
    pub async fn upload(
        &self,
        blob: &BinaryObject,
        authorization: &Event,
    ) -> Result<BlobDescriptor, UploadError> {
        let url = self.build_url("/upload");
        let header = authorization_header(authorization)?;

        tracing::debug!(
            url = %url,
            size = blob.len(),
            mime_type = %blob.mime_type(),
            "Uploading blob"
        );

        let response = self
            .client()
            .put(&url)
            .header(AUTHORIZATION, header)
            .header(CONTENT_TYPE, blob.mime_type())
            .body(blob.bytes().clone())
            .send()
            .await
            .map_err(UploadError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let err = UploadError::rejected(response).await;
            tracing::warn!(url = %url, status = status.as_u16(), error = %err, "Upload rejected");
            return Err(err);
        }

        let body = response.bytes().await.map_err(UploadError::Network)?;
        let descriptor: BlobDescriptor = serde_json::from_slice(&body)
            .map_err(|e| UploadError::ResponseParse(format!("expected blob descriptor: {}", e)))?;

        if descriptor.url.trim().is_empty() {
            return Err(UploadError::ResponseParse(
                "blob descriptor has an empty url".to_string(),
            ));
        }

        tracing::debug!(url = %descriptor.url, status = status.as_u16(), "Upload accepted");
        Ok(descriptor)
    }
}

#[async_trait]
impl BlobStore for BlossomClient {
    async fn put_blob(
        &self,
        blob: &BinaryObject,
        authorization: &Event,
    ) -> Result<BlobDescriptor, UploadError> {
        self.upload(blob, authorization).await
    }

    fn endpoint(&self) -> String {
        self.build_url("/upload")
    }
}
