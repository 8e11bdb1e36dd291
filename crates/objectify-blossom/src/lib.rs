//! Blossom blob upload client.
//!
//! Uploads raw bytes to a Blossom server with `PUT /upload`, authorized by a
//! short-lived signed Nostr event (kind 24242) carried in the
//! `authorization` header. [`UploadFlow`] runs the whole pipeline and
//! reports a single [`UploadResult`](objectify_core::UploadResult).

pub mod auth;
pub mod discovery;
pub mod error;
pub mod fanout;
pub mod flow;
pub mod upload;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use objectify_core::{BinaryObject, BlobDescriptor, Config, Event};
use reqwest::Client;
use serde::de::DeserializeOwned;

pub use auth::{authorization_header, decode_authorization_header, AuthorizationBuilder};
pub use discovery::{discover, DiscoveredServer, Nip96Config};
pub use error::UploadError;
pub use fanout::{first_success, FanOutError};
pub use flow::{FlowError, FlowState, UploadFlow};

/// Destination for authorized blob uploads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `blob`, presenting `authorization` as the upload credential.
    async fn put_blob(
        &self,
        blob: &BinaryObject,
        authorization: &Event,
    ) -> Result<BlobDescriptor, UploadError>;

    /// Where uploads are sent, for logging.
    fn endpoint(&self) -> String;
}

/// HTTP client for a single Blossom server.
#[derive(Clone, Debug)]
pub struct BlossomClient {
    client: Client,
    base_url: String,
}

impl BlossomClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.upload_server.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UploadError> {
        let url = self.build_url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(UploadError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::rejected(response).await);
        }

        let body = response.bytes().await.map_err(UploadError::Network)?;
        serde_json::from_slice(&body).map_err(|e| UploadError::ResponseParse(e.to_string()))
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}
