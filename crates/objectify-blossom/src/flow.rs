//! The upload pipeline: prepare, authorize, sign, upload, report.
//!
//! Each run moves forward through [`FlowState`] and ends in exactly one of
//! `Succeeded` or `Failed`. No retries happen inside a run; the caller may
//! start a new one.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use objectify_core::{
    BinaryObject, BlobDescriptor, Config, ContentHash, ErrorMetadata, Keys, LogLevel,
    UploadResult,
};

use crate::auth::AuthorizationBuilder;
use crate::error::UploadError;
use crate::{BlobStore, BlossomClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowState {
    Idle,
    Preparing,
    Authorizing,
    Signing,
    Uploading,
    Succeeded,
    Failed,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Succeeded | FlowState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Preparing => "preparing",
            FlowState::Authorizing => "authorizing",
            FlowState::Signing => "signing",
            FlowState::Uploading => "uploading",
            FlowState::Succeeded => "succeeded",
            FlowState::Failed => "failed",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run: the stage that failed and why.
#[derive(Debug, thiserror::Error)]
#[error("upload failed while {stage}: {source}")]
pub struct FlowError {
    pub stage: FlowState,
    #[source]
    pub source: UploadError,
}

struct Progress {
    state: FlowState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: FlowState::Idle,
        }
    }

    fn advance(&mut self, next: FlowState) {
        debug_assert!(next > self.state && !self.state.is_terminal());
        tracing::debug!(from = %self.state, to = %next, "Upload flow transition");
        self.state = next;
    }

    fn fail(&mut self, source: UploadError) -> FlowError {
        let stage = self.state;
        self.advance(FlowState::Failed);
        FlowError { stage, source }
    }
}

pub struct UploadFlow {
    store: Arc<dyn BlobStore>,
    auth_content: String,
}

impl UploadFlow {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            auth_content: objectify_core::constants::DEFAULT_AUTH_CONTENT.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = BlossomClient::from_config(config)?;
        Ok(Self::new(Arc::new(client)).with_auth_content(config.auth_content.clone()))
    }

    /// `content` of the authorization events this flow signs.
    pub fn with_auth_content(mut self, content: impl Into<String>) -> Self {
        self.auth_content = content.into();
        self
    }

    /// Run the pipeline once and report the outcome.
    pub async fn run(&self, data_uri: &str, keys: &Keys) -> UploadResult {
        report(self.execute(data_uri, keys).await)
    }

    /// Run the pipeline once, keeping the full descriptor or failure.
    pub async fn execute(&self, data_uri: &str, keys: &Keys) -> Result<BlobDescriptor, FlowError> {
        let mut progress = Progress::new();

        progress.advance(FlowState::Preparing);
        let (blob, hash) = match prepare(data_uri).await {
            Ok(prepared) => prepared,
            Err(e) => return Err(log_failure(progress.fail(e))),
        };
        tracing::info!(
            size = blob.len(),
            mime_type = %blob.mime_type(),
            sha256 = %hash,
            endpoint = %self.store.endpoint(),
            "Uploading image"
        );

        progress.advance(FlowState::Authorizing);
        let unsigned = AuthorizationBuilder::new(hash, keys.public_key())
            .content(self.auth_content.as_str())
            .build();

        progress.advance(FlowState::Signing);
        let authorization = match keys.sign_event(unsigned) {
            Ok(event) => event,
            Err(e) => return Err(log_failure(progress.fail(e.into()))),
        };
        tracing::debug!(event_id = %authorization.id(), "Authorization signed");

        progress.advance(FlowState::Uploading);
        let descriptor = match self.store.put_blob(&blob, &authorization).await {
            Ok(descriptor) => descriptor,
            Err(e) => return Err(log_failure(progress.fail(e))),
        };

        progress.advance(FlowState::Succeeded);
        tracing::info!(url = %descriptor.url, "Image uploaded");
        Ok(descriptor)
    }
}

/// Decode the data URI and hash the payload off the async runtime.
pub async fn prepare(data_uri: &str) -> Result<(BinaryObject, ContentHash), UploadError> {
    let blob = BinaryObject::from_data_uri(data_uri)?;
    let hashed = blob.clone();
    let hash = tokio::task::spawn_blocking(move || hashed.content_hash())
        .await
        .map_err(|e| UploadError::Internal(format!("hashing task failed: {}", e)))?;
    Ok((blob, hash))
}

/// Collapse a run into the caller-facing result.
pub fn report(outcome: Result<BlobDescriptor, FlowError>) -> UploadResult {
    match outcome {
        Ok(descriptor) => UploadResult::succeeded(descriptor.url),
        Err(err) => UploadResult::failed(err.source.client_message()),
    }
}

fn log_failure(err: FlowError) -> FlowError {
    let code = err.source.error_code();
    match err.source.log_level() {
        LogLevel::Error => {
            tracing::error!(stage = %err.stage, code, error = %err.source, "Upload failed")
        }
        LogLevel::Warn => {
            tracing::warn!(stage = %err.stage, code, error = %err.source, "Upload failed")
        }
        LogLevel::Debug => {
            tracing::debug!(stage = %err.stage, code, error = %err.source, "Upload failed")
        }
    }
    err
}
