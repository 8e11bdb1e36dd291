//! Errors of the upload pipeline.

use objectify_core::{AppError, ErrorMetadata, LogLevel};

const MAX_REASON_LEN: usize = 200;

/// Enough bytes for `MAX_REASON_LEN` characters of UTF-8.
const MAX_REASON_BYTES: usize = MAX_REASON_LEN * 4;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The image payload could not be decoded.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Bad key material, or the signature failed its own verification.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Upload rejected with status {status}: {reason}")]
    ServerRejected { status: u16, reason: String },

    /// A 2xx response whose body is not a usable descriptor.
    #[error("Invalid server response: {0}")]
    ResponseParse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Build a `ServerRejected` from a non-2xx response, preferring the
    /// Blossom `X-Reason` header over the body text.
    pub(crate) async fn rejected(mut response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let header_reason = response
            .headers()
            .get("x-reason")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let reason = match header_reason {
            Some(reason) => reason,
            None => read_body_prefix(&mut response, MAX_REASON_BYTES).await,
        };
        let reason = reason.trim();
        let reason = if reason.is_empty() {
            "no reason given".to_string()
        } else {
            reason.chars().take(MAX_REASON_LEN).collect()
        };

        UploadError::ServerRejected { status, reason }
    }
}

/// Read at most `limit` bytes of the body; the rest is never buffered.
async fn read_body_prefix(response: &mut reqwest::Response, limit: usize) -> String {
    let mut body = Vec::new();
    while body.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    body.truncate(limit);
    String::from_utf8_lossy(&body).into_owned()
}

impl From<AppError> for UploadError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::MalformedInput(msg) => UploadError::MalformedInput(msg),
            err @ (AppError::InvalidKey(_) | AppError::Signing(_) | AppError::InvalidEvent(_)) => {
                UploadError::Signing(err.to_string())
            }
            other => UploadError::Internal(other.to_string()),
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::MalformedInput(_) => "MALFORMED_INPUT",
            UploadError::Signing(_) => "SIGNING_ERROR",
            UploadError::Network(_) => "NETWORK_ERROR",
            UploadError::ServerRejected { .. } => "SERVER_REJECTED",
            UploadError::ResponseParse(_) => "RESPONSE_PARSE_ERROR",
            UploadError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            UploadError::Network(_) => true,
            UploadError::ServerRejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            UploadError::MalformedInput(_) => Some("Capture or select the image again"),
            UploadError::Signing(_) => Some("Check the active signing key"),
            UploadError::Network(_) => Some("Check the connection to the upload server"),
            UploadError::ServerRejected { status: 413, .. } => Some("Upload a smaller image"),
            UploadError::ServerRejected { status: 401, .. } => {
                Some("Check the system clock; the authorization may have expired")
            }
            UploadError::ServerRejected { .. } => Some("Try another upload server"),
            UploadError::ResponseParse(_) => Some("Try another upload server"),
            UploadError::Internal(_) => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::ServerRejected { status, reason } => {
                format!("Upload failed with status {}: {}", status, reason)
            }
            UploadError::Network(e) => format!("Could not reach the upload server: {}", e),
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::MalformedInput(_) => LogLevel::Debug,
            UploadError::Network(_)
            | UploadError::ServerRejected { .. }
            | UploadError::ResponseParse(_) => LogLevel::Warn,
            UploadError::Signing(_) | UploadError::Internal(_) => LogLevel::Error,
        }
    }
}
