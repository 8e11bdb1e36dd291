//! NIP-96 server discovery.
//!
//! Each candidate publishes its configuration at
//! `/.well-known/nostr/nip96.json`. Candidates are probed concurrently and
//! the first one that answers with a usable `api_url` is chosen.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::fanout::{first_success, FanOutError};
use crate::BlossomClient;

pub const NIP96_PATH: &str = "/.well-known/nostr/nip96.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nip96Config {
    /// Upload endpoint. May be empty when `delegated_to_url` is set.
    #[serde(default)]
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegated_to_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_nips: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredServer {
    pub server: String,
    pub config: Nip96Config,
}

impl BlossomClient {
    pub async fn fetch_server_config(&self) -> Result<Nip96Config, UploadError> {
        let config: Nip96Config = self.get_json(NIP96_PATH).await?;
        if config.api_url.trim().is_empty() {
            let detail = match &config.delegated_to_url {
                Some(delegate) => format!("server delegates to {}", delegate),
                None => "missing api_url".to_string(),
            };
            return Err(UploadError::ResponseParse(detail));
        }
        Ok(config)
    }
}

/// Probe `servers` and return the first with a usable configuration.
pub async fn discover(
    servers: &[String],
    timeout: Duration,
) -> Result<DiscoveredServer, FanOutError<UploadError>> {
    let attempts = servers.iter().map(|server| {
        let server = server.trim_end_matches('/').to_string();
        let attempt = {
            let server = server.clone();
            async move {
                let client = BlossomClient::new(server, timeout)
                    .map_err(|e| UploadError::Internal(e.to_string()))?;
                client.fetch_server_config().await
            }
        };
        (server, attempt)
    });

    let (server, config) = first_success(attempts).await?;
    tracing::info!(server = %server, api_url = %config.api_url, "Discovered upload server");
    Ok(DiscoveredServer { server, config })
}
