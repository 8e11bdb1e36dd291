//! Upload authorization events (kind 24242) and the `authorization` header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use objectify_core::constants::{
    AUTH_EXPIRATION_SECS, AUTH_SCHEME, BLOSSOM_AUTH_KIND, DEFAULT_AUTH_CONTENT,
};
use objectify_core::{ContentHash, Event, PublicKey, Tag, UnsignedEvent};

use crate::error::UploadError;

/// Action named by the `t` tag of an upload authorization.
pub const UPLOAD_ACTION: &str = "upload";

/// Builds the unsigned authorization event for one blob.
///
/// Tags are emitted in a fixed order: `t`, `x`, `expiration`, then any
/// extra tags in the order they were added.
#[derive(Debug, Clone)]
pub struct AuthorizationBuilder {
    hash: ContentHash,
    pubkey: PublicKey,
    content: String,
    created_at: Option<i64>,
    extra_tags: Vec<Tag>,
}

impl AuthorizationBuilder {
    pub fn new(hash: ContentHash, pubkey: PublicKey) -> Self {
        Self {
            hash,
            pubkey,
            content: DEFAULT_AUTH_CONTENT.to_string(),
            created_at: None,
            extra_tags: Vec::new(),
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Fix the creation time instead of reading the clock.
    pub fn created_at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.extra_tags.push(tag);
        self
    }

    pub fn build(self) -> UnsignedEvent {
        let mut event = UnsignedEvent::new(self.pubkey, BLOSSOM_AUTH_KIND, self.content);
        if let Some(created_at) = self.created_at {
            event.created_at = created_at;
        }

        let mut tags = Vec::with_capacity(3 + self.extra_tags.len());
        tags.push(Tag::Topic(UPLOAD_ACTION.to_string()));
        tags.push(Tag::Hash(self.hash));
        tags.push(Tag::Expiration(event.created_at + AUTH_EXPIRATION_SECS));
        tags.extend(self.extra_tags);
        event.tags = tags;

        event
    }
}

/// `Nostr <base64(event json)>`
pub fn authorization_header(event: &Event) -> Result<String, UploadError> {
    let json = event.to_json()?;
    Ok(format!("{} {}", AUTH_SCHEME, STANDARD.encode(json)))
}

/// Parse and verify an `authorization` header value.
pub fn decode_authorization_header(value: &str) -> Result<Event, UploadError> {
    let encoded = value
        .strip_prefix(AUTH_SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| {
            UploadError::MalformedInput(format!("authorization scheme must be {:?}", AUTH_SCHEME))
        })?;

    let json = STANDARD
        .decode(encoded.trim())
        .map_err(|e| UploadError::MalformedInput(format!("invalid base64: {}", e)))?;
    let event: Event = serde_json::from_slice(&json)
        .map_err(|e| UploadError::MalformedInput(format!("invalid event json: {}", e)))?;
    event.verify()?;

    Ok(event)
}
