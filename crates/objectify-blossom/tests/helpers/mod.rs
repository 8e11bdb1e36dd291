//! Shared fixtures for the Blossom client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use objectify_blossom::{BlossomClient, UploadFlow};
use objectify_core::Keys;

/// `hello` as a PNG data URI.
pub const HELLO_PNG: &str = "data:image/png;base64,aGVsbG8=";

/// SHA-256 of `hello`.
pub const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

/// Header value shape: scheme, one space, standard base64.
pub const AUTH_HEADER_PATTERN: &str = "^Nostr [A-Za-z0-9+/]+=*$";

/// Deterministic key (secret scalar 3).
pub fn test_keys() -> Keys {
    Keys::from_secret_hex(&format!("{:0>64}", "3")).unwrap()
}

pub fn client_for(base_url: &str) -> BlossomClient {
    BlossomClient::new(base_url, Duration::from_secs(5)).unwrap()
}

pub fn flow_for(base_url: &str) -> UploadFlow {
    UploadFlow::new(Arc::new(client_for(base_url)))
}
