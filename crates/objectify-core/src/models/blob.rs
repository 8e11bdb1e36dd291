//! Binary payloads and their content hashes.
//!
//! Images arrive from the camera as data URIs
//! (`data:image/jpeg;base64,/9j/4AAQ...`). [`BinaryObject::from_data_uri`]
//! turns one into raw bytes plus its declared MIME type.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::constants::DEFAULT_MIME_TYPE;
use crate::error::AppError;

/// Raw bytes plus declared MIME type. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryObject {
    bytes: Bytes,
    mime_type: String,
}

impl BinaryObject {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Decode a `data:` URI.
    ///
    /// The MIME type is taken verbatim from the URI header and defaults to
    /// `image/jpeg` when the header declares none. Payloads flagged `;base64`
    /// are base64-decoded, all others are percent-decoded.
    pub fn from_data_uri(uri: &str) -> Result<Self, AppError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AppError::MalformedInput("data URI must start with 'data:'".to_string()))?;

        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            AppError::MalformedInput("data URI is missing the ',' delimiter".to_string())
        })?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        // Sent verbatim as the Content-Type header of the upload.
        if !mime_type.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(AppError::MalformedInput(format!(
                "data URI MIME type {:?} contains characters not allowed in a header",
                mime_type
            )));
        }

        let bytes = if is_base64 {
            base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| {
                    AppError::MalformedInput(format!("data URI payload is not valid base64: {}", e))
                })?
        } else {
            percent_decode_str(payload).collect::<Vec<u8>>()
        };

        let mime_type = if mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };

        Ok(Self::new(bytes, mime_type))
    }

    /// Encode as a base64 `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 over the full payload.
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::compute(&self.bytes)
    }
}

/// SHA-256 digest, rendered as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = AppError;

    /// Only the canonical lowercase form is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(AppError::MalformedInput(
                "content hash must be 64 lowercase hex characters".to_string(),
            ));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| AppError::MalformedInput(format!("invalid content hash: {}", e)))?;
        Ok(Self(out))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
