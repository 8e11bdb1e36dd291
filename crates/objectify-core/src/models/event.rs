//! Nostr events (NIP-01).
//!
//! An [`UnsignedEvent`] is turned into an [`Event`] only through
//! [`Keys::sign_event`](crate::keys::Keys::sign_event), so an `Event` built
//! by this crate always carries an id and a signature that agree with its
//! contents. Events deserialized from elsewhere must be checked with
//! [`Event::verify`].

use std::fmt;
use std::str::FromStr;

use k256::schnorr::{Signature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::models::tag::Tag;

fn decode_hex_array<const N: usize>(s: &str, what: &str) -> Result<[u8; N], AppError> {
    if s.len() != N * 2 {
        return Err(AppError::MalformedInput(format!(
            "{} must be {} hex characters, got {}",
            what,
            N * 2,
            s.len()
        )));
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(s, &mut out)
        .map_err(|e| AppError::MalformedInput(format!("invalid {} hex: {}", what, e)))?;
    Ok(out)
}

/// Implements `Display`, `FromStr` and hex-string serde for a byte newtype.
macro_rules! hex_newtype {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// x-only secp256k1 public key (BIP-340).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        let verifying_key = VerifyingKey::from_bytes(bytes)
            .map_err(|_| AppError::InvalidKey("not a valid x-only public key".to_string()))?;
        Ok(Self::from_verifying_key(&verifying_key))
    }

    pub fn from_hex(s: &str) -> Result<Self, AppError> {
        let bytes: [u8; 32] = decode_hex_array(s, "public key")
            .map_err(|e| AppError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(&key.to_bytes());
        Self(out)
    }

    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey, AppError> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|_| AppError::InvalidKey("not a valid x-only public key".to_string()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

hex_newtype!(PublicKey);

/// SHA-256 of the canonical event serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId([u8; 32]);

impl EventId {
    pub fn from_hex(s: &str) -> Result<Self, AppError> {
        decode_hex_array(s, "event id").map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

hex_newtype!(EventId);

/// 64-byte BIP-340 Schnorr signature over an [`EventId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventSignature([u8; 64]);

impl EventSignature {
    pub fn from_hex(s: &str) -> Result<Self, AppError> {
        decode_hex_array(s, "signature").map(Self)
    }

    pub(crate) fn from_signature(signature: &Signature) -> Self {
        Self(signature.to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

hex_newtype!(EventSignature);

/// `[0, pubkey, created_at, kind, tags, content]` serialized without whitespace.
fn canonical_json(
    pubkey: &PublicKey,
    created_at: i64,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> Result<String, AppError> {
    serde_json::to_string(&(0u8, pubkey, created_at, kind, tags, content))
        .map_err(|e| AppError::Internal(format!("failed to serialize event: {}", e)))
}

fn compute_id(
    pubkey: &PublicKey,
    created_at: i64,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> Result<EventId, AppError> {
    let serialized = canonical_json(pubkey, created_at, kind, tags, content)?;
    Ok(EventId(Sha256::digest(serialized.as_bytes()).into()))
}

/// Event contents before an id and signature exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    pub kind: u16,
    pub content: String,
    pub created_at: i64,
    pub tags: Vec<Tag>,
    pub pubkey: PublicKey,
}

impl UnsignedEvent {
    /// New event stamped with the current time and no tags.
    pub fn new(pubkey: PublicKey, kind: u16, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            created_at: chrono::Utc::now().timestamp(),
            tags: Vec::new(),
            pubkey,
        }
    }

    pub fn canonical_json(&self) -> Result<String, AppError> {
        canonical_json(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    pub fn compute_id(&self) -> Result<EventId, AppError> {
        compute_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }
}

/// A signed event. Field order matches the JSON expected by relays and
/// blob servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    kind: u16,
    content: String,
    created_at: i64,
    tags: Vec<Tag>,
    pubkey: PublicKey,
    id: EventId,
    sig: EventSignature,
}

impl Event {
    pub(crate) fn from_parts(unsigned: UnsignedEvent, id: EventId, sig: EventSignature) -> Self {
        Self {
            kind: unsigned.kind,
            content: unsigned.content,
            created_at: unsigned.created_at,
            tags: unsigned.tags,
            pubkey: unsigned.pubkey,
            id,
            sig,
        }
    }

    pub fn kind(&self) -> u16 {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn sig(&self) -> &EventSignature {
        &self.sig
    }

    /// Value of the `expiration` tag, if any.
    pub fn expiration(&self) -> Option<i64> {
        self.tags.iter().find_map(|tag| match tag {
            Tag::Expiration(at) => Some(*at),
            _ => None,
        })
    }

    /// Check that the id matches the contents and the signature matches the id.
    pub fn verify(&self) -> Result<(), AppError> {
        let expected = compute_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;
        if expected != self.id {
            return Err(AppError::InvalidEvent(format!(
                "id {} does not match event contents (expected {})",
                self.id, expected
            )));
        }

        let verifying_key = self.pubkey.verifying_key()?;
        let signature = Signature::try_from(self.sig.as_bytes().as_slice())
            .map_err(|_| AppError::InvalidEvent("malformed signature".to_string()))?;

        verifying_key
            .verify_raw(self.id.as_bytes(), &signature)
            .map_err(|_| AppError::InvalidEvent("signature does not verify".to_string()))
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("failed to serialize event: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keys;

    const PUBKEY_HEX: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn unsigned(keys: &Keys) -> UnsignedEvent {
        let mut event = UnsignedEvent::new(keys.public_key(), 1, "hello \"nostr\"\n");
        event.created_at = 1_700_000_000;
        event.tags = vec![Tag::Topic("upload".to_string())];
        event
    }

    #[test]
    fn canonical_json_matches_nip01_layout() {
        let event = UnsignedEvent {
            kind: 24242,
            content: "Upload Test Image".to_string(),
            created_at: 1_700_000_000,
            tags: vec![
                Tag::Topic("upload".to_string()),
                Tag::Expiration(1_700_000_300),
            ],
            pubkey: PublicKey::from_hex(PUBKEY_HEX).unwrap(),
        };

        assert_eq!(
            event.canonical_json().unwrap(),
            format!(
                r#"[0,"{PUBKEY_HEX}",1700000000,24242,[["t","upload"],["expiration","1700000300"]],"Upload Test Image"]"#
            )
        );
    }

    #[test]
    fn canonical_json_escapes_content() {
        let keys = Keys::generate();
        let json = unsigned(&keys).canonical_json().unwrap();
        assert!(json.ends_with(r#""hello \"nostr\"\n"]"#));
    }

    #[test]
    fn signed_event_verifies() {
        let keys = Keys::generate();
        let event = keys.sign_event(unsigned(&keys)).unwrap();
        assert!(event.verify().is_ok());
        assert_eq!(event.id(), &unsigned(&keys).compute_id().unwrap());
    }

    #[test]
    fn tampered_content_fails_verification() {
        let keys = Keys::generate();
        let event = keys.sign_event(unsigned(&keys)).unwrap();

        let mut value = serde_json::to_value(&event).unwrap();
        value["content"] = serde_json::Value::String("changed".to_string());
        let tampered: Event = serde_json::from_value(value).unwrap();

        let err = tampered.verify().unwrap_err();
        assert!(matches!(err, AppError::InvalidEvent(_)));
    }

    #[test]
    fn signature_from_other_key_fails_verification() {
        let keys = Keys::generate();
        let other = Keys::generate();
        let event = keys.sign_event(unsigned(&keys)).unwrap();
        let forged = other.sign_event(unsigned(&other)).unwrap();

        let mut value = serde_json::to_value(&event).unwrap();
        value["sig"] = serde_json::Value::String(forged.sig().to_hex());
        let tampered: Event = serde_json::from_value(value).unwrap();

        assert!(tampered.verify().is_err());
    }

    #[test]
    fn json_field_order_is_stable() {
        let keys = Keys::generate();
        let event = keys.sign_event(unsigned(&keys)).unwrap();
        let json = event.to_json().unwrap();

        let positions: Vec<usize> = [
            "\"kind\"",
            "\"content\"",
            "\"created_at\"",
            "\"tags\"",
            "\"pubkey\"",
            "\"id\"",
            "\"sig\"",
        ]
        .iter()
        .map(|field| json.find(field).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn hex_newtypes_reject_wrong_lengths() {
        assert!(EventId::from_hex("abcd").is_err());
        assert!(EventSignature::from_hex(&"00".repeat(32)).is_err());
        assert!(PublicKey::from_hex(&"zz".repeat(32)).is_err());
    }
}
