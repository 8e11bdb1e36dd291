//! Signing keys and event signing.
//!
//! Events are signed with BIP-340 Schnorr signatures over secp256k1, the
//! scheme Nostr relays and Blossom servers verify.

use std::fmt;

use k256::schnorr::SigningKey;
use rand_core::{OsRng, RngCore};

use crate::error::AppError;
use crate::models::event::{Event, EventSignature, PublicKey, UnsignedEvent};

/// A secret key together with its x-only public key.
#[derive(Clone)]
pub struct Keys {
    secret: SigningKey,
    public: PublicKey,
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl Keys {
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        if bytes.len() != 32 {
            return Err(AppError::InvalidKey(format!(
                "secret key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let secret = SigningKey::from_bytes(bytes).map_err(|_| {
            AppError::InvalidKey("secret key is not a valid secp256k1 scalar".to_string())
        })?;
        Ok(Self::from_signing_key(secret))
    }

    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, AppError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| AppError::InvalidKey(format!("secret key is not valid hex: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    fn from_signing_key(secret: SigningKey) -> Self {
        let public = PublicKey::from_verifying_key(secret.verifying_key());
        Self { secret, public }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret.to_bytes())
    }

    /// Compute the event id, sign it and check the signature before
    /// returning. Any failure, including a failed self-check, is a
    /// `Signing` error and no event is produced.
    pub fn sign_event(&self, unsigned: UnsignedEvent) -> Result<Event, AppError> {
        if unsigned.pubkey != self.public {
            return Err(AppError::Signing(format!(
                "event pubkey {} does not belong to this key ({})",
                unsigned.pubkey, self.public
            )));
        }

        let id = unsigned
            .compute_id()
            .map_err(|e| AppError::Signing(e.to_string()))?;

        let mut aux_rand = [0u8; 32];
        OsRng.fill_bytes(&mut aux_rand);

        let signature = self
            .secret
            .sign_raw(id.as_bytes(), &aux_rand)
            .map_err(|e| AppError::Signing(format!("schnorr signing failed: {}", e)))?;

        let event = Event::from_parts(unsigned, id, EventSignature::from_signature(&signature));

        event.verify().map_err(|e| {
            tracing::error!(event_id = %id, error = %e, "Signed event failed self-verification");
            AppError::Signing(format!("self-verification failed: {}", e))
        })?;

        Ok(event)
    }
}
