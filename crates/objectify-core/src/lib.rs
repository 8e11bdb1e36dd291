//! Objectify Core Library
//!
//! This crate provides the Nostr event model, signing keys, typed tags,
//! error types, configuration and persisted settings shared by all
//! Objectify components.

pub mod config;
pub mod constants;
pub mod error;
pub mod keys;
pub mod models;
pub mod settings;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use keys::Keys;
pub use models::{
    BinaryObject, BlobDescriptor, ContentHash, Event, EventId, EventSignature, Listing,
    ListingDraft, Price, PublicKey, Tag, UnsignedEvent, UploadResult,
};
pub use settings::{Settings, StoredKey};
