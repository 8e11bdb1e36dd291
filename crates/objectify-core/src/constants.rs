//! Protocol constants and defaults.

/// Event kind of a Blossom authorization event.
pub const BLOSSOM_AUTH_KIND: u16 = 24242;

/// Event kind of a classified listing (NIP-99).
pub const CLASSIFIED_LISTING_KIND: u16 = 30402;

/// Lifetime of an upload authorization in seconds. Not configurable.
pub const AUTH_EXPIRATION_SECS: i64 = 300;

/// Scheme prefix of the `authorization` header value.
pub const AUTH_SCHEME: &str = "Nostr";

/// Default `content` of an upload authorization event.
pub const DEFAULT_AUTH_CONTENT: &str = "Upload Test Image";

/// MIME type used when a data URI does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

pub const DEFAULT_UPLOAD_SERVER: &str = "https://blossom.primal.net";

/// Servers probed for a NIP-96 configuration when none is configured.
pub const DEFAULT_DISCOVERY_SERVERS: &[&str] =
    &["https://nostr.download", "https://blossom.primal.net"];

pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://relay.snort.social",
    "wss://purplepag.es",
    "wss://nostr.wine",
];

pub const DEFAULT_SETTINGS_PATH: &str = "objectify.json";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
