//! Persisted user settings: signing keys and relay list.
//!
//! Settings live in a JSON file. They are loaded once with [`Settings::load`],
//! passed by reference to whatever needs them, and written back explicitly
//! with [`Settings::save`] after a change.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_RELAYS;
use crate::error::AppError;
use crate::keys::Keys;
use crate::models::event::PublicKey;

/// A named signing key.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredKey {
    pub id: Uuid,
    pub name: String,
    pub public_key: PublicKey,
    secret_key: String,
}

impl std::fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl StoredKey {
    pub fn keys(&self) -> Result<Keys, AppError> {
        Keys::from_secret_hex(&self.secret_key)
    }

    pub fn secret_hex(&self) -> &str {
        &self.secret_key
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub keys: Vec<StoredKey>,
    #[serde(default)]
    pub active_key_id: Option<Uuid>,
    #[serde(default = "default_relays")]
    pub relays: Vec<String>,
}

fn default_relays() -> Vec<String> {
    DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            active_key_id: None,
            relays: default_relays(),
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("invalid settings file {}: {}", path.display(), e))
        })?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Internal(format!("failed to serialize settings: {}", e)))?;
        fs::write(path, json)?;
        tracing::debug!(path = %path.display(), keys = self.keys.len(), "Settings saved");
        Ok(())
    }

    /// Add a key from its hex secret. Adding a key that is already stored
    /// returns the existing entry. The first key added becomes active.
    pub fn add_key(&mut self, secret_hex: &str, name: Option<&str>) -> Result<&StoredKey, AppError> {
        let keys = Keys::from_secret_hex(secret_hex)?;
        let public_key = keys.public_key();

        if let Some(index) = self.keys.iter().position(|k| k.public_key == public_key) {
            return Ok(&self.keys[index]);
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("Key {}", self.keys.len() + 1));

        let stored = StoredKey {
            id: Uuid::new_v4(),
            name,
            public_key,
            secret_key: keys.secret_hex(),
        };
        if self.active_key_id.is_none() {
            self.active_key_id = Some(stored.id);
        }
        tracing::info!(key_id = %stored.id, public_key = %public_key, "Key added");

        self.keys.push(stored);
        Ok(&self.keys[self.keys.len() - 1])
    }

    pub fn generate_key(&mut self, name: Option<&str>) -> Result<&StoredKey, AppError> {
        let keys = Keys::generate();
        self.add_key(&keys.secret_hex(), name)
    }

    /// Remove a key. Removing the active key leaves no key active.
    pub fn remove_key(&mut self, id: Uuid) -> Result<StoredKey, AppError> {
        let index = self
            .keys
            .iter()
            .position(|k| k.id == id)
            .ok_or_else(|| AppError::NotFound(format!("key {}", id)))?;

        if self.active_key_id == Some(id) {
            self.active_key_id = None;
        }
        Ok(self.keys.remove(index))
    }

    pub fn set_active_key(&mut self, id: Uuid) -> Result<(), AppError> {
        if !self.keys.iter().any(|k| k.id == id) {
            return Err(AppError::NotFound(format!("key {}", id)));
        }
        self.active_key_id = Some(id);
        Ok(())
    }

    pub fn active_key(&self) -> Option<&StoredKey> {
        let id = self.active_key_id?;
        self.keys.iter().find(|k| k.id == id)
    }

    /// Signing keys of the active entry.
    pub fn active_keys(&self) -> Result<Keys, AppError> {
        self.active_key()
            .ok_or_else(|| {
                AppError::NotFound("no active key; add or generate one first".to_string())
            })?
            .keys()
    }

    /// Add a relay URL. Returns `false` when it is already present.
    pub fn add_relay(&mut self, url: &str) -> Result<bool, AppError> {
        let url = url.trim();
        if !(url.starts_with("wss://") || url.starts_with("ws://")) {
            return Err(AppError::MalformedInput(format!(
                "relay URL must use ws:// or wss://: {:?}",
                url
            )));
        }
        if self.relays.iter().any(|r| r == url) {
            return Ok(false);
        }
        self.relays.push(url.to_string());
        Ok(true)
    }

    /// Remove a relay URL. Returns `false` when it was not present.
    pub fn remove_relay(&mut self, url: &str) -> bool {
        let before = self.relays.len();
        self.relays.retain(|r| r != url.trim());
        self.relays.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert!(settings.keys.is_empty());
        assert_eq!(settings.relays.len(), DEFAULT_RELAYS.len());
    }

    #[test]
    fn save_then_load_preserves_keys_and_relays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("objectify.json");

        let mut settings = Settings::default();
        let id = settings.generate_key(Some("main")).unwrap().id;
        settings.add_relay("wss://relay.example.com").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.active_key_id, Some(id));
        assert_eq!(loaded.keys[0].name, "main");
        assert!(loaded.relays.contains(&"wss://relay.example.com".to_string()));
        assert_eq!(
            loaded.active_keys().unwrap().public_key(),
            settings.active_keys().unwrap().public_key()
        );
    }

    #[test]
    fn corrupt_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objectify.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn add_key_names_and_deduplicates() {
        let mut settings = Settings::default();
        let keys = Keys::generate();

        let first = settings.add_key(&keys.secret_hex(), None).unwrap().id;
        let again = settings.add_key(&keys.secret_hex(), Some("dup")).unwrap().id;
        assert_eq!(first, again);
        assert_eq!(settings.keys.len(), 1);
        assert_eq!(settings.keys[0].name, "Key 1");

        assert!(settings.add_key("zz", None).is_err());
    }

    #[test]
    fn removing_active_key_clears_selection() {
        let mut settings = Settings::default();
        let a = settings.generate_key(Some("a")).unwrap().id;
        let b = settings.generate_key(Some("b")).unwrap().id;
        settings.set_active_key(b).unwrap();

        settings.remove_key(a).unwrap();
        assert_eq!(settings.active_key_id, Some(b));

        settings.remove_key(b).unwrap();
        assert_eq!(settings.active_key_id, None);
        assert!(matches!(settings.active_keys(), Err(AppError::NotFound(_))));
        assert!(matches!(settings.remove_key(b), Err(AppError::NotFound(_))));
    }

    #[test]
    fn set_active_key_requires_known_id() {
        let mut settings = Settings::default();
        assert!(settings.set_active_key(Uuid::new_v4()).is_err());
    }

    #[test]
    fn relays_are_unique_and_validated() {
        let mut settings = Settings::default();
        assert!(settings.add_relay("wss://relay.example.com").unwrap());
        assert!(!settings.add_relay("wss://relay.example.com").unwrap());
        assert!(settings.add_relay("https://relay.example.com").is_err());
        assert!(settings.add_relay("").is_err());

        assert!(settings.remove_relay("wss://relay.example.com"));
        assert!(!settings.remove_relay("wss://relay.example.com"));
    }
}
