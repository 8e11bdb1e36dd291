//! Configuration module
//!
//! Runtime configuration read from the environment (and an optional `.env`
//! file): where to upload blobs, where the settings file lives and how long
//! HTTP requests may take.

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_AUTH_CONTENT, DEFAULT_DISCOVERY_SERVERS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_SETTINGS_PATH, DEFAULT_UPLOAD_SERVER,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    /// Base URL of the Blossom server; uploads go to `{upload_server}/upload`
    pub upload_server: String,
    pub settings_path: PathBuf,
    pub http_timeout_secs: u64,
    /// `content` of upload authorization events
    pub auth_content: String,
    /// Servers probed for a NIP-96 configuration
    pub discovery_servers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let upload_server = var("OBJECTIFY_UPLOAD_SERVER")
            .unwrap_or_else(|| DEFAULT_UPLOAD_SERVER.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let settings_path = var("OBJECTIFY_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

        let http_timeout_secs = var("OBJECTIFY_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let auth_content =
            var("OBJECTIFY_AUTH_CONTENT").unwrap_or_else(|| DEFAULT_AUTH_CONTENT.to_string());

        let discovery_servers = var("OBJECTIFY_DISCOVERY_SERVERS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                DEFAULT_DISCOVERY_SERVERS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        Self {
            environment,
            upload_server,
            settings_path,
            http_timeout_secs,
            auth_content,
            discovery_servers,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !is_http_url(&self.upload_server) {
            return Err(anyhow::anyhow!(
                "OBJECTIFY_UPLOAD_SERVER must be an http(s) URL, got {:?}",
                self.upload_server
            ));
        }

        if let Some(bad) = self.discovery_servers.iter().find(|s| !is_http_url(s)) {
            return Err(anyhow::anyhow!(
                "OBJECTIFY_DISCOVERY_SERVERS entries must be http(s) URLs, got {:?}",
                bad
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "OBJECTIFY_HTTP_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.upload_server, DEFAULT_UPLOAD_SERVER);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.auth_content, DEFAULT_AUTH_CONTENT);
        assert_eq!(config.discovery_servers.len(), DEFAULT_DISCOVERY_SERVERS.len());
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("ENVIRONMENT", "prod"),
            ("OBJECTIFY_UPLOAD_SERVER", "https://blobs.example.com/"),
            ("OBJECTIFY_SETTINGS_PATH", "/tmp/objectify/settings.json"),
            ("OBJECTIFY_HTTP_TIMEOUT_SECS", "5"),
            ("OBJECTIFY_DISCOVERY_SERVERS", "https://a.example, https://b.example/"),
        ]);

        assert!(config.is_production());
        assert_eq!(config.upload_server, "https://blobs.example.com");
        assert_eq!(
            config.settings_path(),
            Path::new("/tmp/objectify/settings.json")
        );
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(
            config.discovery_servers,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn unparsable_timeout_falls_back_to_default() {
        let config = config_from(&[("OBJECTIFY_HTTP_TIMEOUT_SECS", "soon")]);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = config_from(&[("OBJECTIFY_UPLOAD_SERVER", "ftp://blobs.example.com")]);
        assert!(config.validate().is_err());

        let config = config_from(&[("OBJECTIFY_HTTP_TIMEOUT_SECS", "0")]);
        assert!(config.validate().is_err());

        let config = config_from(&[("OBJECTIFY_DISCOVERY_SERVERS", "blossom.primal.net")]);
        assert!(config.validate().is_err());
    }
}
