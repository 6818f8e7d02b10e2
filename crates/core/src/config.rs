//! Configuration management
//!
//! Two files feed the viewer: the user file (JSON credentials and page
//! size, passed on the command line) and an optional TOML settings file
//! for endpoints and client behaviour.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::identity::{Credentials, STORAGE_SERVICE_NAME};
use crate::progress::{DEFAULT_BLOCK_SIZE, DEFAULT_SEGMENTS};
use crate::retry::{RetryBuilder, RetryConfig};

/// Environment variable overriding the settings directory
pub const CONFIG_DIR_ENV: &str = "CFV_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "cloudfiles-viewer";

/// Default page size when the user file does not set one
pub const DEFAULT_REQUEST_LIMIT: i64 = 10;

/// Contents of the user file: `{"user", "apikey", "request-limit"}`
#[derive(Clone, Deserialize)]
pub struct UserProfile {
    pub user: String,
    pub apikey: String,
    #[serde(rename = "request-limit", default = "default_request_limit")]
    pub request_limit: i64,
}

fn default_request_limit() -> i64 {
    DEFAULT_REQUEST_LIMIT
}

impl UserProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read user file {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let profile: UserProfile = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid user file: {e}")))?;

        if profile.user.is_empty() {
            return Err(Error::Config("User file has an empty 'user'".to_string()));
        }
        Ok(profile)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user, &self.apikey)
    }

    /// Listing page size; a negative limit means unbounded
    ///
    /// Zero is sent as given; such a page is never treated as full.
    pub fn page_limit(&self) -> Option<u32> {
        if self.request_limit < 0 {
            return None;
        }
        Some(u32::try_from(self.request_limit).unwrap_or(u32::MAX))
    }
}

impl fmt::Debug for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserProfile")
            .field("user", &self.user)
            .field("apikey", &"<redacted>")
            .field("request_limit", &self.request_limit)
            .finish()
    }
}

/// Client settings, all optional in the TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub identity: IdentitySettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub host: String,
    pub ssl: bool,
    /// Retries after the first token request while the service is unavailable
    pub retry_budget: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            host: "identity.api.rackspacecloud.com".to_string(),
            ssl: true,
            retry_budget: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 2000,
        }
    }
}

impl IdentitySettings {
    /// Retry policy for a token request with `retry_budget` retries
    pub fn retry_config(&self, retry_budget: u32) -> RetryConfig {
        RetryBuilder::new()
            .retries(retry_budget)
            .initial_backoff_ms(self.initial_backoff_ms)
            .max_backoff_ms(self.max_backoff_ms)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Catalog name of the storage service
    pub service_name: String,
    pub ssl: bool,
    /// Retry a download once without certificate validation after a TLS error
    pub allow_insecure_fallback: bool,
    pub progress_segments: u64,
    pub block_size: usize,
    /// Where downloads land; defaults to the current directory
    pub download_dir: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            service_name: STORAGE_SERVICE_NAME.to_string(),
            ssl: true,
            allow_insecure_fallback: false,
            progress_segments: DEFAULT_SEGMENTS,
            block_size: DEFAULT_BLOCK_SIZE,
            download_dir: None,
        }
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid settings: {e}")))
    }
}

/// Locates and loads the settings file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Settings at `$CFV_CONFIG_DIR/config.toml`, else the platform config dir
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|d| d.join(APP_DIR_NAME))
                .ok_or_else(|| {
                    Error::Config("Could not determine the configuration directory".to_string())
                })?,
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE_NAME)))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults
    pub fn load(&self) -> Result<Settings> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Settings::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
                Ok(Settings::default())
            }
            Err(e) => Err(Error::Config(format!(
                "Failed to read settings {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_user_profile_parse() {
        let profile =
            UserProfile::parse(r#"{"user": "alice", "apikey": "k3y", "request-limit": 25}"#)
                .unwrap();
        assert_eq!(profile.user, "alice");
        assert_eq!(profile.page_limit(), Some(25));
        assert_eq!(profile.credentials().api_key(), "k3y");
        assert!(!format!("{profile:?}").contains("k3y"));
    }

    #[test]
    fn test_user_profile_limits() {
        let default = UserProfile::parse(r#"{"user": "a", "apikey": "k"}"#).unwrap();
        assert_eq!(default.page_limit(), Some(10));

        let unbounded =
            UserProfile::parse(r#"{"user": "a", "apikey": "k", "request-limit": -1}"#).unwrap();
        assert_eq!(unbounded.page_limit(), None);

        let zero =
            UserProfile::parse(r#"{"user": "a", "apikey": "k", "request-limit": 0}"#).unwrap();
        assert_eq!(zero.page_limit(), Some(0));
    }

    #[test]
    fn test_user_profile_rejects_bad_input() {
        assert!(matches!(
            UserProfile::parse(r#"{"apikey": "k"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            UserProfile::parse(r#"{"user": "", "apikey": "k"}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_user_profile_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user.json");
        std::fs::write(&path, r#"{"user": "bob", "apikey": "x", "request-limit": 3}"#).unwrap();

        let profile = UserProfile::load(&path).unwrap();
        assert_eq!(profile.user, "bob");
        assert!(UserProfile::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.identity.host, "identity.api.rackspacecloud.com");
        assert_eq!(settings.identity.retry_budget, 5);
        assert_eq!(settings.storage.service_name, "cloudFiles");
        assert!(!settings.storage.allow_insecure_fallback);
    }

    #[test]
    fn test_settings_partial_toml() {
        let settings = Settings::parse(
            r#"
            [identity]
            host = "identity.example.com"
            retry_budget = 2

            [storage]
            allow_insecure_fallback = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.identity.host, "identity.example.com");
        assert!(settings.identity.ssl);
        assert_eq!(settings.identity.retry_budget, 2);
        assert!(settings.storage.allow_insecure_fallback);
        assert_eq!(settings.storage.block_size, 4096);

        let retry = settings.identity.retry_config(settings.identity.retry_budget);
        assert_eq!(retry.max_attempts, 3);
    }

    #[test]
    fn test_config_manager_missing_file_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        assert_eq!(manager.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_config_manager_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "identity = 5").unwrap();
        assert!(matches!(
            ConfigManager::with_path(path).load(),
            Err(Error::Config(_))
        ));
    }
}
