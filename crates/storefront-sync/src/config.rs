//! # Storefront Configuration
//!
//! Where the CRUD backend lives, how patiently to retry it, and where local
//! state is kept.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_BACKEND_URL=http://shop.local/api                       │
//! │     STOREFRONT_RETRY_ATTEMPTS=3                                        │
//! │     STOREFRONT_RETRY_DELAY_MS=2000                                     │
//! │     STOREFRONT_TIMEOUT_SECS=10                                         │
//! │     STOREFRONT_DATA_DIR=/var/lib/storefront                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/storefront.toml (Linux)                       │
//! │     ~/Library/Application Support/com.storefront.storefront/ (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [backend]
//! url = "http://localhost:3000/api"
//! timeout_secs = 10
//!
//! [retry]
//! max_attempts = 3
//! delay_ms = 2000
//!
//! [storage]
//! data_dir = "/home/ana/.local/share/storefront"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

// =============================================================================
// Sections
// =============================================================================

/// CRUD backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL; products live under `<url>/products`.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            url: default_backend_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Catalog refresh retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per refresh, the first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY.as_millis() as u64
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Local storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for the cart and favorites slots.
    /// Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete storefront configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl StorefrontConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = Url::parse(&self.backend.url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidConfig(format!(
                "Backend URL must start with http:// or https://, got: {}",
                self.backend.url
            )));
        }
        if url.cannot_be_a_base() {
            return Err(SyncError::InvalidConfig(format!(
                "Backend URL cannot be used as a base: {}",
                self.backend.url
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(SyncError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.backend.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "backend.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any variable source (the environment in
    /// production, a map in tests). Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOREFRONT_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.url = url;
        }

        if let Some(timeout) = lookup("STOREFRONT_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.backend.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid STOREFRONT_TIMEOUT_SECS"),
            }
        }

        if let Some(attempts) = lookup("STOREFRONT_RETRY_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) => {
                    debug!(attempts = n, "Overriding retry attempts from environment");
                    self.retry.max_attempts = n;
                }
                Err(_) => warn!(value = %attempts, "Ignoring invalid STOREFRONT_RETRY_ATTEMPTS"),
            }
        }

        if let Some(delay) = lookup("STOREFRONT_RETRY_DELAY_MS") {
            match delay.parse::<u64>() {
                Ok(ms) => self.retry.delay_ms = ms,
                Err(_) => warn!(value = %delay, "Ignoring invalid STOREFRONT_RETRY_DELAY_MS"),
            }
        }

        if let Some(dir) = lookup("STOREFRONT_DATA_DIR") {
            debug!(dir = %dir, "Overriding data directory from environment");
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "storefront")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Retry policy for catalog refreshes.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn backend_url(&self) -> &str {
        &self.backend.url
    }

    /// Directory for local slots: configured, else the platform data dir.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "storefront", "storefront")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StorefrontConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_validation() {
        let mut config = StorefrontConfig::default();

        config.backend.url = "ws://localhost:3000".to_string();
        assert!(config.validate().is_err());

        config.backend.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.backend.url = "https://shop.example.com/api".to_string();
        assert!(config.validate().is_ok());

        config.retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STOREFRONT_BACKEND_URL", "http://10.0.0.5:8080/api"),
            ("STOREFRONT_RETRY_ATTEMPTS", "5"),
            ("STOREFRONT_RETRY_DELAY_MS", "250"),
            ("STOREFRONT_TIMEOUT_SECS", "soon"),
            ("STOREFRONT_DATA_DIR", "/tmp/storefront"),
        ]);

        let mut config = StorefrontConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend_url(), "http://10.0.0.5:8080/api");
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(250))
        );
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.data_dir(), Some(PathBuf::from("/tmp/storefront")));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(
            &path,
            "[backend]\nurl = \"https://shop.example.com/api\"\n\n[retry]\nmax_attempts = 4\n",
        )
        .unwrap();

        let config = StorefrontConfig::load(Some(path)).unwrap();
        assert_eq!(config.backend_url(), "https://shop.example.com/api");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.delay_ms, 2000);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "[backend]\nurl = \"ftp://shop.example.com\"\n").unwrap();

        let err = StorefrontConfig::load(Some(path)).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: StorefrontConfig = toml::from_str("[retry]\ndelay_ms = 500\n").unwrap();
        assert_eq!(parsed.retry.max_attempts, 3);
        assert_eq!(parsed.retry.delay_ms, 500);
        assert_eq!(parsed.backend, BackendSettings::default());
    }
}
