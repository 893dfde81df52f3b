//! Configuration and API key storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "CHATBASE_API_KEY";

pub const DEFAULT_MESSAGE_HOST: &str = "https://chatbase.com";
pub const DEFAULT_EVENTS_HOST: &str = "https://api.chatbase.com";

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Chatbase bot API key
    pub api_key: Option<String>,
    /// Default platform for messages and events (e.g. "Facebook", "Kik")
    pub platform: Option<String>,
    /// Default bot version
    pub version: Option<String>,
    /// Default user id
    pub user_id: Option<String>,
    /// Host serving the `/api/...` message and click routes
    pub message_host: Option<String>,
    /// Host serving the `/apis/v1/events/...` routes
    pub events_host: Option<String>,
    /// Request timeout applied to the HTTP transport. No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "chatbase", "chatbase")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load only what is stored on disk, ignoring the environment.
    /// This is the starting point for anything written back with `save`.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    fn apply_env_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            self.api_key = Some(key);
        }
    }

    /// Overwrite fields that are set in `updates`, keep the rest.
    pub fn merge(&mut self, updates: Config) {
        let Config {
            api_key,
            platform,
            version,
            user_id,
            message_host,
            events_host,
            timeout_secs,
        } = updates;
        self.api_key = api_key.or(self.api_key.take());
        self.platform = platform.or(self.platform.take());
        self.version = version.or(self.version.take());
        self.user_id = user_id.or(self.user_id.take());
        self.message_host = message_host.or(self.message_host.take());
        self.events_host = events_host.or(self.events_host.take());
        self.timeout_secs = timeout_secs.or(self.timeout_secs.take());
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains the API key)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    pub fn message_host(&self) -> &str {
        self.message_host.as_deref().unwrap_or(DEFAULT_MESSAGE_HOST)
    }

    pub fn events_host(&self) -> &str {
        self.events_host.as_deref().unwrap_or(DEFAULT_EVENTS_HOST)
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    pub fn platform(&self) -> &str {
        self.platform.as_deref().unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or_default()
    }

    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.message_host(), DEFAULT_MESSAGE_HOST);
        assert_eq!(config.events_host(), DEFAULT_EVENTS_HOST);
        assert_eq!(config.api_key(), "");
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
api_key = "abc-123"
platform = "Facebook"
version = "1.2"
user_id = "u1"
message_host = "http://localhost:8080"
events_host = "http://localhost:8081"
timeout_secs = 5
"#,
        )
        .unwrap();

        assert_eq!(config.api_key(), "abc-123");
        assert_eq!(config.platform(), "Facebook");
        assert_eq!(config.version(), "1.2");
        assert_eq!(config.user_id(), "u1");
        assert_eq!(config.message_host(), "http://localhost:8080");
        assert_eq!(config.events_host(), "http://localhost:8081");
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn test_toml_roundtrip_skips_unset() {
        let config = Config {
            api_key: Some("k".into()),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("api_key"));
        assert!(!text.contains("events_host"));
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_env_api_key_override() {
        let mut config = Config::from_toml("api_key = \"stored\"").unwrap();
        config.apply_env_api_key(Some(String::new()));
        assert_eq!(config.api_key(), "stored");
        config.apply_env_api_key(None);
        assert_eq!(config.api_key(), "stored");
        config.apply_env_api_key(Some("from-env".into()));
        assert_eq!(config.api_key(), "from-env");
    }

    #[test]
    fn test_merge_keeps_env_key_out_of_stored_config() {
        let mut stored = Config::from_toml("platform = \"Kik\"\nversion = \"1\"").unwrap();

        let mut runtime = stored.clone();
        runtime.apply_env_api_key(Some("secret".into()));
        assert_eq!(runtime.api_key(), "secret");

        stored.merge(Config {
            platform: Some("Web".into()),
            ..Default::default()
        });
        assert_eq!(stored.platform(), "Web");
        assert_eq!(stored.version(), "1");
        assert!(stored.api_key.is_none());

        let text = toml::to_string_pretty(&stored).unwrap();
        assert!(!text.contains("secret"));
        assert!(!text.contains("api_key"));
    }

    #[test]
    fn test_merge_overwrites_set_fields() {
        let mut stored = Config::from_toml("api_key = \"old\"\nuser_id = \"u1\"").unwrap();
        stored.merge(Config {
            api_key: Some("new".into()),
            timeout_secs: Some(10),
            ..Default::default()
        });
        assert_eq!(stored.api_key(), "new");
        assert_eq!(stored.user_id(), "u1");
        assert_eq!(stored.timeout_secs, Some(10));
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(Config::from_toml("timeout_secs = \"soon\"").is_err());
    }
}
