//! Configuration Store
//!
//! Loads `folio.toml` from the working directory or the user config
//! directory. Every section has defaults, so an empty or missing file is a
//! valid configuration.

use crate::llm::LlmConfig;
use crate::logger::LogLevel;
use crate::network::NetworkConfig;
use crate::profile::{Profile, ProfileError};
use crate::rate_limiter::RateLimitConfig;
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "folio.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{0} is not set")]
    MissingApiKey(String),

    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("invalid {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Chat session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// User-initiated retries offered before falling back to a template reply
    pub max_user_retries: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_user_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Custom profile; the built-in profile is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<PathBuf>,
    pub ai: LlmConfig,
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
    pub network: NetworkConfig,
    pub chat: ChatConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }

    /// `<config dir>/folio/folio.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("folio").join(CONFIG_FILE_NAME))
    }

    /// First existing config file: working directory, then the config dir
    pub fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        Self::default_path().filter(|p| p.exists())
    }

    /// Load `path` if given, else the first config file found, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::find_config_file() {
                Some(found) => Self::load(found),
                None => Ok(Self::default()),
            },
        }
    }

    /// API key from the configured environment variable, then the file
    pub fn api_key(&self) -> Result<String, ConfigError> {
        let from_env = std::env::var(&self.ai.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty());
        match from_env.or_else(|| self.ai.api_key.clone()) {
            Some(key) => crate::util::validate_api_key(&key),
            None => Err(ConfigError::MissingApiKey(self.ai.api_key_env.clone())),
        }
    }

    pub fn load_profile(&self) -> Result<Profile, ConfigError> {
        Ok(Profile::load_or_builtin(self.profile_path.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.chat.max_user_retries, 3);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ai.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            profile_path = "me.toml"

            [retry]
            max_retries = 5

            [logging]
            level = "debug"
        "#,
        )
        .unwrap();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_ms, RetryConfig::default().base_delay_ms);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.profile_path, Some(PathBuf::from("me.toml")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.server.port = 8080;
        config.rate_limit.max_requests = 20;
        config.save(&path).unwrap();

        let loaded = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.rate_limit.max_requests, 20);
    }

    #[test]
    fn test_api_key_resolution() {
        let mut config = Config::default();
        config.ai.api_key_env = "FOLIO_TEST_KEY_UNSET_1".to_string();
        assert!(matches!(
            config.api_key(),
            Err(ConfigError::MissingApiKey(ref var)) if var == "FOLIO_TEST_KEY_UNSET_1"
        ));

        config.ai.api_key = Some("  file-key  ".to_string());
        assert_eq!(config.api_key().unwrap(), "file-key");

        config.ai.api_key = Some("none".to_string());
        assert!(matches!(config.api_key(), Err(ConfigError::InvalidApiKey(_))));
    }

    #[test]
    fn test_missing_profile_path_is_an_error() {
        let config = Config {
            profile_path: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Default::default()
        };
        assert!(matches!(config.load_profile(), Err(ConfigError::Profile(_))));
    }
}
