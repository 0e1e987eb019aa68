//! Configuration management for ACAI.
//!
//! Loads configuration from ${ACAI_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "ACAI_API_URL";
/// Environment variable overriding `log.filter`.
pub const LOG_FILTER_ENV: &str = "ACAI_LOG";

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for ACAI configuration and data directories.
    //!
    //! ACAI_HOME resolution order:
    //! 1. ACAI_HOME environment variable (if set)
    //! 2. ~/.config/acai (default)

    use std::path::PathBuf;

    /// Returns the ACAI home directory.
    pub fn acai_home() -> PathBuf {
        if let Ok(home) = std::env::var("ACAI_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("acai")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        acai_home().join("config.toml")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        acai_home().join("logs")
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the chat/document backend
    pub base_url: String,
    /// Per-request timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Error text set when the user stops a pending reply
    pub cancel_notice: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            cancel_notice: Config::DEFAULT_CANCEL_NOTICE.to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub log: LogConfig,
}

impl Config {
    const DEFAULT_BASE_URL: &str = "http://localhost:8001";
    const DEFAULT_TIMEOUT_SECS: u64 = 120;
    const DEFAULT_CANCEL_NOTICE: &str = "Generation stopped.";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the default config template to `path`.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Resolves the backend base URL with precedence: env > config > default.
    ///
    /// Trailing slashes are trimmed so endpoint paths can be appended directly.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is malformed.
    pub fn api_base_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var(API_URL_ENV) {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                return normalize_base_url(trimmed);
            }
        }

        let configured = self.api.base_url.trim();
        if !configured.is_empty() {
            return normalize_base_url(configured);
        }

        Ok(Self::DEFAULT_BASE_URL.to_string())
    }

    /// Returns the per-request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.api.timeout_secs > 0).then(|| Duration::from_secs(self.api.timeout_secs))
    }

    /// Returns the log filter directive with precedence: env > config.
    pub fn log_filter(&self) -> String {
        std::env::var(LOG_FILTER_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.log.filter.clone())
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Validates `url` and strips trailing slashes.
///
/// # Errors
/// Returns an error if `url` does not parse.
pub fn normalize_base_url(url: &str) -> Result<String> {
    url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    /// Config loading: missing file returns defaults.
    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8001");
        assert_eq!(config.api.timeout_secs, 120);
        assert_eq!(config.chat.cancel_notice, "Generation stopped.");
    }

    /// Config loading: partial config merges with defaults.
    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "[api]\nbase_url = \"http://example.test:9000/\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.base_url, "http://example.test:9000/");
        assert_eq!(config.api.timeout_secs, 120);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_load_invalid_toml_errors() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[api\nbase_url = ").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.api.base_url, defaults.api.base_url);
        assert_eq!(config.api.timeout_secs, defaults.api.timeout_secs);
        assert_eq!(config.chat.cancel_notice, defaults.chat.cancel_notice);
        assert_eq!(config.log.filter, defaults.log.filter);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("config.toml");

        Config::init(&config_path).unwrap();
        assert!(config_path.exists());

        let err = Config::init(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8001/").unwrap(),
            "http://localhost:8001"
        );
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let mut config = Config::default();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(120)));
        config.api.timeout_secs = 0;
        assert_eq!(config.request_timeout(), None);
    }
}
