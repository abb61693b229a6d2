//! Configuration management for Mindwell
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MindwellError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Mindwell
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Live completion endpoint settings
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Connection string: `memory:`, `sled://<path>` or a plain directory path.
    /// Required; there is no default store location.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Page cache size for the store (bytes)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity_bytes: u64,

    /// Background flush interval (milliseconds); writes are also flushed
    /// explicitly before an append returns
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: u64,

    /// Result cap used when a list request does not specify one
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,

    /// Upper bound for caller supplied result caps
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: usize,
}

fn default_cache_capacity() -> u64 {
    64 * 1024 * 1024 // 64 MB
}

fn default_flush_every_ms() -> u64 {
    500
}

fn default_list_limit() -> usize {
    50
}

fn default_max_list_limit() -> usize {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            cache_capacity_bytes: default_cache_capacity(),
            flush_every_ms: default_flush_every_ms(),
            default_list_limit: default_list_limit(),
            max_list_limit: default_max_list_limit(),
        }
    }
}

/// Live completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Forward chat messages to the hosted model; otherwise canned replies are used
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API (`/chat/completions` is appended)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer credential; usually supplied through `MINDWELL_COMPLETION_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Deadline for a single attempt (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    150
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MindwellError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MindwellError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(bind) = std::env::var("MINDWELL_BIND_ADDRESS") {
            self.server.bind_address = bind;
        }

        if let Ok(url) = std::env::var("MINDWELL_DATABASE_URL") {
            if !url.trim().is_empty() {
                self.storage.database_url = Some(url);
            }
        }

        if let Ok(enabled) = std::env::var("MINDWELL_COMPLETION_ENABLED") {
            match enabled.parse::<bool>() {
                Ok(v) => {
                    self.completion.enabled = v;
                    tracing::debug!(enabled = v, "Env override: MINDWELL_COMPLETION_ENABLED");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for MINDWELL_COMPLETION_ENABLED: {}", enabled);
                }
            }
        }

        if let Ok(api_base) = std::env::var("MINDWELL_COMPLETION_API_BASE") {
            self.completion.api_base = api_base;
        }

        if let Ok(model) = std::env::var("MINDWELL_COMPLETION_MODEL") {
            self.completion.model = model;
        }

        if let Ok(key) = std::env::var("MINDWELL_COMPLETION_API_KEY") {
            if !key.trim().is_empty() {
                self.completion.api_key = Some(key);
            }
        }

        if let Ok(timeout) = std::env::var("MINDWELL_COMPLETION_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.completion.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MINDWELL_COMPLETION_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(attempts) = std::env::var("MINDWELL_COMPLETION_MAX_ATTEMPTS") {
            if let Ok(value) = attempts.parse() {
                self.completion.max_attempts = value;
            } else {
                tracing::warn!("Invalid MINDWELL_COMPLETION_MAX_ATTEMPTS: {}", attempts);
            }
        }

        if let Ok(json_logs) = std::env::var("MINDWELL_JSON_LOGS") {
            match json_logs.parse::<bool>() {
                Ok(v) => self.logging.json_format = v,
                Err(_) => tracing::warn!("Invalid value for MINDWELL_JSON_LOGS: {}", json_logs),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(url) = &cli.database_url {
            tracing::info!("Using database URL override from CLI: {}", url);
            self.storage.database_url = Some(url.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails. A missing database URL is
    /// always fatal. An enabled completion endpoint without an API key is not:
    /// it is reported at startup and surfaces as a service-unavailable error
    /// per request.
    pub fn validate(&self) -> Result<()> {
        match self.storage.database_url.as_deref() {
            None => {
                return Err(MindwellError::Config(
                    "storage.database_url is required (set MINDWELL_DATABASE_URL)".to_string(),
                )
                .into());
            }
            Some(url) if url.trim().is_empty() => {
                return Err(MindwellError::Config(
                    "storage.database_url cannot be empty".to_string(),
                )
                .into());
            }
            Some(_) => {}
        }

        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(MindwellError::Config(format!(
                "server.bind_address is not a socket address: {}",
                self.server.bind_address
            ))
            .into());
        }

        if self.storage.default_list_limit == 0 {
            return Err(MindwellError::Config(
                "storage.default_list_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.flush_every_ms == 0 {
            return Err(MindwellError::Config(
                "storage.flush_every_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.max_list_limit < self.storage.default_list_limit {
            return Err(MindwellError::Config(
                "storage.max_list_limit must be at least storage.default_list_limit".to_string(),
            )
            .into());
        }

        if self.completion.max_attempts == 0 {
            return Err(MindwellError::Config(
                "completion.max_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        if self.completion.max_attempts > 10 {
            return Err(MindwellError::Config(
                "completion.max_attempts must be less than or equal to 10".to_string(),
            )
            .into());
        }

        if self.completion.timeout_seconds == 0 {
            return Err(MindwellError::Config(
                "completion.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(MindwellError::Config(
                "completion.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.completion.max_tokens == 0 {
            return Err(MindwellError::Config(
                "completion.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.completion.enabled && self.completion.api_key.is_none() {
            tracing::warn!(
                "Live completion is enabled but no API key is configured; chat requests will fail with 503"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.storage.database_url = Some("memory:".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.storage.default_list_limit, 50);
        assert!(!config.completion.enabled);
        assert_eq!(config.completion.max_attempts, 3);
        assert_eq!(config.completion.timeout_seconds, 30);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_database_url_is_fatal() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database_url"));
    }

    #[test]
    fn test_blank_database_url_is_rejected() {
        let mut config = valid_config();
        config.storage.database_url = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_flush_interval_rejected() {
        let mut config = valid_config();
        config.storage.flush_every_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("flush_every_ms"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = valid_config();
        config.completion.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let mut config = valid_config();
        config.completion.temperature = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        let mut config = valid_config();
        config.server.bind_address = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_completion_without_key_still_validates() {
        let mut config = valid_config();
        config.completion.enabled = true;
        config.completion.api_key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml_with_partial_sections() {
        let yaml = r#"
storage:
  database_url: "sled:///tmp/mindwell"
completion:
  enabled: true
  max_attempts: 2
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.storage.database_url.as_deref(),
            Some("sled:///tmp/mindwell")
        );
        assert!(config.completion.enabled);
        assert_eq!(config.completion.max_attempts, 2);
        assert_eq!(config.completion.retry_delay_ms, 1000);
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = valid_config();
        config.completion.api_key = Some("sk-secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_apply() {
        std::env::set_var("MINDWELL_DATABASE_URL", "memory:");
        std::env::set_var("MINDWELL_COMPLETION_ENABLED", "true");
        std::env::set_var("MINDWELL_COMPLETION_API_KEY", "sk-test");
        std::env::set_var("MINDWELL_COMPLETION_MAX_ATTEMPTS", "not-a-number");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.storage.database_url.as_deref(), Some("memory:"));
        assert!(config.completion.enabled);
        assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.completion.max_attempts, 3);

        std::env::remove_var("MINDWELL_DATABASE_URL");
        std::env::remove_var("MINDWELL_COMPLETION_ENABLED");
        std::env::remove_var("MINDWELL_COMPLETION_API_KEY");
        std::env::remove_var("MINDWELL_COMPLETION_MAX_ATTEMPTS");
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults_and_cli_override() {
        std::env::remove_var("MINDWELL_DATABASE_URL");
        let cli = crate::cli::Cli {
            database_url: Some("memory:".to_string()),
            ..Default::default()
        };
        let config = Config::load("/nonexistent/mindwell.yaml", &cli).unwrap();
        assert_eq!(config.storage.database_url.as_deref(), Some("memory:"));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_reads_yaml_file() {
        std::env::remove_var("MINDWELL_DATABASE_URL");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "server:\n  bind_address: \"0.0.0.0:8080\"\nstorage:\n  database_url: \"memory:\"\n",
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap(), &crate::cli::Cli::default()).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }
}
