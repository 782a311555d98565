//! Configuration loading, validation, and management for the chat service.
//!
//! Loads configuration from a TOML file (`--config`, `SHANGHAN_CONFIG`, or
//! `./shanghan.toml`) with environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SHANGHAN_CONFIG";

/// Environment variable holding the completion API key.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// The root configuration structure.
///
/// Maps directly to `shanghan.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion API key. Absent means "answer from the fallback responder".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum attempts per completion request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base in milliseconds; attempt `n` waits `base * 2^n`
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Feedback / conversation persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Accounts allowed to log in
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

fn default_api_url() -> String {
    "https://api.deepseek.com".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    1000
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("gateway", &self.gateway)
            .field("storage", &self.storage)
            .field("logging", &self.logging)
            .field("users", &self.users)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Name of the session cookie set on login
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Live sessions kept before the oldest is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}
fn default_cookie_name() -> String {
    "shanghan_session".into()
}
fn default_max_sessions() -> usize {
    1_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cookie_name: default_cookie_name(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" (JSON files under `data_dir`) or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_storage_backend() -> String {
    "file".into()
}
fn default_data_dir() -> String {
    "data".into()
}

impl StorageConfig {
    pub fn feedback_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("feedback")
    }

    pub fn conversations_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("conversations")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily JSON log files; unset disables file logging
    #[serde(default = "default_log_dir", skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_dir() -> Option<String> {
    Some("logs".into())
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

/// A login account. Only the salted hash of the password is stored.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub email: String,

    /// Output of `shanghan hash-password`
    pub password_hash: String,

    #[serde(default)]
    pub admin: bool,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("admin", &self.admin)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default location when `None`,
    /// then apply environment overrides.
    ///
    /// Environment variables:
    /// - `DEEPSEEK_API_KEY` (used when the file has no `api_key`)
    /// - `SHANGHAN_MODEL`, `SHANGHAN_HOST`, `PORT`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path(),
        };
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// `SHANGHAN_CONFIG` if set, otherwise `./shanghan.toml`.
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("shanghan.toml"))
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a function so callers (and tests) control the
    /// source of variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty());
        }

        if let Some(model) = lookup("SHANGHAN_MODEL") {
            self.model = model;
        }

        if let Some(host) = lookup("SHANGHAN_HOST") {
            self.gateway.host = host;
        }

        if let Some(port) = lookup("PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "max_retries must be at least 1".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if !matches!(self.storage.backend.as_str(), "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "storage.backend must be \"file\" or \"memory\", got \"{}\"",
                self.storage.backend
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.email.trim().is_empty() || user.password_hash.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "every [[users]] entry needs an email and a password_hash".into(),
                ));
            }
            if !seen.insert(user.email.to_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate user '{}'",
                    user.email
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            gateway: GatewayConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            users: vec![],
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.gateway.port, 5000);
        assert!(!config.has_api_key());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.api_url, config.api_url);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.logging.log_dir, config.logging.log_dir);
    }

    #[test]
    fn zero_retries_rejected() {
        let config = AppConfig {
            max_retries: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_storage_backend_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "postgres".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_users_rejected() {
        let user = UserConfig {
            email: "prof@tcm.org".into(),
            password_hash: "hmac-sha256$00$00".into(),
            admin: true,
        };
        let config = AppConfig {
            users: vec![user.clone(), user],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/shanghan.toml")).unwrap();
        assert_eq!(config.model, "deepseek-chat");
    }

    #[test]
    fn loads_users_and_sections_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shanghan.toml");
        std::fs::write(
            &path,
            r#"
model = "deepseek-reasoner"
max_retries = 5

[gateway]
port = 8088

[storage]
backend = "memory"

[[users]]
email = "prof@tcm.org"
password_hash = "hmac-sha256$aa$bb"
admin = true
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "deepseek-reasoner");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.gateway.port, 8088);
        assert_eq!(config.gateway.cookie_name, "shanghan_session");
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.users.len(), 1);
        assert!(config.users[0].admin);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "max_retries = \"three\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_supplies_missing_api_key() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[(API_KEY_ENV, "sk-from-env"), ("PORT", "9000")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-from-env"));
        assert_eq!(config.gateway.port, 9000);
        assert!(config.has_api_key());
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("sk-from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[(API_KEY_ENV, "sk-from-env")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-from-file"));
    }

    #[test]
    fn blank_env_api_key_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[(API_KEY_ENV, "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn bad_port_env_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("sk-secret-value".into()),
            users: vec![UserConfig {
                email: "prof@tcm.org".into(),
                password_hash: "hmac-sha256$salt$digest".into(),
                admin: true,
            }],
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-value"));
        assert!(!debug.contains("digest"));
        assert!(debug.contains("prof@tcm.org"));
    }

    #[test]
    fn storage_dirs_nest_under_data_dir() {
        let storage = StorageConfig {
            backend: "file".into(),
            data_dir: "/var/lib/shanghan".into(),
        };
        assert_eq!(storage.feedback_dir(), PathBuf::from("/var/lib/shanghan/feedback"));
        assert_eq!(
            storage.conversations_dir(),
            PathBuf::from("/var/lib/shanghan/conversations")
        );
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("deepseek-chat"));
        assert!(toml_str.contains("5000"));
    }
}
