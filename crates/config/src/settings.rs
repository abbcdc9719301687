//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation, stub inquiry submitter allowed
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Outbound inquiry endpoint
    #[serde(default)]
    pub inquiry: InquiryConfig,

    /// Reply formatting
    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// When false every origin is allowed (development only)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Conversation session limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Inactivity timeout before a session is discarded
    #[serde(default = "default_session_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_max_sessions() -> usize {
    1000
}

fn default_session_timeout() -> u64 {
    1800
}

fn default_cleanup_interval() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            timeout_secs: default_session_timeout(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Inquiry submission endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryConfig {
    /// `POST` target for completed leads. Unset means the stub submitter is used.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_inquiry_timeout")]
    pub timeout_ms: u64,
}

fn default_inquiry_timeout() -> u64 {
    5000
}

impl Default for InquiryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_inquiry_timeout(),
        }
    }
}

/// Reply formatting options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Currency code printed before listing prices
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "AED".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "must be non-zero".to_string(),
            });
        }

        if self.session.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_sessions".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.session.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.cleanup_interval_secs".to_string(),
                message: "must be non-zero".to_string(),
            });
        }

        if self.inquiry.timeout_ms < 100 || self.inquiry.timeout_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                field: "inquiry.timeout_ms".to_string(),
                message: "must be between 100 and 60000".to_string(),
            });
        }

        match &self.inquiry.endpoint {
            Some(endpoint)
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) =>
            {
                return Err(ConfigError::InvalidValue {
                    field: "inquiry.endpoint".to_string(),
                    message: format!("not an http(s) URL: {}", endpoint),
                });
            },
            None if self.environment.is_production() => {
                return Err(ConfigError::MissingField("inquiry.endpoint".to_string()));
            },
            None => {
                tracing::warn!("No inquiry endpoint configured; leads will go to the stub submitter");
            },
            _ => {},
        }

        if self.assistant.currency.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "assistant.currency".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from `config/default`, `config/{env}` and the environment
///
/// Priority: env vars > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Same as [`load_settings`] with an explicit configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LEAD_ASSISTANT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.assistant.currency, "AED");
        assert!(settings.inquiry.endpoint.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_production_requires_endpoint() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingField(_))
        ));

        settings.inquiry.endpoint = Some("https://api.example.com/api/inquiries".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_endpoint_must_be_http() {
        let mut settings = Settings::default();
        settings.inquiry.endpoint = Some("ftp://example.com".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut settings = Settings::default();
        settings.inquiry.timeout_ms = 10;
        assert!(settings.validate().is_err());
        settings.inquiry.timeout_ms = 2000;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\n\n[assistant]\ncurrency = \"USD\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "environment = \"staging\"\n\n[inquiry]\nendpoint = \"http://localhost:5000/api/inquiries\"\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.assistant.currency, "USD");
        assert_eq!(settings.environment, RuntimeEnvironment::Staging);
        assert_eq!(
            settings.inquiry.endpoint.as_deref(),
            Some("http://localhost:5000/api/inquiries")
        );
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("production.toml"),
            "environment = \"production\"\n\n[inquiry]\nendpoint = \"https://api.example.com/api/inquiries\"\ntimeout_ms = 50\n",
        )
        .unwrap();

        assert!(matches!(
            load_settings_from(dir.path(), Some("production")),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(dir.path(), None).unwrap();
        assert_eq!(settings.session.max_sessions, 1000);
    }
}
