//! Server configuration module.
//!
//! Parses configuration from environment variables for the relay server.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `RELAY_SECRET_TOKEN` | Yes | - | Shared secret clients authenticate with |
//! | `HOST` | No | 0.0.0.0 | Bind address |
//! | `PORT` | No | 8080 | Bind port |
//! | `RELAY_MAX_MESSAGE_LENGTH` | No | 500 | Maximum chat text length (chars) |
//! | `RELAY_MAX_CONNECTIONS` | No | 100 | Advertised connection bound (diagnostics only) |
//! | `RELAY_RATE_LIMIT_PER_MINUTE` | No | 60 | Configured rate limit value (not enforced) |
//! | `RELAY_LOG_FORMAT` | No | json | Log output format: `json` or `pretty` |

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::auth::MIN_TOKEN_LENGTH;

/// Default bind address.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
const DEFAULT_PORT: u16 = 8080;

/// Default maximum chat text length, in characters.
const DEFAULT_MAX_MESSAGE_LENGTH: usize = 500;

/// Default advertised connection bound.
const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Default configured rate limit. The value is carried for diagnostics; no
/// enforcement logic exists in the relay core.
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// The placeholder secret shipped in the example environment file.
const PLACEHOLDER_SECRET: &str = "your_secure_token_here";

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has invalid format.
    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: String, message: String },

    /// Configuration validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Structured JSON output, one event per line.
    #[default]
    Json,

    /// Human-readable output for local development.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("expected 'json' or 'pretty', got '{other}'")),
        }
    }
}

/// Server configuration parsed from environment variables.
///
/// Read-only after startup; shared across sessions without synchronization.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Shared secret clients must present to connect.
    pub secret_token: String,

    /// Maximum accepted chat text length, in characters.
    pub max_message_length: usize,

    /// Advertised connection bound. Surfaced in diagnostics; the relay core
    /// does not reject connections past it.
    pub max_connections: usize,

    /// Configured rate limit value. No enforcement logic consumes it.
    pub rate_limit_per_minute: u32,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `RELAY_SECRET_TOKEN` is missing, empty, still the shipped
    ///   placeholder, or shorter than eight characters
    /// - A numeric variable fails to parse
    /// - `RELAY_LOG_FORMAT` is neither `json` nor `pretty`
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_token = match env::var("RELAY_SECRET_TOKEN") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                return Err(ConfigError::MissingEnvVar("RELAY_SECRET_TOKEN".to_string()));
            }
        };

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_env_number("PORT", DEFAULT_PORT)?,
            secret_token,
            max_message_length: parse_env_number(
                "RELAY_MAX_MESSAGE_LENGTH",
                DEFAULT_MAX_MESSAGE_LENGTH,
            )?,
            max_connections: parse_env_number("RELAY_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            rate_limit_per_minute: parse_env_number(
                "RELAY_RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            )?,
            log_format: parse_log_format()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// A weak or placeholder secret is fatal at startup, before the server
    /// accepts any connection.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_token == PLACEHOLDER_SECRET {
            return Err(ConfigError::ValidationError(
                "RELAY_SECRET_TOKEN is still the placeholder value; generate a real secret"
                    .to_string(),
            ));
        }

        if self.secret_token.len() < MIN_TOKEN_LENGTH {
            return Err(ConfigError::ValidationError(format!(
                "RELAY_SECRET_TOKEN must be at least {MIN_TOKEN_LENGTH} characters long"
            )));
        }

        Ok(())
    }

    /// The `host:port` address the server binds to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a numeric environment variable, falling back to a default when the
/// variable is not set.
fn parse_env_number<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|err| ConfigError::InvalidFormat {
            var: name.to_string(),
            message: format!("{err}"),
        }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: name.to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}

/// Parse the RELAY_LOG_FORMAT environment variable.
fn parse_log_format() -> Result<LogFormat, ConfigError> {
    match env::var("RELAY_LOG_FORMAT") {
        Ok(raw) => raw.parse().map_err(|message| ConfigError::InvalidFormat {
            var: "RELAY_LOG_FORMAT".to_string(),
            message,
        }),
        Err(_) => Ok(LogFormat::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const TEST_SECRET: &str = "a-perfectly-good-secret";

    /// Helper to temporarily set environment variables for testing.
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::set_var(key, value);
        }

        fn remove(&mut self, key: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::remove_var(key);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    /// Clears every relay variable so each test starts from defaults.
    fn clean_env(guard: &mut EnvGuard) {
        guard.remove("RELAY_SECRET_TOKEN");
        guard.remove("HOST");
        guard.remove("PORT");
        guard.remove("RELAY_MAX_MESSAGE_LENGTH");
        guard.remove("RELAY_MAX_CONNECTIONS");
        guard.remove("RELAY_RATE_LIMIT_PER_MINUTE");
        guard.remove("RELAY_LOG_FORMAT");
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", TEST_SECRET);

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.secret_token, TEST_SECRET);
        assert_eq!(config.max_message_length, DEFAULT_MAX_MESSAGE_LENGTH);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.rate_limit_per_minute, DEFAULT_RATE_LIMIT_PER_MINUTE);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    #[serial]
    fn test_config_with_overrides() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", TEST_SECRET);
        guard.set("HOST", "127.0.0.1");
        guard.set("PORT", "9090");
        guard.set("RELAY_MAX_MESSAGE_LENGTH", "200");
        guard.set("RELAY_MAX_CONNECTIONS", "25");
        guard.set("RELAY_RATE_LIMIT_PER_MINUTE", "120");
        guard.set("RELAY_LOG_FORMAT", "pretty");

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.max_message_length, 200);
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.rate_limit_per_minute, 120);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    #[serial]
    fn test_config_missing_secret() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);

        let result = Config::from_env();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "RELAY_SECRET_TOKEN"));
    }

    #[test]
    #[serial]
    fn test_config_empty_secret() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", "");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(ref v)) if v == "RELAY_SECRET_TOKEN"
        ));
    }

    #[test]
    #[serial]
    fn test_config_placeholder_secret() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", PLACEHOLDER_SECRET);

        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    #[serial]
    fn test_config_short_secret() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", "short");

        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    #[serial]
    fn test_config_invalid_port() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", TEST_SECRET);
        guard.set("PORT", "not-a-number");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFormat { ref var, .. }) if var == "PORT"
        ));
    }

    #[test]
    #[serial]
    fn test_config_port_out_of_range() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", TEST_SECRET);
        guard.set("PORT", "99999");

        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_invalid_max_message_length() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", TEST_SECRET);
        guard.set("RELAY_MAX_MESSAGE_LENGTH", "lots");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFormat { ref var, .. }) if var == "RELAY_MAX_MESSAGE_LENGTH"
        ));
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_format() {
        let mut guard = EnvGuard::new();
        clean_env(&mut guard);
        guard.set("RELAY_SECRET_TOKEN", TEST_SECRET);
        guard.set("RELAY_LOG_FORMAT", "xml");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFormat { ref var, .. }) if var == "RELAY_LOG_FORMAT"
        ));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("verbose".parse::<LogFormat>().is_err());
    }
}
