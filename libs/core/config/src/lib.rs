//! Shared configuration helpers for the notifier services.
//!
//! Everything here is loaded from environment variables. Services compose
//! these pieces into their own config struct and implement [`FromEnv`] for it.

pub mod nats;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment (dev = local/kind, prod = full k8s)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Load an environment variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Load an environment variable or return [`ConfigError::MissingEnvVar`]
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Load and parse an environment variable, using `default` when unset.
///
/// A value that is set but does not parse is an error rather than a silent
/// fallback.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Load an optional environment variable, treating an empty value as unset
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("NOTIFIER_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("NOTIFIER_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("NOTIFIER_TEST_VAR", || {
            assert_eq!(env_or_default("NOTIFIER_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("NOTIFIER_REQUIRED", || {
            let err = env_required("NOTIFIER_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("NOTIFIER_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_parse_default_and_value() {
        temp_env::with_var_unset("NOTIFIER_PORT", || {
            assert_eq!(env_parse("NOTIFIER_PORT", 9464u16).unwrap(), 9464);
        });
        temp_env::with_var("NOTIFIER_PORT", Some(" 8080 "), || {
            assert_eq!(env_parse("NOTIFIER_PORT", 9464u16).unwrap(), 8080);
        });
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        temp_env::with_var("NOTIFIER_PORT", Some("not-a-port"), || {
            let err = env_parse("NOTIFIER_PORT", 9464u16).unwrap_err();
            assert!(
                matches!(err, ConfigError::ParseError { ref key, .. } if key == "NOTIFIER_PORT")
            );
        });
    }

    #[test]
    fn test_env_optional_ignores_blank() {
        temp_env::with_var("NOTIFIER_GROUP", Some("  "), || {
            assert_eq!(env_optional("NOTIFIER_GROUP"), None);
        });
        temp_env::with_var("NOTIFIER_GROUP", Some("notifiers"), || {
            assert_eq!(env_optional("NOTIFIER_GROUP").as_deref(), Some("notifiers"));
        });
    }
}
