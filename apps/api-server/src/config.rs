//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use axum::http::HeaderValue;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Storage backend provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on restart)
    Memory,
    /// DynamoDB tables named by `Tables::from_lookup`
    Dynamo,
}

impl StorageProvider {
    fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("memory") {
            Some(Self::Memory)
        } else if s.eq_ignore_ascii_case("dynamo") {
            Some(Self::Dynamo)
        } else {
            None
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),
    #[error("STORAGE_PROVIDER must be memory or dynamo, got {0:?}")]
    UnknownStorage(String),
    #[error("STORAGE_PROVIDER=dynamo requires building with the `dynamo` feature")]
    DynamoDisabled,
    #[error("CORS_ALLOW_ORIGIN is not a valid header value: {0:?}")]
    InvalidCorsOrigin(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3001)
    pub port: u16,
    pub cors_allow_origin: HeaderValue,
    pub storage_provider: StorageProvider,
    pub log_format: LogFormat,
    /// JSON file replacing the default viewer and widgets
    pub fixtures_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidPort(p))?,
            None => 3001,
        };

        let storage = var("STORAGE_PROVIDER").unwrap_or_else(|| "memory".into());
        let storage_provider =
            StorageProvider::parse(&storage).ok_or(ConfigError::UnknownStorage(storage))?;
        if storage_provider == StorageProvider::Dynamo && !cfg!(feature = "dynamo") {
            return Err(ConfigError::DynamoDisabled);
        }

        let cors_origin = var("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".into());
        let cors_allow_origin = HeaderValue::from_str(&cors_origin)
            .map_err(|_| ConfigError::InvalidCorsOrigin(cors_origin.clone()))?;

        let log_format = LogFormat::from_str(&var("LOG_FORMAT").unwrap_or_default());
        let fixtures_path = var("FIXTURES_PATH").map(PathBuf::from);

        Ok(Self {
            port,
            cors_allow_origin,
            storage_provider,
            log_format,
            fixtures_path,
        })
    }

    pub fn cors_is_wildcard(&self) -> bool {
        self.cors_allow_origin == "*"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.storage_provider, StorageProvider::Memory);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(cfg.cors_is_wildcard());
        assert!(cfg.fixtures_path.is_none());
    }

    #[test]
    fn overrides() {
        let cfg = load(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("CORS_ALLOW_ORIGIN", "http://localhost:3000"),
            ("FIXTURES_PATH", "fixtures.json"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(!cfg.cors_is_wildcard());
        assert_eq!(cfg.fixtures_path, Some(PathBuf::from("fixtures.json")));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            load(&[("PORT", "http")]).unwrap_err(),
            ConfigError::InvalidPort("http".into())
        );
        assert_eq!(
            load(&[("STORAGE_PROVIDER", "sqlite")]).unwrap_err(),
            ConfigError::UnknownStorage("sqlite".into())
        );
        assert!(matches!(
            load(&[("CORS_ALLOW_ORIGIN", "bad\norigin")]),
            Err(ConfigError::InvalidCorsOrigin(_))
        ));
    }

    #[test]
    fn dynamo_follows_feature() {
        let res = load(&[("STORAGE_PROVIDER", "Dynamo")]);
        if cfg!(feature = "dynamo") {
            assert_eq!(res.unwrap().storage_provider, StorageProvider::Dynamo);
        } else {
            assert_eq!(res.unwrap_err(), ConfigError::DynamoDisabled);
        }
    }
}
