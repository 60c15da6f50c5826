// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

//! Environment-based configuration management for production deployment

use crate::constants::{cache, scraping};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type for deployment-specific behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Inference endpoint credentials and overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Hugging Face API token. Required by the classifier client; its absence
    /// is a configuration error raised at client construction, before any
    /// network call.
    pub hf_token: Option<String>,
}

/// Generative engine credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// OpenRouter API key. Required by the requirement synthesizer.
    pub openrouter_api_key: Option<String>,
}

/// Review source defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Review language for the store feed
    pub lang: String,
    /// Review country for the store feed
    pub country: String,
}

/// Cache tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Redis connection URL; absence selects the in-memory backend
    pub redis_url: Option<String>,
    /// Maximum entries for the in-memory backend
    pub max_entries: usize,
    /// Cleanup interval for expired entries, in seconds
    pub cleanup_interval_secs: u64,
}

/// Top-level server configuration, loaded from environment variables only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Allowed CORS origins for the frontend
    pub cors_origins: Vec<String>,
    /// Inference endpoint settings
    pub inference: InferenceConfig,
    /// Generative engine settings
    pub generator: GeneratorConfig,
    /// Review source settings
    pub scraper: ScraperConfig,
    /// Cache settings
    pub cache: CacheSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Credentials are carried as `Option`s here; the service objects that
    /// need them fail fast at construction when they are absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric environment variable fails to parse
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            http_port: env_var_or("HTTP_PORT", "8000")?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            log_level: LogLevel::from_str_or_default(
                &env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            ),
            environment: Environment::from_str_or_default(
                &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            ),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_owned()).collect())
                .unwrap_or_else(|_| {
                    vec![
                        "http://localhost:4200".to_owned(),
                        "http://127.0.0.1:4200".to_owned(),
                    ]
                }),
            inference: InferenceConfig {
                hf_token: env::var("HF_TOKEN").ok(),
            },
            generator: GeneratorConfig {
                openrouter_api_key: env::var("OPENROUTER_API_KEY").ok(),
            },
            scraper: ScraperConfig {
                lang: env_var_or("SCRAPER_LANG", scraping::DEFAULT_LANG)?,
                country: env_var_or("SCRAPER_COUNTRY", scraping::DEFAULT_COUNTRY)?,
            },
            cache: CacheSettings {
                redis_url: env::var("REDIS_URL").ok(),
                max_entries: env_var_or(
                    "CACHE_MAX_ENTRIES",
                    &cache::DEFAULT_CACHE_MAX_ENTRIES.to_string(),
                )?
                .parse()
                .context("Invalid CACHE_MAX_ENTRIES value")?,
                cleanup_interval_secs: env_var_or(
                    "CACHE_CLEANUP_INTERVAL_SECS",
                    &cache::DEFAULT_CLEANUP_INTERVAL_SECS.to_string(),
                )?
                .parse()
                .context("Invalid CACHE_CLEANUP_INTERVAL_SECS value")?,
            },
        };

        info!(
            http_port = config.http_port,
            environment = ?config.environment,
            cache_backend = if config.cache.redis_url.is_some() { "redis" } else { "memory" },
            "Configuration loaded"
        );

        Ok(config)
    }
}

/// Read an environment variable with a default fallback
fn env_var_or(name: &str, default: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_owned()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("bogus"), LogLevel::Info);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("prod"),
            Environment::Production
        );
        assert!(Environment::from_str_or_default("production").is_production());
        assert_eq!(
            Environment::from_str_or_default(""),
            Environment::Development
        );
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        std::env::remove_var("HTTP_PORT");
        std::env::remove_var("CORS_ORIGINS");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.scraper.lang, "es");
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("HTTP_PORT", "9100");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 9100);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_owned(), "https://b.example".to_owned()]
        );
        std::env::remove_var("HTTP_PORT");
        std::env::remove_var("CORS_ORIGINS");
    }
}
