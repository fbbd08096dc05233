//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const ENV_PREFIX: &str = "PLAYDEX";

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DEFAULT_LOCALE: &str = "en";
const DEFAULT_PAGE_SIZE: u32 = 24;
const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

const DEFAULT_CACHE_CAPACITY: usize = 1024;
const DEFAULT_TTL_SHORT_SECS: u64 = 60;
const DEFAULT_TTL_MEDIUM_SECS: u64 = 300;
const DEFAULT_TTL_STATS_SECS: u64 = 1_800;
const DEFAULT_TTL_LONG_SECS: u64 = 3_600;
const DEFAULT_TTL_BASE_DATA_SECS: u64 = 21_600;
const DEFAULT_TTL_VERY_LONG_SECS: u64 = 86_400;
const DEFAULT_COMPUTE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub catalog: CatalogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            logging: LoggingSettings::default(),
            cache: CacheSettings::default(),
            catalog: CatalogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Postgres connection URL.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default tracing directive, overridable via `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Cache tunables. TTL tiers and the tag set are the only cache knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Maximum cached entries before LRU eviction.
    pub capacity: usize,
    pub ttl_short_secs: u64,
    pub ttl_medium_secs: u64,
    pub ttl_stats_secs: u64,
    pub ttl_long_secs: u64,
    pub ttl_base_data_secs: u64,
    pub ttl_very_long_secs: u64,
    pub compute_timeout_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_short_secs: DEFAULT_TTL_SHORT_SECS,
            ttl_medium_secs: DEFAULT_TTL_MEDIUM_SECS,
            ttl_stats_secs: DEFAULT_TTL_STATS_SECS,
            ttl_long_secs: DEFAULT_TTL_LONG_SECS,
            ttl_base_data_secs: DEFAULT_TTL_BASE_DATA_SECS,
            ttl_very_long_secs: DEFAULT_TTL_VERY_LONG_SECS,
            compute_timeout_secs: DEFAULT_COMPUTE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Base locale used for fallback resolution.
    pub default_locale: String,
    /// Default listing page size.
    pub page_size: u32,
    /// Upper bound on caller-supplied page sizes.
    pub max_page_size: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_DEFAULT_LOCALE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl Settings {
    /// Load settings from the default file (if present), an optional explicit
    /// file, and `PLAYDEX_*` environment variables, in increasing precedence.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }

        let raw = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let settings: Settings = raw.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.default_locale.trim().is_empty() {
            return Err(ConfigError::invalid("catalog.default_locale is empty"));
        }
        if self.catalog.page_size == 0 {
            return Err(ConfigError::invalid("catalog.page_size must be positive"));
        }
        if self.catalog.max_page_size < self.catalog.page_size {
            return Err(ConfigError::invalid(
                "catalog.max_page_size is below catalog.page_size",
            ));
        }
        Ok(())
    }
}
