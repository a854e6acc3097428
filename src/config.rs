//! Service configuration.
//!
//! Settings come from `TASKLEDGER_*` environment variables or from a JSON
//! document. Every setting has a default except the database URL, which is
//! only needed by the `PostgreSQL` composition.

use crate::tracker::services::PipelineConfig;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment key for the `PostgreSQL` connection URL.
pub const DATABASE_URL_KEY: &str = "TASKLEDGER_DATABASE_URL";
/// Environment key for the connection pool size.
pub const POOL_MAX_SIZE_KEY: &str = "TASKLEDGER_POOL_MAX_SIZE";
/// Environment key for the audit write timeout in milliseconds.
pub const AUDIT_TIMEOUT_MS_KEY: &str = "TASKLEDGER_AUDIT_TIMEOUT_MS";
/// Environment key toggling History rows for task updates.
pub const RECORD_HISTORY_KEY: &str = "TASKLEDGER_RECORD_HISTORY";
/// Environment key for the default list page size.
pub const PAGE_SIZE_KEY: &str = "TASKLEDGER_PAGE_SIZE";
/// Environment key for the largest list page size.
pub const MAX_PAGE_SIZE_KEY: &str = "TASKLEDGER_MAX_PAGE_SIZE";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting could not be parsed or is out of range.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// Raw value supplied.
        value: String,
    },

    /// The `PostgreSQL` composition was requested without a database URL.
    #[error("{DATABASE_URL_KEY} is not set")]
    MissingDatabaseUrl,

    /// The JSON document could not be decoded.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for a taskledger service instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: u32,
    /// Upper bound on one audit write, in milliseconds.
    pub audit_timeout_ms: u64,
    /// Operation pipeline tunables.
    pub pipeline: PipelineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_max_size: 10,
            audit_timeout_ms: 2_000,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to a
    /// value that does not parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, falling back to defaults for
    /// unset keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a value does not parse or
    /// is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskledger::config::ServiceConfig;
    ///
    /// let config = ServiceConfig::from_lookup(|key| match key {
    ///     "TASKLEDGER_PAGE_SIZE" => Some("50".to_owned()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.pipeline.default_page_size, 50);
    /// assert!(config.pipeline.record_task_history);
    /// ```
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            database_url: lookup(DATABASE_URL_KEY).filter(|url| !url.trim().is_empty()),
            pool_max_size: parsed(&lookup, POOL_MAX_SIZE_KEY)?.unwrap_or(defaults.pool_max_size),
            audit_timeout_ms: parsed(&lookup, AUDIT_TIMEOUT_MS_KEY)?
                .unwrap_or(defaults.audit_timeout_ms),
            pipeline: PipelineConfig {
                record_task_history: flag(&lookup, RECORD_HISTORY_KEY)?
                    .unwrap_or(defaults.pipeline.record_task_history),
                default_page_size: parsed(&lookup, PAGE_SIZE_KEY)?
                    .unwrap_or(defaults.pipeline.default_page_size),
                max_page_size: parsed(&lookup, MAX_PAGE_SIZE_KEY)?
                    .unwrap_or(defaults.pipeline.max_page_size),
            },
        };
        config.validated()
    }

    /// Decodes settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed documents and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validated()
    }

    /// Returns the audit write timeout.
    #[must_use]
    pub const fn audit_write_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_timeout_ms)
    }

    /// Returns the database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when none is configured.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.pool_max_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: POOL_MAX_SIZE_KEY,
                value: self.pool_max_size.to_string(),
            });
        }
        if self.pipeline.max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: MAX_PAGE_SIZE_KEY,
                value: self.pipeline.max_page_size.to_string(),
            });
        }
        if self.pipeline.default_page_size == 0
            || self.pipeline.default_page_size > self.pipeline.max_page_size
        {
            return Err(ConfigError::InvalidValue {
                key: PAGE_SIZE_KEY,
                value: self.pipeline.default_page_size.to_string(),
            });
        }
        Ok(self)
    }
}

fn parsed<L, T>(lookup: &L, key: &'static str) -> Result<Option<T>, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value: raw })
        })
        .transpose()
}

fn flag<L>(lookup: &L, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        })
        .transpose()
}
