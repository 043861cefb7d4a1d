//! Configuration for the task-list store.
//!
//! Every setting has a default and may be overridden from the environment:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `TASKS_MAX_RETRIES` | 3 | Retries of a transiently failing service call |
//! | `TASKS_RETRY_INITIAL_MS` | 100 | Delay before the first retry, in milliseconds |
//! | `TASKS_BROADCAST_CAPACITY` | 16 | Capacity of the derived-action broadcast |
//! | `TASKS_PAGE_SIZE` | 20 | Page size of the in-memory task service |

use std::time::Duration;
use tasklist_runtime::StoreConfig;
use tasklist_runtime::retry::RetryPolicy;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Failed to parse {key}={value:?}: {reason}")]
    ParseError {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Settings for building a task store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksConfig {
    /// Retries of a transiently failing service call
    pub max_retries: usize,
    /// Delay before the first retry
    pub retry_initial_delay: Duration,
    /// Capacity of the derived-action broadcast
    pub broadcast_capacity: usize,
    /// Page size of the in-memory task service
    pub page_size: usize,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_initial_delay: Duration::from_millis(100),
            broadcast_capacity: 16,
            page_size: 20,
        }
    }
}

impl TasksConfig {
    /// Load configuration from environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn load<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::load_or(lookup, Self::default())
    }

    /// Load configuration from environment on top of caller-chosen defaults
    ///
    /// Variables that are set still win over `defaults`.
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_env_or(defaults: Self) -> Result<Self, ConfigError> {
        Self::load_or(|key| std::env::var(key).ok(), defaults)
    }

    /// Load configuration from a variable source on top of `defaults`
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn load_or<F>(lookup: F, defaults: Self) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {

        let config = Self {
            max_retries: parse(&lookup, "TASKS_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            retry_initial_delay: parse(&lookup, "TASKS_RETRY_INITIAL_MS")?
                .map_or(defaults.retry_initial_delay, Duration::from_millis),
            broadcast_capacity: parse(&lookup, "TASKS_BROADCAST_CAPACITY")?
                .unwrap_or(defaults.broadcast_capacity),
            page_size: parse(&lookup, "TASKS_PAGE_SIZE")?.unwrap_or(defaults.page_size),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if the broadcast capacity or page size is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "broadcast_capacity must be greater than 0".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy for task-service calls
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.max_retries)
            .initial_delay(self.retry_initial_delay)
            .build()
    }

    /// Store runtime configuration
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_broadcast_capacity(self.broadcast_capacity)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|err: T::Err| ConfigError::ParseError {
            key,
            value,
            reason: err.to_string(),
        })
}
