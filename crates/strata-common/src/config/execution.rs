//! Execution configuration.
//!
//! Controls the worker budget used by the capacity governor, the
//! partitioning threshold, cancellation polling and record pooling.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CANCELLATION_POLL_INTERVAL, DEFAULT_MIN_RECORDS_PER_CORE, DEFAULT_RECORD_POOL_LIMIT,
};
use crate::error::{StrataError, StrataResult};

/// Execution configuration.
///
/// # Example
///
/// ```rust
/// use strata_common::config::ExecutionConfig;
///
/// let config = ExecutionConfig::default();
/// assert_eq!(config.min_records_per_core, 80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Number of cores the process may use for parallel partitions.
    #[serde(default = "default_cpu")]
    pub cpu: usize,

    /// Minimum number of records a worker should receive before another
    /// worker is added.
    #[serde(default = "default_min_records_per_core")]
    pub min_records_per_core: usize,

    /// Number of rows a partition processes between cancellation checks.
    #[serde(default = "default_poll_interval")]
    pub cancellation_poll_interval: usize,

    /// Maximum number of idle buffers a record pool keeps per width.
    #[serde(default = "default_record_pool_limit")]
    pub record_pool_limit: usize,

    /// Optional deadline applied to each operation, in milliseconds.
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
}

fn default_cpu() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

fn default_min_records_per_core() -> usize {
    DEFAULT_MIN_RECORDS_PER_CORE
}

fn default_poll_interval() -> usize {
    DEFAULT_CANCELLATION_POLL_INTERVAL
}

fn default_record_pool_limit() -> usize {
    DEFAULT_RECORD_POOL_LIMIT
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            min_records_per_core: default_min_records_per_core(),
            cancellation_poll_interval: default_poll_interval(),
            record_pool_limit: default_record_pool_limit(),
            query_timeout_ms: None,
        }
    }
}

impl ExecutionConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-core configuration, useful for deterministic tests.
    #[must_use]
    pub fn single_core() -> Self {
        Self {
            cpu: 1,
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StrataResult<()> {
        if self.cpu == 0 {
            return Err(StrataError::invalid_argument("cpu must be at least 1"));
        }
        if self.min_records_per_core == 0 {
            return Err(StrataError::invalid_argument(
                "min_records_per_core must be at least 1",
            ));
        }
        if self.cancellation_poll_interval == 0 {
            return Err(StrataError::invalid_argument(
                "cancellation_poll_interval must be at least 1",
            ));
        }
        Ok(())
    }

    /// Creates a builder for configuration.
    pub fn builder() -> ExecutionConfigBuilder {
        ExecutionConfigBuilder::new()
    }
}

/// Builder for execution configuration.
#[derive(Default)]
pub struct ExecutionConfigBuilder {
    config: ExecutionConfig,
}

impl ExecutionConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the core budget.
    pub fn cpu(mut self, cpu: usize) -> Self {
        self.config.cpu = cpu;
        self
    }

    /// Sets the minimum records per core.
    pub fn min_records_per_core(mut self, min: usize) -> Self {
        self.config.min_records_per_core = min;
        self
    }

    /// Sets the cancellation poll interval.
    pub fn cancellation_poll_interval(mut self, rows: usize) -> Self {
        self.config.cancellation_poll_interval = rows;
        self
    }

    /// Sets the record pool limit.
    pub fn record_pool_limit(mut self, limit: usize) -> Self {
        self.config.record_pool_limit = limit;
        self
    }

    /// Sets the per-operation timeout.
    pub fn query_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.query_timeout_ms = Some(timeout_ms);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ExecutionConfig {
        self.config
    }
}
