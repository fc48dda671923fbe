//! Tunables stored in `.cb-cli/config.json`

use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use super::ConfigPaths;
use crate::error::{CliError, CliResult};

pub const TIMEOUT_ENV: &str = "CB_CLI_TIMEOUT_SECS";
pub const PAGE_SIZE_ENV: &str = "CB_CLI_IMPORT_PAGE_SIZE";

/// Backoff settings for collection item import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_interval_ms: 500,
            max_interval_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

/// CLI configuration; every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeout_secs: u64,
    pub import_page_size: usize,
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            import_page_size: 100,
            retry: RetrySettings::default(),
        }
    }
}

impl Config {
    /// Load from disk (defaults when absent) and apply environment overrides.
    pub fn load(paths: &ConfigPaths) -> CliResult<Self> {
        let mut config = if paths.config_file.exists() {
            let contents = fs::read_to_string(&paths.config_file)?;
            serde_json::from_str(&contents).map_err(|e| {
                CliError::Config(format!(
                    "Invalid {}: {e}",
                    paths.config_file.display()
                ))
            })?
        } else {
            Config::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn save(&self, paths: &ConfigPaths) -> CliResult<()> {
        paths.ensure_state_dir()?;
        fs::write(&paths.config_file, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = parse_positive(TIMEOUT_ENV, &value)?;
        }
        if let Some(value) = lookup(PAGE_SIZE_ENV) {
            self.import_page_size = parse_positive(PAGE_SIZE_ENV, &value)? as usize;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_positive(key: &str, value: &str) -> CliResult<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CliError::Config(format!(
            "{key} must be a positive integer, got '{value}'"
        ))),
    }
}
