//! CLI configuration management.
//!
//! Configuration is read from a TOML file, then overridden from `IMPLIED_*`
//! environment variables, then validated as a whole.
//!
//! ```toml
//! currencies = ["BTC", "ETH"]
//! log_level = "info"
//! output_dir = "data"
//!
//! [density]
//! method = "finite-diff"
//! max_days = 90.0
//!
//! [surface]
//! price_points = 100
//! price_padding = 0.05
//! ```

use std::path::{Path, PathBuf};

use implied_density::{DensityConfig, SurfaceConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Currencies to process, in upper case
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,

    /// Log level used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory the `run` command writes to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Extraction settings
    #[serde(default)]
    pub density: DensityConfig,

    /// Surface settings
    #[serde(default)]
    pub surface: SurfaceConfig,
}

fn default_currencies() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currencies: default_currencies(),
            log_level: default_log_level(),
            output_dir: default_output_dir(),
            density: DensityConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from `path`, or defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(currencies) = lookup("IMPLIED_CURRENCIES") {
            self.currencies = currencies
                .split(',')
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect();
        }

        if let Some(method) = lookup("IMPLIED_METHOD") {
            self.density.method = method
                .parse()
                .map_err(|e| ConfigError::Parse(format!("IMPLIED_METHOD: {}", e)))?;
        }

        if let Some(max_days) = lookup("IMPLIED_MAX_DAYS") {
            self.density.max_days = max_days
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse(format!("IMPLIED_MAX_DAYS: '{}' is not a number", max_days)))?;
        }

        if let Some(points) = lookup("IMPLIED_PRICE_POINTS") {
            self.surface.price_points = points.trim().parse().map_err(|_| {
                ConfigError::Parse(format!("IMPLIED_PRICE_POINTS: '{}' is not a count", points))
            })?;
        }

        if let Some(log_level) = lookup("IMPLIED_LOG_LEVEL") {
            self.log_level = log_level;
        }

        Ok(self)
    }

    /// Validate the configuration, collecting every violation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, valid_log_levels
            ));
        }

        if self.currencies.is_empty() {
            errors.push("currencies cannot be empty".to_string());
        }
        if let Some(bad) = self
            .currencies
            .iter()
            .find(|c| c.is_empty() || !c.chars().all(|ch| ch.is_ascii_alphanumeric()))
        {
            errors.push(format!("Invalid currency code '{}'", bad));
        }

        if self.output_dir.as_os_str().is_empty() {
            errors.push("output_dir cannot be empty".to_string());
        }

        errors.extend(self.density.validation_errors().into_iter().map(|e| format!("density.{}", e)));
        errors.extend(self.surface.validation_errors().into_iter().map(|e| format!("surface.{}", e)));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from file (or defaults) with environment overrides and validate
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_or_default(path)?.with_env_override()?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration error type
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error in config file or override
    #[error("Parse error: {0}")]
    Parse(String),
    /// Validation error
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
