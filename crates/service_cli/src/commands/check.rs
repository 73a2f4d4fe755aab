//! Check command implementation
//!
//! Prints the effective configuration and whether it validates.

use std::path::Path;

use tracing::{info, warn};

use crate::config::{AppConfig, ConfigError};
use crate::{CliError, Result};

/// Run the check command
pub fn run(config_path: &Path, config: &AppConfig) -> Result<()> {
    info!("Checking configuration...");
    if config_path.exists() {
        info!("  Config file: {}", config_path.display());
    } else {
        info!("  Config file: {} (not found, using defaults)", config_path.display());
    }

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(ConfigError::Parse(e.to_string())))?;
    println!("{}", rendered);

    match config.validate() {
        Ok(()) => {
            info!("Configuration is valid");
            Ok(())
        }
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                warn!("  {}", error);
            }
            Err(ConfigError::Validation(errors).into())
        }
        Err(other) => Err(other.into()),
    }
}
