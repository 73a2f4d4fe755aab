//! Extract command implementation
//!
//! Turns a market snapshot into per-expiry implied distributions.

use std::path::Path;

use chrono::{DateTime, Utc};
use implied_density::{CurrencyExtraction, DensityPipeline, ExtractionDocument};
use tracing::info;

use crate::config::AppConfig;
use crate::loader::{self, InputFormat};
use crate::Result;

/// Load, filter and extract a snapshot.
pub(crate) fn extract_snapshot(
    config: &AppConfig,
    input: &Path,
    format: InputFormat,
    as_of: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, Vec<CurrencyExtraction>)> {
    let mut snapshot = loader::load_snapshot(input, format, as_of)?;
    loader::filter_currencies(&mut snapshot, &config.currencies);

    let pipeline = DensityPipeline::new(config.density.clone());
    let extractions = pipeline.process_snapshot(&snapshot);
    super::log_extractions(&extractions);
    Ok((snapshot.as_of, extractions))
}

/// Run the extract command
pub fn run(
    config: &AppConfig,
    input: &Path,
    format: InputFormat,
    as_of: Option<DateTime<Utc>>,
    output: &Path,
) -> Result<()> {
    info!("Starting extraction...");
    info!("  Input: {}", input.display());
    info!("  Method: {}", config.density.method);
    info!("  Horizon: {} days", config.density.max_days);

    let (as_of, extractions) = extract_snapshot(config, input, format, as_of)?;
    let document = ExtractionDocument::new(as_of, &config.density, &extractions);
    loader::write_json(output, &document)?;

    info!("Extraction complete");
    Ok(())
}
