//! Run command implementation
//!
//! Extraction and surface assembly in one pass, written to the output
//! directory.

use std::path::Path;

use chrono::{DateTime, Utc};
use implied_density::ExtractionDocument;
use tracing::info;

use crate::config::AppConfig;
use crate::loader::{self, InputFormat};
use crate::Result;

/// File name of the extraction document
pub const EXTRACTION_FILE: &str = "implied_probabilities.json";

/// File name of the surface document
pub const SURFACE_FILE: &str = "probability_surface.json";

/// Run the full pipeline
pub fn run(
    config: &AppConfig,
    input: &Path,
    format: InputFormat,
    as_of: Option<DateTime<Utc>>,
    output_dir: &Path,
) -> Result<()> {
    info!("Starting pipeline...");
    info!("  Input: {}", input.display());
    info!("  Output directory: {}", output_dir.display());
    info!("  Currencies: {}", config.currencies.join(", "));

    let (as_of, extractions) = super::extract::extract_snapshot(config, input, format, as_of)?;
    let extraction_doc = ExtractionDocument::new(as_of, &config.density, &extractions);
    loader::write_json(&output_dir.join(EXTRACTION_FILE), &extraction_doc)?;

    let surface_doc =
        super::surface::surface_document(config, as_of, config.density.method, &extractions);
    loader::write_json(&output_dir.join(SURFACE_FILE), &surface_doc)?;

    info!(
        "Pipeline complete: {} failures recorded",
        extraction_doc.failures.len() + surface_doc.failures.len()
    );
    Ok(())
}
