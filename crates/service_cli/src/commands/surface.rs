//! Surface command implementation
//!
//! Assembles probability surfaces from a saved extraction document.

use std::path::Path;

use chrono::{DateTime, Utc};
use implied_density::{
    CurrencyExtraction, CurrencyFailure, CurrencySurfaces, DensityPipeline, DifferentiationMethod,
    SurfaceDocument,
};
use tracing::info;

use crate::config::AppConfig;
use crate::loader;
use crate::Result;

/// Build surfaces for every extraction and shape them into a document.
pub(crate) fn surface_document(
    config: &AppConfig,
    as_of: DateTime<Utc>,
    method: DifferentiationMethod,
    extractions: &[CurrencyExtraction],
) -> SurfaceDocument {
    let pipeline = DensityPipeline::new(config.density.clone());
    let results: Vec<std::result::Result<CurrencySurfaces, CurrencyFailure>> =
        pipeline.build_all_surfaces(extractions, &config.surface);
    super::log_surfaces(&results);
    SurfaceDocument::new(as_of, method, &results)
}

/// Run the surface command
pub fn run(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    info!("Starting surface assembly...");
    info!("  Extraction: {}", input.display());
    info!("  Price points: {}", config.surface.price_points);

    let document = loader::load_extraction(input)?;
    let mut extractions = document.to_extractions(&config.density);
    extractions.retain(|e| {
        config
            .currencies
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&e.currency))
    });
    for extraction in &extractions {
        for failure in &extraction.failures {
            info!("  {}: dropped from saved extraction", failure);
        }
    }

    let surfaces = surface_document(config, document.timestamp, document.method, &extractions);
    loader::write_json(output, &surfaces)?;

    info!("Surface assembly complete");
    Ok(())
}
