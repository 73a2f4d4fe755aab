//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod check;
pub mod extract;
pub mod run;
pub mod surface;

use chrono::{DateTime, NaiveDate, Utc};
use implied_density::{CurrencyExtraction, CurrencyFailure, CurrencySurfaces};
use tracing::{info, warn};

use crate::{CliError, Result};

/// Parse a valuation time given as RFC 3339 or as a bare `YYYY-MM-DD` date
/// (midnight UTC).
pub fn parse_as_of(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            CliError::invalid_argument(format!(
                "Invalid valuation time '{}'. Expected RFC 3339 or YYYY-MM-DD",
                value
            ))
        })
}

pub(crate) fn log_extractions(extractions: &[CurrencyExtraction]) {
    for extraction in extractions {
        info!(
            "  {}: {} expiries extracted, {} failed, {} beyond horizon",
            extraction.currency,
            extraction.expiries.len(),
            extraction.failures.len(),
            extraction.skipped.len()
        );
    }
}

pub(crate) fn log_surfaces(results: &[std::result::Result<CurrencySurfaces, CurrencyFailure>]) {
    for result in results {
        match result {
            Ok(surfaces) => {
                for (kind, surface) in &surfaces.surfaces {
                    let (prices, times) = surface.grid.shape();
                    info!(
                        "  {} {}: {} prices x {} expiries, {} omitted",
                        surfaces.currency,
                        kind.label(),
                        prices,
                        times,
                        surface.omitted.len()
                    );
                }
            }
            Err(failure) => warn!("  {}: no surface ({})", failure.currency, failure.error),
        }
    }
}
