//! # implied_density: Risk-Neutral Densities and Probability Surfaces
//!
//! ## Layer 2 (Density) Role
//!
//! implied_density turns option chains into market-implied probability
//! distributions via the Breeden-Litzenberger identity, and stacks them into
//! price × time surfaces:
//! - Raw densities per side from the curve's second derivative (`extractor`)
//! - Normalisation and call/put merging (`normaliser`)
//! - Moments, mode and spot-relative probabilities (`statistics`)
//! - Uniform resampling for charts (`visualisation`)
//! - Multi-expiry surfaces with quantiles (`surface`)
//! - Per-expiry outcomes with isolated failures, parallel across currencies (`pipeline`)
//! - JSON payloads for persistence and re-loading (`output`)
//!
//! The crate performs no I/O and reads no clock: valuation instants and
//! thresholds are always passed in.
//!
//! ## Usage Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use implied_core::types::OptionQuote;
//! use implied_density::{DensityConfig, DensityPipeline, ExpiryChain, MarketSnapshot, SurfaceConfig};
//!
//! let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
//! let quotes = |prices: [f64; 5]| -> Vec<OptionQuote> {
//!     [80.0, 90.0, 100.0, 110.0, 120.0]
//!         .iter()
//!         .zip(prices)
//!         .map(|(&k, p)| OptionQuote::new(k, p, 0.6))
//!         .collect()
//! };
//!
//! let mut chain = ExpiryChain::new("31JAN25", 100.0);
//! chain.calls = quotes([21.0, 12.5, 6.0, 2.5, 1.0]);
//! chain.puts = quotes([1.0, 2.5, 6.0, 12.5, 21.0]);
//!
//! let snapshot = MarketSnapshot {
//!     as_of,
//!     currencies: [("BTC".to_string(), vec![chain])].into_iter().collect(),
//! };
//!
//! let pipeline = DensityPipeline::new(DensityConfig::default());
//! let extractions = pipeline.process_snapshot(&snapshot);
//! let surfaces = pipeline.build_surfaces(&extractions[0], &SurfaceConfig::default()).unwrap();
//! assert_eq!(surfaces.surfaces.len(), 3);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod config;
pub mod distribution;
pub mod extractor;
pub mod normaliser;
pub mod output;
mod parallel;
pub mod pipeline;
pub mod statistics;
pub mod surface;
pub mod visualisation;

pub use config::{DensityConfig, DifferentiationMethod, SurfaceConfig};
pub use distribution::{DensityPoint, Distribution};
pub use extractor::DensityExtractor;
pub use normaliser::DistributionNormaliser;
pub use output::{
    ColumnStatisticsPayload, CurrencySurfacePayload, ExpiryPayload, ExtractionDocument,
    FailureRecord, GridPayload, SurfaceDocument, SurfaceMetadata, SurfacePayload,
    SurfaceStatisticsPayload,
};
pub use pipeline::{
    CurrencyExtraction, CurrencyFailure, CurrencySurfaces, DensityPipeline, ExpiryChain,
    ExpiryDistributions, ExpiryFailure, ExpiryOutcome, MarketSnapshot, SurfaceKind,
};
pub use statistics::{summarise, summarise_weights, Statistics};
pub use visualisation::{visualisation_density, VisualisationDensity};
