//! Serialisable payloads handed to persistence and the dashboard.
//!
//! Field names are consumed verbatim by external readers and must not change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use implied_core::types::{DateError, DensityError, ExpiryInfo};
use serde::{Deserialize, Serialize};

use crate::config::{DensityConfig, DifferentiationMethod};
use crate::distribution::{DensityPoint, Distribution};
use crate::normaliser::DistributionNormaliser;
use crate::pipeline::{
    CurrencyExtraction, CurrencyFailure, CurrencySurfaces, ExpiryDistributions, ExpiryFailure,
    SurfaceKind,
};
use crate::statistics::{summarise, Statistics};
use crate::surface::{ProbabilitySurface, QuantileSet};
use crate::visualisation::{visualisation_density, VisualisationDensity};

/// One failure as reported in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Currency code
    pub currency: String,
    /// Expiry label, absent for currency-wide failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    /// Side or surface kind, absent for whole-expiry failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    /// Error message
    pub error: String,
}

impl From<&ExpiryFailure> for FailureRecord {
    fn from(failure: &ExpiryFailure) -> Self {
        Self {
            currency: failure.currency.clone(),
            expiry: Some(failure.expiry.clone()),
            side: failure.side.map(|s| s.to_string()),
            error: failure.error.to_string(),
        }
    }
}

impl From<&CurrencyFailure> for FailureRecord {
    fn from(failure: &CurrencyFailure) -> Self {
        Self {
            currency: failure.currency.clone(),
            expiry: None,
            side: None,
            error: failure.error.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Distributions and statistics for one expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryPayload {
    /// Call-side distribution, empty when the side failed
    pub call_probabilities: Vec<DensityPoint>,
    /// Put-side distribution, empty when the side failed
    pub put_probabilities: Vec<DensityPoint>,
    /// Combined distribution
    #[serde(default)]
    pub combined_probabilities: Vec<DensityPoint>,
    /// Spot price of the underlying
    pub underlying_price: f64,
    /// Years to expiry
    pub time_to_expiry: f64,
    /// Exchange expiry label
    pub expiry_date: String,
    /// Expiry instant in milliseconds since the Unix epoch
    pub expiration_timestamp: i64,
    /// Valuation instant
    pub timestamp: DateTime<Utc>,
    /// Differentiation method used
    pub method: DifferentiationMethod,
    /// Call-side statistics
    pub call_statistics: Option<Statistics>,
    /// Put-side statistics
    pub put_statistics: Option<Statistics>,
    /// Combined statistics
    #[serde(default)]
    pub combined_statistics: Option<Statistics>,
    /// Call-side density on an even grid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_density: Option<VisualisationDensity>,
    /// Put-side density on an even grid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_density: Option<VisualisationDensity>,
}

impl ExpiryPayload {
    /// Payload for one extracted expiry.
    pub fn new(
        distributions: &ExpiryDistributions,
        as_of: DateTime<Utc>,
        config: &DensityConfig,
    ) -> Self {
        let expiry = &distributions.expiry;
        let points = |d: Option<&Distribution>| d.map(|d| d.points().to_vec()).unwrap_or_default();
        let density = |d: Option<&Distribution>| {
            d.map(|d| visualisation_density(d.points(), expiry, config.visualisation_points))
        };

        Self {
            call_probabilities: points(distributions.call.as_ref()),
            put_probabilities: points(distributions.put.as_ref()),
            combined_probabilities: distributions.combined.points().to_vec(),
            underlying_price: distributions.underlying_price,
            time_to_expiry: expiry.time_to_expiry,
            expiry_date: expiry.label.clone(),
            expiration_timestamp: expiry.expiration_millis(),
            timestamp: as_of,
            method: config.method,
            call_statistics: distributions.call.as_ref().map(summarise),
            put_statistics: distributions.put.as_ref().map(summarise),
            combined_statistics: Some(summarise(&distributions.combined)),
            call_density: density(distributions.call.as_ref()),
            put_density: density(distributions.put.as_ref()),
        }
    }

    /// Rebuild distributions from a saved payload.
    ///
    /// A payload without combined probabilities has them recomputed from
    /// the two sides.
    pub fn to_distributions(
        &self,
        currency: &str,
        label: &str,
        config: &DensityConfig,
    ) -> Result<ExpiryDistributions, DensityError> {
        let expiration = DateTime::<Utc>::from_timestamp_millis(self.expiration_timestamp)
            .ok_or_else(|| {
                DateError::ParseError(format!(
                    "expiration timestamp {} out of range",
                    self.expiration_timestamp
                ))
            })?;
        let expiry = ExpiryInfo {
            label: label.to_string(),
            expiration,
            time_to_expiry: self.time_to_expiry,
        };
        let tolerance = config.normalisation_tolerance;
        let side = |points: &[DensityPoint]| -> Result<Option<Distribution>, DensityError> {
            if points.is_empty() {
                return Ok(None);
            }
            Distribution::new(points.to_vec(), self.underlying_price, expiry.clone(), tolerance)
                .map(Some)
        };

        let call = side(&self.call_probabilities)?;
        let put = side(&self.put_probabilities)?;
        let combined = match side(&self.combined_probabilities)? {
            Some(combined) => combined,
            None => {
                let normaliser = DistributionNormaliser::new(config);
                let points = match (&call, &put) {
                    (Some(c), Some(p)) => normaliser.combine(c.points(), p.points())?,
                    (Some(only), None) | (None, Some(only)) => only.points().to_vec(),
                    (None, None) => {
                        return Err(DensityError::EmptyInput(format!(
                            "{} {} has no probabilities",
                            currency, label
                        )))
                    }
                };
                Distribution::new(points, self.underlying_price, expiry.clone(), tolerance)?
            }
        };

        Ok(ExpiryDistributions {
            expiry,
            underlying_price: self.underlying_price,
            call,
            put,
            combined,
            side_failures: Vec::new(),
        })
    }
}

/// Extraction results for every currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDocument {
    /// Valuation instant
    pub timestamp: DateTime<Utc>,
    /// Differentiation method used
    pub method: DifferentiationMethod,
    /// Payloads keyed by currency, then expiry label
    pub currencies: BTreeMap<String, BTreeMap<String, ExpiryPayload>>,
    /// Every failed expiry and side
    #[serde(default)]
    pub failures: Vec<FailureRecord>,
}

impl ExtractionDocument {
    /// Document for a batch of extractions.
    pub fn new(
        as_of: DateTime<Utc>,
        config: &DensityConfig,
        extractions: &[CurrencyExtraction],
    ) -> Self {
        let currencies = extractions
            .iter()
            .map(|extraction| {
                let payloads = extraction
                    .expiries
                    .iter()
                    .map(|e| (e.expiry.label.clone(), ExpiryPayload::new(e, as_of, config)))
                    .collect();
                (extraction.currency.clone(), payloads)
            })
            .collect();
        let failures = extractions
            .iter()
            .flat_map(|e| e.all_failures())
            .map(FailureRecord::from)
            .collect();

        Self {
            timestamp: as_of,
            method: config.method,
            currencies,
            failures,
        }
    }

    /// Rebuild per-currency extractions, expiries sorted by expiration.
    ///
    /// A payload that no longer validates becomes a failure of its expiry.
    pub fn to_extractions(&self, config: &DensityConfig) -> Vec<CurrencyExtraction> {
        self.currencies
            .iter()
            .map(|(currency, payloads)| {
                let mut expiries = Vec::new();
                let mut failures = Vec::new();
                for (label, payload) in payloads {
                    match payload.to_distributions(currency, label, config) {
                        Ok(distributions) => expiries.push(distributions),
                        Err(error) => failures.push(ExpiryFailure {
                            currency: currency.clone(),
                            expiry: label.clone(),
                            side: None,
                            error,
                        }),
                    }
                }
                expiries.sort_by(|a, b| a.expiry.expiration.cmp(&b.expiry.expiration));
                CurrencyExtraction {
                    currency: currency.clone(),
                    expiries,
                    failures,
                    skipped: Vec::new(),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

/// Axes and probabilities of one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPayload {
    /// Expiry instants, seconds since the Unix epoch
    pub time_unix: Vec<i64>,
    /// Expiry instants, RFC 3339
    pub time_dates: Vec<String>,
    /// Days to expiry
    pub time_days: Vec<f64>,
    /// Price axis
    pub prices: Vec<f64>,
    /// `probabilities[price_index][time_index]`
    pub probabilities: Vec<Vec<f64>>,
}

/// Extents of one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMetadata {
    /// Number of prices
    pub price_points: usize,
    /// Number of expiries
    pub time_points: usize,
    /// Lowest price on the axis
    pub price_min: f64,
    /// Highest price on the axis
    pub price_max: f64,
    /// Earliest expiry, seconds since the Unix epoch
    pub time_min: i64,
    /// Latest expiry, seconds since the Unix epoch
    pub time_max: i64,
    /// Days to the earliest expiry
    pub time_min_days: f64,
    /// Days to the latest expiry
    pub time_max_days: f64,
}

/// One probability surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacePayload {
    /// Currency code
    pub currency: String,
    /// Valuation instant
    pub timestamp: DateTime<Utc>,
    /// Underlying price of the nearest expiry
    pub current_price: f64,
    /// Differentiation method used
    pub method: DifferentiationMethod,
    /// `calls`, `puts` or `combined`
    pub option_type: String,
    /// Grid
    pub grid: GridPayload,
    /// Extents
    pub metadata: SurfaceMetadata,
}

/// Statistics of one surface column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatisticsPayload {
    /// Expiry instant, seconds since the Unix epoch
    pub time_unix: i64,
    /// Days to expiry
    pub days_to_expiry: f64,
    /// Expiry date, `YYYY-MM-DD`
    pub expiry_date: String,
    /// Mean price
    pub expected_price: f64,
    /// Standard deviation of price
    pub std_dev: f64,
    /// Most likely price on the axis
    pub mode_price: f64,
    /// Mass above the underlying price
    pub prob_above_current: f64,
    /// Mass at or below the underlying price
    pub prob_below_current: f64,
    /// Share of the distribution inside the price axis
    pub retained_mass: f64,
    /// Quantiles by cumulative mass
    pub quantiles: QuantileSet,
}

/// Per-column statistics of one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceStatisticsPayload {
    /// Currency code
    pub currency: String,
    /// `calls`, `puts` or `combined`
    pub option_type: String,
    /// Underlying price of the nearest expiry
    pub current_price: f64,
    /// One entry per column in time order
    pub statistics: Vec<ColumnStatisticsPayload>,
}

/// Surface and statistics payloads for one kind.
fn surface_payloads(
    currency: &str,
    kind: SurfaceKind,
    surface: &ProbabilitySurface,
    as_of: DateTime<Utc>,
    method: DifferentiationMethod,
) -> (SurfacePayload, SurfaceStatisticsPayload) {
    let columns = &surface.columns;
    let current_price = columns.first().map(|c| c.underlying_price).unwrap_or(f64::NAN);
    let time_unix: Vec<i64> = columns.iter().map(|c| c.expiry.expiration.timestamp()).collect();
    let time_days = surface.grid.time_axis().to_vec();
    let prices = surface.grid.price_axis().to_vec();

    let metadata = SurfaceMetadata {
        price_points: prices.len(),
        time_points: time_days.len(),
        price_min: prices.first().copied().unwrap_or(f64::NAN),
        price_max: prices.last().copied().unwrap_or(f64::NAN),
        time_min: time_unix.first().copied().unwrap_or_default(),
        time_max: time_unix.last().copied().unwrap_or_default(),
        time_min_days: time_days.first().copied().unwrap_or(f64::NAN),
        time_max_days: time_days.last().copied().unwrap_or(f64::NAN),
    };

    let grid = GridPayload {
        time_dates: columns
            .iter()
            .map(|c| c.expiry.expiration.to_rfc3339())
            .collect(),
        time_unix,
        time_days,
        prices,
        probabilities: surface.grid.probabilities().to_vec(),
    };

    let statistics = columns
        .iter()
        .map(|c| ColumnStatisticsPayload {
            time_unix: c.expiry.expiration.timestamp(),
            days_to_expiry: c.expiry.days_to_expiry(),
            expiry_date: c.expiry.expiration.format("%Y-%m-%d").to_string(),
            expected_price: c.statistics.expected_price,
            std_dev: c.statistics.std_dev,
            mode_price: c.statistics.mode_strike,
            prob_above_current: c.statistics.prob_above_current,
            prob_below_current: c.statistics.prob_below_current,
            retained_mass: c.retained_mass,
            quantiles: c.quantiles,
        })
        .collect();

    (
        SurfacePayload {
            currency: currency.to_string(),
            timestamp: as_of,
            current_price,
            method,
            option_type: kind.label().to_string(),
            grid,
            metadata,
        },
        SurfaceStatisticsPayload {
            currency: currency.to_string(),
            option_type: kind.label().to_string(),
            current_price,
            statistics,
        },
    )
}

/// All surfaces of one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySurfacePayload {
    /// Call-only surface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_surface: Option<SurfacePayload>,
    /// Put-only surface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_surface: Option<SurfacePayload>,
    /// Combined surface
    pub combined_surface: SurfacePayload,
    /// Call-only column statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_statistics: Option<SurfaceStatisticsPayload>,
    /// Put-only column statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_statistics: Option<SurfaceStatisticsPayload>,
    /// Combined column statistics
    pub combined_statistics: SurfaceStatisticsPayload,
}

impl CurrencySurfacePayload {
    /// Payloads for a currency's surfaces; `None` without a combined surface.
    pub fn new(
        surfaces: &CurrencySurfaces,
        as_of: DateTime<Utc>,
        method: DifferentiationMethod,
    ) -> Option<Self> {
        let payloads = |kind| {
            surfaces
                .surfaces
                .get(&kind)
                .map(|s| surface_payloads(&surfaces.currency, kind, s, as_of, method))
        };
        let (combined_surface, combined_statistics) = payloads(SurfaceKind::Combined)?;
        let (call_surface, call_statistics) = payloads(SurfaceKind::Call).unzip();
        let (put_surface, put_statistics) = payloads(SurfaceKind::Put).unzip();

        Some(Self {
            call_surface,
            put_surface,
            combined_surface,
            call_statistics,
            put_statistics,
            combined_statistics,
        })
    }
}

/// Surfaces for every currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDocument {
    /// Valuation instant
    pub timestamp: DateTime<Utc>,
    /// Differentiation method used
    pub method: DifferentiationMethod,
    /// Surfaces keyed by currency
    pub currencies: BTreeMap<String, CurrencySurfacePayload>,
    /// Currencies and side surfaces that could not be assembled
    #[serde(default)]
    pub failures: Vec<FailureRecord>,
}

impl SurfaceDocument {
    /// Document for a batch of surface results.
    pub fn new(
        as_of: DateTime<Utc>,
        method: DifferentiationMethod,
        results: &[Result<CurrencySurfaces, CurrencyFailure>],
    ) -> Self {
        let mut currencies = BTreeMap::new();
        let mut failures = Vec::new();

        for result in results {
            match result {
                Ok(surfaces) => {
                    failures.extend(surfaces.failures.iter().map(|(kind, error)| FailureRecord {
                        currency: surfaces.currency.clone(),
                        expiry: None,
                        side: Some(kind.label().to_string()),
                        error: error.to_string(),
                    }));
                    for (kind, surface) in &surfaces.surfaces {
                        failures.extend(surface.omitted.iter().map(|o| FailureRecord {
                            currency: surfaces.currency.clone(),
                            expiry: Some(o.expiry.clone()),
                            side: Some(kind.label().to_string()),
                            error: o.error.to_string(),
                        }));
                    }
                    if let Some(payload) = CurrencySurfacePayload::new(surfaces, as_of, method) {
                        currencies.insert(surfaces.currency.clone(), payload);
                    }
                }
                Err(failure) => failures.push(FailureRecord::from(failure)),
            }
        }

        Self {
            timestamp: as_of,
            method,
            currencies,
            failures,
        }
    }
}
