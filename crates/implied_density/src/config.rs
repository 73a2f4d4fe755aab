//! Extraction and surface configuration.
//!
//! Every threshold the pipeline uses is passed in through these structs, so
//! independent currencies can run side by side with no shared state.

use std::fmt;
use std::str::FromStr;

use implied_core::math::differentiation::DEFAULT_DEGENERATE_EPSILON;
use implied_core::types::DensityError;
use serde::{Deserialize, Serialize};

/// How the second derivative of a price curve is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DifferentiationMethod {
    /// Three-point non-uniform finite differences at each interior strike.
    #[default]
    FiniteDiff,
    /// Natural cubic spline, sampled on a dense uniform strike grid.
    CubicSpline,
}

impl DifferentiationMethod {
    /// Label used in payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            DifferentiationMethod::FiniteDiff => "finite-diff",
            DifferentiationMethod::CubicSpline => "cubic-spline",
        }
    }
}

impl FromStr for DifferentiationMethod {
    type Err = DensityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "finite-diff" | "finite_diff" | "fd" => Ok(DifferentiationMethod::FiniteDiff),
            "cubic-spline" | "cubic_spline" | "spline" => Ok(DifferentiationMethod::CubicSpline),
            other => Err(DensityError::InvalidQuote(format!(
                "unknown differentiation method '{}'. Supported: finite-diff, cubic-spline",
                other
            ))),
        }
    }
}

impl fmt::Display for DifferentiationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-expiry density extraction settings.
///
/// # Example
///
/// ```
/// use implied_density::{DensityConfig, DifferentiationMethod};
///
/// let config = DensityConfig::default();
/// assert_eq!(config.method, DifferentiationMethod::FiniteDiff);
/// assert!(config.validation_errors().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Second-derivative estimator
    pub method: DifferentiationMethod,
    /// Quotes with mark price at or below this are dropped
    pub min_quote_price: f64,
    /// Singularity threshold of the finite-difference stencil
    pub degenerate_epsilon: f64,
    /// Total mass at or below this is treated as zero
    pub mass_epsilon: f64,
    /// Relative tolerance on `Σ probability == 1`
    pub normalisation_tolerance: f64,
    /// Points in the per-side visualisation density
    pub visualisation_points: usize,
    /// Minimum dense-grid steps for the cubic-spline method
    pub spline_min_points: usize,
    /// Dense-grid steps per quoted strike for the cubic-spline method
    pub spline_oversampling: usize,
    /// Expiries further out than this many days are skipped
    pub max_days: f64,
    /// Run currencies and expiries on the rayon pool
    pub parallel: bool,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            method: DifferentiationMethod::FiniteDiff,
            min_quote_price: 0.0,
            degenerate_epsilon: DEFAULT_DEGENERATE_EPSILON,
            mass_epsilon: 1e-15,
            normalisation_tolerance: 1e-6,
            visualisation_points: 200,
            spline_min_points: 100,
            spline_oversampling: 10,
            max_days: 90.0,
            parallel: true,
        }
    }
}

impl DensityConfig {
    /// All constraint violations, empty when the configuration is usable.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.min_quote_price.is_finite() || self.min_quote_price < 0.0 {
            errors.push(format!(
                "min_quote_price must be finite and >= 0, got {}",
                self.min_quote_price
            ));
        }
        if !(self.degenerate_epsilon > 0.0 && self.degenerate_epsilon < 0.25) {
            errors.push(format!(
                "degenerate_epsilon must lie in (0, 0.25), got {}",
                self.degenerate_epsilon
            ));
        }
        if !(self.mass_epsilon >= 0.0) {
            errors.push(format!(
                "mass_epsilon must be >= 0, got {}",
                self.mass_epsilon
            ));
        }
        if !(self.normalisation_tolerance > 0.0 && self.normalisation_tolerance < 1.0) {
            errors.push(format!(
                "normalisation_tolerance must lie in (0, 1), got {}",
                self.normalisation_tolerance
            ));
        }
        if self.visualisation_points < 2 {
            errors.push("visualisation_points must be at least 2".to_string());
        }
        if self.spline_min_points < 2 || self.spline_oversampling == 0 {
            errors.push("spline_min_points must be >= 2 and spline_oversampling > 0".to_string());
        }
        if !(self.max_days > 0.0) {
            errors.push(format!("max_days must be positive, got {}", self.max_days));
        }

        errors
    }
}

/// Price-axis settings for surface assembly.
///
/// When `price_min` and `price_max` are both set the axis is fixed; otherwise
/// it spans the observed strikes padded by `price_padding` of their range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Number of price-axis points
    pub price_points: usize,
    /// Fraction of the observed strike range added on each side
    pub price_padding: f64,
    /// Fixed lower bound of the price axis
    pub price_min: Option<f64>,
    /// Fixed upper bound of the price axis
    pub price_max: Option<f64>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            price_points: 100,
            price_padding: 0.05,
            price_min: None,
            price_max: None,
        }
    }
}

impl SurfaceConfig {
    /// All constraint violations, empty when the configuration is usable.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.price_points < 2 {
            errors.push(format!(
                "price_points must be at least 2, got {}",
                self.price_points
            ));
        }
        if !(self.price_padding >= 0.0 && self.price_padding.is_finite()) {
            errors.push(format!(
                "price_padding must be finite and >= 0, got {}",
                self.price_padding
            ));
        }
        match (self.price_min, self.price_max) {
            (Some(lo), Some(hi)) if !(lo.is_finite() && hi.is_finite() && lo < hi) => {
                errors.push(format!("price_min ({}) must be below price_max ({})", lo, hi));
            }
            (Some(_), None) | (None, Some(_)) => {
                errors.push("price_min and price_max must be set together".to_string());
            }
            _ => {}
        }

        errors
    }
}
