//! Evenly spaced rendering of one side's density for charting.

use implied_core::math::interpolators::{Interpolator, LinearInterpolator};
use implied_core::types::ExpiryInfo;
use serde::{Deserialize, Serialize};

use crate::distribution::DensityPoint;

/// Density on an evenly spaced strike grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualisationDensity {
    /// Evenly spaced strikes
    pub strikes: Vec<f64>,
    /// Linearly interpolated probability at each strike
    pub densities: Vec<f64>,
    /// Days from valuation to expiry
    pub days_to_expiry: f64,
    /// Expiry instant in milliseconds since the Unix epoch
    pub expiry_timestamp: i64,
}

/// Sample `points` on `n` evenly spaced strikes spanning their support.
///
/// Fewer than two points yield the points unchanged.
pub fn visualisation_density(
    points: &[DensityPoint],
    expiry: &ExpiryInfo,
    n: usize,
) -> VisualisationDensity {
    let mut out = VisualisationDensity {
        days_to_expiry: expiry.days_to_expiry(),
        expiry_timestamp: expiry.expiration_millis(),
        ..VisualisationDensity::default()
    };

    let strikes: Vec<f64> = points.iter().map(|p| p.strike).collect();
    let probs: Vec<f64> = points.iter().map(|p| p.probability).collect();

    let interp = match LinearInterpolator::new(&strikes, &probs) {
        Ok(interp) if n >= 2 => interp,
        _ => {
            out.strikes = strikes;
            out.densities = probs;
            return out;
        }
    };

    let (lo, hi) = interp.domain();
    let step = (hi - lo) / (n - 1) as f64;
    out.strikes = (0..n).map(|i| lo + i as f64 * step).collect();
    out.strikes[n - 1] = hi;
    out.densities = out
        .strikes
        .iter()
        .map(|&k| interp.interpolate_or(k, 0.0))
        .collect();
    out
}
