//! Normalised risk-neutral distributions for a single expiry.

use implied_core::types::{DensityError, ExpiryInfo};
use serde::{Deserialize, Serialize};

/// Probability mass at one strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    /// Strike price
    pub strike: f64,
    /// Probability mass (raw density before normalisation)
    pub probability: f64,
    /// Implied volatility carried through from the quotes
    #[serde(rename = "iv", default)]
    pub implied_vol: f64,
}

impl DensityPoint {
    /// Create a density point.
    #[inline]
    pub fn new(strike: f64, probability: f64, implied_vol: f64) -> Self {
        Self {
            strike,
            probability,
            implied_vol,
        }
    }
}

/// Normalised distribution over strikes for one expiry.
///
/// Invariants checked at construction:
/// - at least one point, strikes finite and strictly increasing
/// - every probability finite and `>= 0`
/// - `Σ probability` within the given relative tolerance of 1
///
/// Instances are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    points: Vec<DensityPoint>,
    underlying_price: f64,
    expiry: ExpiryInfo,
}

impl Distribution {
    /// Build a distribution from already normalised points.
    ///
    /// # Errors
    ///
    /// - `DensityError::EmptyInput` for no points
    /// - `DensityError::InvalidQuote` for non-finite values, negative mass,
    ///   a non-positive underlying, or a total mass away from 1
    /// - `DensityError::DegenerateCurve` for non-increasing strikes
    pub fn new(
        points: Vec<DensityPoint>,
        underlying_price: f64,
        expiry: ExpiryInfo,
        tolerance: f64,
    ) -> Result<Self, DensityError> {
        if points.is_empty() {
            return Err(DensityError::EmptyInput(format!(
                "distribution for {} has no points",
                expiry.label
            )));
        }
        if !(underlying_price.is_finite() && underlying_price > 0.0) {
            return Err(DensityError::InvalidQuote(format!(
                "underlying price must be positive, got {}",
                underlying_price
            )));
        }
        if let Some(p) = points
            .iter()
            .find(|p| !p.strike.is_finite() || !p.probability.is_finite() || p.probability < 0.0)
        {
            return Err(DensityError::InvalidQuote(format!(
                "invalid density point at strike {} (probability {})",
                p.strike, p.probability
            )));
        }
        if let Some(i) = points.windows(2).position(|w| w[1].strike <= w[0].strike) {
            return Err(DensityError::DegenerateCurve {
                index: i + 1,
                strike: points[i + 1].strike,
            });
        }

        let total: f64 = points.iter().map(|p| p.probability).sum();
        if (total - 1.0).abs() > tolerance {
            return Err(DensityError::InvalidQuote(format!(
                "probabilities sum to {} rather than 1",
                total
            )));
        }

        Ok(Self {
            points,
            underlying_price,
            expiry,
        })
    }

    /// Density points in ascending strike order.
    #[inline]
    pub fn points(&self) -> &[DensityPoint] {
        &self.points
    }

    /// Spot price of the underlying at valuation.
    #[inline]
    pub fn underlying_price(&self) -> f64 {
        self.underlying_price
    }

    /// Expiry this distribution belongs to.
    #[inline]
    pub fn expiry(&self) -> &ExpiryInfo {
        &self.expiry
    }

    /// Days from valuation to expiry.
    #[inline]
    pub fn days_to_expiry(&self) -> f64 {
        self.expiry.days_to_expiry()
    }

    /// Strikes in ascending order.
    pub fn strikes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.strike).collect()
    }

    /// Probabilities in strike order.
    pub fn probabilities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.probability).collect()
    }

    /// `Σ probability`, 1 up to rounding.
    pub fn total_mass(&self) -> f64 {
        self.points.iter().map(|p| p.probability).sum()
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed distribution.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest and largest strike carrying a point.
    pub fn support(&self) -> (f64, f64) {
        (
            self.points[0].strike,
            self.points[self.points.len() - 1].strike,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn expiry() -> ExpiryInfo {
        let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        ExpiryInfo::new("31JAN25", Utc.with_ymd_and_hms(2025, 1, 31, 8, 0, 0).unwrap(), as_of)
    }

    fn points(probs: &[f64]) -> Vec<DensityPoint> {
        probs
            .iter()
            .enumerate()
            .map(|(i, &p)| DensityPoint::new(100.0 + i as f64 * 10.0, p, 0.5))
            .collect()
    }

    #[test]
    fn test_valid_distribution() {
        let dist = Distribution::new(points(&[0.25, 0.5, 0.25]), 110.0, expiry(), 1e-6).unwrap();
        assert_eq!(dist.len(), 3);
        assert_eq!(dist.support(), (100.0, 120.0));
        assert!((dist.total_mass() - 1.0).abs() < 1e-15);
        assert!((dist.days_to_expiry() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_unnormalised() {
        let result = Distribution::new(points(&[0.2, 0.2]), 110.0, expiry(), 1e-6);
        assert!(matches!(result, Err(DensityError::InvalidQuote(_))));
    }

    #[test]
    fn test_rejects_negative_mass() {
        let result = Distribution::new(points(&[1.5, -0.5]), 110.0, expiry(), 1e-6);
        assert!(matches!(result, Err(DensityError::InvalidQuote(_))));
    }

    #[test]
    fn test_rejects_unsorted_strikes() {
        let mut pts = points(&[0.5, 0.5]);
        pts.reverse();
        let result = Distribution::new(pts, 110.0, expiry(), 1e-6);
        assert!(matches!(
            result,
            Err(DensityError::DegenerateCurve { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_empty() {
        let result = Distribution::new(Vec::new(), 110.0, expiry(), 1e-6);
        assert!(matches!(result, Err(DensityError::EmptyInput(_))));
    }

    #[test]
    fn test_density_point_json_keys() {
        let json = serde_json::to_value(DensityPoint::new(100.0, 0.1, 0.6)).unwrap();
        assert_eq!(json["iv"], 0.6);
        assert_eq!(json["strike"], 100.0);
        assert_eq!(json["probability"], 0.1);
    }
}
