//! Uniform price axis shared by every column of a surface.

use implied_core::types::DensityError;

use crate::config::SurfaceConfig;
use crate::distribution::Distribution;

/// Evenly spaced prices `min + i · step` for `i` in `0..points`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceAxis {
    min: f64,
    max: f64,
    points: usize,
}

impl PriceAxis {
    /// Create an axis from explicit bounds.
    ///
    /// # Errors
    ///
    /// `DensityError::InvalidAxis` unless `min < max`, both finite, and
    /// `points >= 2`.
    pub fn new(min: f64, max: f64, points: usize) -> Result<Self, DensityError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(DensityError::InvalidAxis(format!(
                "bounds must be finite with min < max, got [{}, {}]",
                min, max
            )));
        }
        if points < 2 {
            return Err(DensityError::InvalidAxis(format!(
                "need at least 2 points, got {}",
                points
            )));
        }
        Ok(Self { min, max, points })
    }

    /// Axis spanning the union of the distributions' supports, widened by
    /// `padding` times that range on each side.
    ///
    /// A zero-width support is widened by `padding` of its magnitude, or by
    /// one unit when that is zero too.
    pub fn spanning(
        distributions: &[&Distribution],
        padding: f64,
        points: usize,
    ) -> Result<Self, DensityError> {
        let (lo, hi) = distributions
            .iter()
            .map(|d| d.support())
            .fold(None, |acc: Option<(f64, f64)>, (lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((a, b)) => Some((a.min(lo), b.max(hi))),
            })
            .ok_or_else(|| {
                DensityError::EmptyInput("no distributions to span a price axis".to_string())
            })?;

        let range = hi - lo;
        let pad = if range > 0.0 {
            range * padding
        } else {
            let pad = lo.abs() * padding;
            if pad > 0.0 {
                pad
            } else {
                1.0
            }
        };
        Self::new(lo - pad, hi + pad, points)
    }

    /// Axis from configuration: fixed bounds when both are set, otherwise
    /// spanning the distributions.
    pub fn from_config(
        config: &SurfaceConfig,
        distributions: &[&Distribution],
    ) -> Result<Self, DensityError> {
        match (config.price_min, config.price_max) {
            (Some(lo), Some(hi)) => Self::new(lo, hi, config.price_points),
            _ => Self::spanning(distributions, config.price_padding, config.price_points),
        }
    }

    /// Lowest price.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Highest price.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Number of prices.
    #[inline]
    pub fn len(&self) -> usize {
        self.points
    }

    /// Always false for a constructed axis.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Spacing between neighbouring prices.
    #[inline]
    pub fn step(&self) -> f64 {
        (self.max - self.min) / (self.points - 1) as f64
    }

    /// Price at index `i`, which may lie outside `0..len()`.
    #[inline]
    pub fn at(&self, i: i64) -> f64 {
        self.min + i as f64 * self.step()
    }

    /// All prices in ascending order.
    pub fn values(&self) -> Vec<f64> {
        (0..self.points as i64).map(|i| self.at(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DensityPoint;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use implied_core::types::ExpiryInfo;

    fn dist(strikes: &[f64]) -> Distribution {
        let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let expiry = ExpiryInfo::from_label("31JAN25", as_of).unwrap();
        let p = 1.0 / strikes.len() as f64;
        let points = strikes
            .iter()
            .map(|&k| DensityPoint::new(k, p, 0.5))
            .collect();
        Distribution::new(points, 100.0, expiry, 1e-6).unwrap()
    }

    #[test]
    fn test_values_and_step() {
        let axis = PriceAxis::new(0.0, 10.0, 11).unwrap();
        assert_eq!(axis.step(), 1.0);
        assert_eq!(axis.values(), (0..11).map(|i| i as f64).collect::<Vec<_>>());
        assert_eq!(axis.at(-2), -2.0);
    }

    #[test]
    fn test_invalid_axes() {
        assert!(matches!(
            PriceAxis::new(5.0, 5.0, 10),
            Err(DensityError::InvalidAxis(_))
        ));
        assert!(matches!(
            PriceAxis::new(0.0, 1.0, 1),
            Err(DensityError::InvalidAxis(_))
        ));
        assert!(PriceAxis::new(f64::NAN, 1.0, 10).is_err());
    }

    #[test]
    fn test_spanning_pads_union() {
        let a = dist(&[100.0, 150.0]);
        let b = dist(&[120.0, 200.0]);
        let axis = PriceAxis::spanning(&[&a, &b], 0.05, 100).unwrap();
        assert_relative_eq!(axis.min(), 95.0);
        assert_relative_eq!(axis.max(), 205.0);
        assert_eq!(axis.len(), 100);
    }

    #[test]
    fn test_spanning_single_strike() {
        let a = dist(&[100.0]);
        let axis = PriceAxis::spanning(&[&a], 0.05, 10).unwrap();
        assert_relative_eq!(axis.min(), 95.0);
        assert_relative_eq!(axis.max(), 105.0);
    }

    #[test]
    fn test_spanning_nothing() {
        assert!(matches!(
            PriceAxis::spanning(&[], 0.05, 10),
            Err(DensityError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_fixed_bounds_from_config() {
        let config = SurfaceConfig {
            price_points: 5,
            price_min: Some(10.0),
            price_max: Some(20.0),
            ..SurfaceConfig::default()
        };
        let a = dist(&[100.0, 150.0]);
        let axis = PriceAxis::from_config(&config, &[&a]).unwrap();
        assert_eq!(axis.values(), vec![10.0, 12.5, 15.0, 17.5, 20.0]);
    }
}
