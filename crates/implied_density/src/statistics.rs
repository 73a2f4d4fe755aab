//! Summary statistics of a distribution.

use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;

/// Moments, mode and spot-relative probabilities of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// `Σ strike · probability`
    pub expected_price: f64,
    /// Square root of `Σ (strike - mean)² · probability`
    pub std_dev: f64,
    /// Strike of maximum probability; ties resolve to the lowest strike
    pub mode_strike: f64,
    /// Mass strictly above the underlying price
    pub prob_above_current: f64,
    /// Mass at or below the underlying price
    pub prob_below_current: f64,
}

/// Statistics of a normalised distribution.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use implied_core::types::ExpiryInfo;
/// use implied_density::{summarise, DensityPoint, Distribution};
///
/// let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
/// let expiry = ExpiryInfo::from_label("31JAN25", as_of).unwrap();
/// let points = vec![
///     DensityPoint::new(90.0, 0.25, 0.5),
///     DensityPoint::new(100.0, 0.5, 0.5),
///     DensityPoint::new(110.0, 0.25, 0.5),
/// ];
/// let dist = Distribution::new(points, 100.0, expiry, 1e-6).unwrap();
/// let stats = summarise(&dist);
/// assert_eq!(stats.expected_price, 100.0);
/// assert_eq!(stats.mode_strike, 100.0);
/// assert_eq!(stats.prob_above_current, 0.25);
/// ```
pub fn summarise(distribution: &Distribution) -> Statistics {
    let points = distribution.points();
    let strikes: Vec<f64> = points.iter().map(|p| p.strike).collect();
    let probs: Vec<f64> = points.iter().map(|p| p.probability).collect();
    moments(&strikes, &probs, 1.0, distribution.underlying_price())
}

/// Statistics of arbitrary non-negative weights, normalised by their sum.
///
/// Returns `None` for empty or mismatched input, or when the weights carry no
/// mass.
pub fn summarise_weights(prices: &[f64], weights: &[f64], underlying_price: f64) -> Option<Statistics> {
    if prices.is_empty() || prices.len() != weights.len() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return None;
    }
    Some(moments(prices, weights, total, underlying_price))
}

fn moments(prices: &[f64], weights: &[f64], total: f64, underlying_price: f64) -> Statistics {
    let expected_price = prices
        .iter()
        .zip(weights)
        .map(|(k, w)| k * w)
        .sum::<f64>()
        / total;

    let variance = prices
        .iter()
        .zip(weights)
        .map(|(k, w)| (k - expected_price).powi(2) * w)
        .sum::<f64>()
        / total;

    // strict comparison keeps the first (lowest-strike) maximum
    let mut mode_strike = prices[0];
    let mut best = weights[0];
    for (&k, &w) in prices.iter().zip(weights).skip(1) {
        if w > best {
            best = w;
            mode_strike = k;
        }
    }

    let above: f64 = prices
        .iter()
        .zip(weights)
        .filter(|(&k, _)| k > underlying_price)
        .map(|(_, w)| w)
        .sum();
    let below: f64 = prices
        .iter()
        .zip(weights)
        .filter(|(&k, _)| k <= underlying_price)
        .map(|(_, w)| w)
        .sum();

    Statistics {
        expected_price,
        std_dev: variance.max(0.0).sqrt(),
        mode_strike,
        prob_above_current: (above / total).clamp(0.0, 1.0),
        prob_below_current: (below / total).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DensityPoint;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use implied_core::types::ExpiryInfo;

    fn distribution(data: &[(f64, f64)], spot: f64) -> Distribution {
        let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let expiry = ExpiryInfo::from_label("31JAN25", as_of).unwrap();
        let points = data
            .iter()
            .map(|&(k, p)| DensityPoint::new(k, p, 0.5))
            .collect();
        Distribution::new(points, spot, expiry, 1e-6).unwrap()
    }

    #[test]
    fn test_symmetric_distribution() {
        let dist = distribution(&[(90.0, 0.2), (100.0, 0.6), (110.0, 0.2)], 100.0);
        let stats = summarise(&dist);
        assert_relative_eq!(stats.expected_price, 100.0, epsilon = 1e-12);
        assert_relative_eq!(stats.std_dev, 40.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(stats.mode_strike, 100.0);
        assert_relative_eq!(stats.prob_above_current, 0.2, epsilon = 1e-12);
        assert_relative_eq!(stats.prob_below_current, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_mode_tie_takes_lowest_strike() {
        let dist = distribution(&[(90.0, 0.4), (100.0, 0.2), (110.0, 0.4)], 100.0);
        assert_eq!(summarise(&dist).mode_strike, 90.0);
    }

    #[test]
    fn test_single_point_mass() {
        let dist = distribution(&[(100.0, 1.0)], 100.0);
        let stats = summarise(&dist);
        assert_eq!(stats.expected_price, 100.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.prob_above_current, 0.0);
        assert_eq!(stats.prob_below_current, 1.0);
    }

    #[test]
    fn test_spot_outside_support() {
        let dist = distribution(&[(90.0, 0.5), (110.0, 0.5)], 50.0);
        let stats = summarise(&dist);
        assert_eq!(stats.prob_above_current, 1.0);
        assert_eq!(stats.prob_below_current, 0.0);
    }

    #[test]
    fn test_weights_are_normalised() {
        let stats = summarise_weights(&[1.0, 2.0, 3.0], &[1.0, 2.0, 1.0], 2.0).unwrap();
        assert_relative_eq!(stats.expected_price, 2.0, epsilon = 1e-12);
        assert_relative_eq!(stats.prob_below_current, 0.75, epsilon = 1e-12);
        assert_eq!(stats.mode_strike, 2.0);
    }

    #[test]
    fn test_weights_without_mass() {
        assert!(summarise_weights(&[1.0, 2.0], &[0.0, 0.0], 1.0).is_none());
        assert!(summarise_weights(&[], &[], 1.0).is_none());
        assert!(summarise_weights(&[1.0], &[1.0, 2.0], 1.0).is_none());
    }
}
