//! Quantiles of discrete distributions by cumulative mass.

use serde::{Deserialize, Serialize};

/// Probability levels reported for every surface column.
pub const QUANTILE_LEVELS: [f64; 5] = [0.05, 0.25, 0.50, 0.75, 0.95];

/// Price at each reported probability level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileSet {
    /// 5% quantile
    pub q05: f64,
    /// 25% quantile
    pub q25: f64,
    /// Median
    pub q50: f64,
    /// 75% quantile
    pub q75: f64,
    /// 95% quantile
    pub q95: f64,
}

impl QuantileSet {
    /// Quantiles of `weights` over ascending `prices`, or `None` when the
    /// weights carry no mass.
    pub fn from_weights(prices: &[f64], weights: &[f64]) -> Option<Self> {
        let cumulative = cumulative_fractions(weights)?;
        let at = |q| interpolate_quantile(prices, &cumulative, q);
        Some(Self {
            q05: at(QUANTILE_LEVELS[0]),
            q25: at(QUANTILE_LEVELS[1]),
            q50: at(QUANTILE_LEVELS[2]),
            q75: at(QUANTILE_LEVELS[3]),
            q95: at(QUANTILE_LEVELS[4]),
        })
    }

    /// Values in ascending level order.
    pub fn as_array(&self) -> [f64; 5] {
        [self.q05, self.q25, self.q50, self.q75, self.q95]
    }
}

/// Price at which cumulative mass first reaches `q`.
///
/// The first index whose cumulative fraction is `>= q` brackets the answer
/// with its predecessor; the price is interpolated linearly between the two.
/// A level reached at the first price returns that price.
pub fn quantile(prices: &[f64], weights: &[f64], q: f64) -> Option<f64> {
    if prices.len() != weights.len() {
        return None;
    }
    let cumulative = cumulative_fractions(weights)?;
    Some(interpolate_quantile(prices, &cumulative, q))
}

fn cumulative_fractions(weights: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || !(total > 0.0 && total.is_finite()) {
        return None;
    }
    let mut running = 0.0;
    Some(
        weights
            .iter()
            .map(|w| {
                running += w;
                running / total
            })
            .collect(),
    )
}

fn interpolate_quantile(prices: &[f64], cumulative: &[f64], q: f64) -> f64 {
    let last = cumulative.len() - 1;
    let idx = cumulative.partition_point(|&c| c < q).min(last);
    if idx == 0 {
        return prices[0];
    }

    let (c0, c1) = (cumulative[idx - 1], cumulative[idx]);
    let (p0, p1) = (prices[idx - 1], prices[idx]);
    if c1 > c0 {
        p0 + (q - c0) / (c1 - c0) * (p1 - p0)
    } else {
        p1
    }
}
