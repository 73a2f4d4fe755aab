//! Normalisation of raw densities and merging of call and put sides.

use implied_core::types::DensityError;

use crate::config::DensityConfig;
use crate::distribution::DensityPoint;

/// Rescales raw densities to unit mass.
///
/// # Example
///
/// ```
/// use implied_density::{DensityConfig, DensityPoint, DistributionNormaliser};
///
/// let raw = vec![
///     DensityPoint::new(90.0, 2.0, 0.5),
///     DensityPoint::new(100.0, 6.0, 0.5),
/// ];
/// let normalised = DistributionNormaliser::new(&DensityConfig::default())
///     .normalise(raw)
///     .unwrap();
/// assert_eq!(normalised[1].probability, 0.75);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DistributionNormaliser {
    mass_epsilon: f64,
}

impl DistributionNormaliser {
    /// Create a normaliser from the density configuration.
    pub fn new(config: &DensityConfig) -> Self {
        Self {
            mass_epsilon: config.mass_epsilon,
        }
    }

    /// Divide every probability by the total mass.
    ///
    /// Negative values are clamped to zero first.
    ///
    /// # Errors
    ///
    /// `DensityError::ZeroMass` when the total is at or below the mass
    /// epsilon, `DensityError::EmptyInput` for no points.
    pub fn normalise(&self, mut points: Vec<DensityPoint>) -> Result<Vec<DensityPoint>, DensityError> {
        if points.is_empty() {
            return Err(DensityError::EmptyInput(
                "no density points to normalise".to_string(),
            ));
        }

        for p in points.iter_mut() {
            p.probability = p.probability.max(0.0);
        }

        let total: f64 = points.iter().map(|p| p.probability).sum();
        if !(total > self.mass_epsilon) || !total.is_finite() {
            return Err(DensityError::ZeroMass { total });
        }

        for p in points.iter_mut() {
            p.probability /= total;
        }
        Ok(points)
    }

    /// Average two normalised sides on the union of their strikes and
    /// renormalise.
    ///
    /// A strike missing from one side contributes zero mass from that side.
    /// Implied vols are averaged where both sides quote the strike.
    pub fn combine(
        &self,
        calls: &[DensityPoint],
        puts: &[DensityPoint],
    ) -> Result<Vec<DensityPoint>, DensityError> {
        let mut merged = Vec::with_capacity(calls.len() + puts.len());
        let (mut i, mut j) = (0, 0);

        while i < calls.len() || j < puts.len() {
            let point = match (calls.get(i), puts.get(j)) {
                (Some(c), Some(p)) if c.strike == p.strike => {
                    i += 1;
                    j += 1;
                    DensityPoint::new(
                        c.strike,
                        0.5 * (c.probability + p.probability),
                        0.5 * (c.implied_vol + p.implied_vol),
                    )
                }
                (Some(c), Some(p)) if c.strike < p.strike => {
                    i += 1;
                    DensityPoint::new(c.strike, 0.5 * c.probability, c.implied_vol)
                }
                (_, Some(p)) => {
                    j += 1;
                    DensityPoint::new(p.strike, 0.5 * p.probability, p.implied_vol)
                }
                (Some(c), None) => {
                    i += 1;
                    DensityPoint::new(c.strike, 0.5 * c.probability, c.implied_vol)
                }
                (None, None) => break,
            };
            merged.push(point);
        }

        self.normalise(merged)
    }
}
