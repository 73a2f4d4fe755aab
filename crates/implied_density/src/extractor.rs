//! Raw (unnormalised) risk-neutral density from one side of an option chain.
//!
//! The density is proportional to the second derivative of the option price
//! with respect to strike. Calls and puts are handled identically and
//! independently. Negative values, which come from noise or arbitrage in the
//! quotes, are clamped to zero.

use implied_core::math::differentiation::CurveDifferentiator;
use implied_core::math::interpolators::CubicSplineInterpolator;
use implied_core::types::{DensityError, OptionQuote, PriceCurve};

use crate::config::{DensityConfig, DifferentiationMethod};
use crate::distribution::DensityPoint;

/// Turns quotes into raw density points.
///
/// # Example
///
/// ```
/// use implied_core::types::OptionQuote;
/// use implied_density::{DensityConfig, DensityExtractor};
///
/// let quotes = [
///     OptionQuote::new(90.0, 12.0, 0.5),
///     OptionQuote::new(100.0, 5.0, 0.5),
///     OptionQuote::new(110.0, 1.5, 0.5),
/// ];
/// let raw = DensityExtractor::new(&DensityConfig::default()).extract(&quotes).unwrap();
/// assert_eq!(raw.len(), 1);
/// assert_eq!(raw[0].strike, 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct DensityExtractor {
    method: DifferentiationMethod,
    min_quote_price: f64,
    spline_min_points: usize,
    spline_oversampling: usize,
    differentiator: CurveDifferentiator,
}

impl DensityExtractor {
    /// Create an extractor from the density configuration.
    pub fn new(config: &DensityConfig) -> Self {
        Self {
            method: config.method,
            min_quote_price: config.min_quote_price,
            spline_min_points: config.spline_min_points,
            spline_oversampling: config.spline_oversampling,
            differentiator: CurveDifferentiator::new(config.degenerate_epsilon),
        }
    }

    /// Method this extractor differentiates with.
    #[inline]
    pub fn method(&self) -> DifferentiationMethod {
        self.method
    }

    /// Filter and sort quotes into a validated price curve.
    pub fn curve(&self, quotes: &[OptionQuote]) -> Result<PriceCurve, DensityError> {
        PriceCurve::from_quotes(quotes, self.min_quote_price)
    }

    /// Raw density of one side's quotes.
    ///
    /// # Errors
    ///
    /// `InsufficientData` with fewer than three usable quotes, and
    /// `DegenerateCurve` for near-duplicate strikes.
    pub fn extract(&self, quotes: &[OptionQuote]) -> Result<Vec<DensityPoint>, DensityError> {
        let curve = self.curve(quotes)?;
        self.raw_density(&curve)
    }

    /// Raw density of an already validated curve.
    pub fn raw_density(&self, curve: &PriceCurve) -> Result<Vec<DensityPoint>, DensityError> {
        let second = self.differentiator.second_derivatives(curve)?;

        match self.method {
            DifferentiationMethod::FiniteDiff => Ok(curve.strikes()[1..curve.len() - 1]
                .iter()
                .zip(&curve.implied_vols()[1..curve.len() - 1])
                .zip(second)
                .map(|((&strike, &iv), d2)| DensityPoint::new(strike, d2.max(0.0), iv))
                .collect()),
            // The stencil pass above still rejects near-duplicate strikes,
            // which would otherwise make the spline system ill-conditioned.
            DifferentiationMethod::CubicSpline => self.spline_density(curve),
        }
    }

    /// Spline second derivative on a uniform grid of
    /// `max(spline_min_points, n * spline_oversampling)` steps, boundaries excluded.
    fn spline_density(&self, curve: &PriceCurve) -> Result<Vec<DensityPoint>, DensityError> {
        let spline = CubicSplineInterpolator::new(curve.strikes(), curve.prices())?;
        let steps = self
            .spline_min_points
            .max(curve.len() * self.spline_oversampling)
            .max(2);

        let lo = curve.strikes()[0];
        let hi = curve.strikes()[curve.len() - 1];
        let step = (hi - lo) / steps as f64;

        (1..steps)
            .map(|j| {
                let strike = lo + j as f64 * step;
                let d2 = spline.second_derivative(strike)?;
                Ok(DensityPoint::new(
                    strike,
                    d2.max(0.0),
                    curve.nearest_implied_vol(strike),
                ))
            })
            .collect()
    }
}
