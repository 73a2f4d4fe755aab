//! Validated price-vs-strike curves.

use super::error::DensityError;
use super::quote::OptionQuote;

/// Minimum number of strikes for a centred second derivative.
pub const MIN_CURVE_POINTS: usize = 3;

/// Ordered `(strike, price)` samples with strictly increasing strikes.
///
/// Implied vols travel alongside so that downstream density points can
/// report the vol of the strike they were derived at.
///
/// # Example
///
/// ```
/// use implied_core::types::PriceCurve;
/// use implied_core::types::DensityError;
///
/// let curve = PriceCurve::new(vec![90.0, 100.0, 110.0], vec![11.0, 4.0, 1.0]).unwrap();
/// assert_eq!(curve.len(), 3);
///
/// let dup = PriceCurve::new(vec![100.0, 100.0, 105.0], vec![5.0, 5.0, 3.0]);
/// assert!(matches!(dup, Err(DensityError::DegenerateCurve { .. })));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCurve {
    strikes: Vec<f64>,
    prices: Vec<f64>,
    implied_vols: Vec<f64>,
}

impl PriceCurve {
    /// Build a curve from already-sorted strikes and prices.
    ///
    /// # Errors
    ///
    /// * `DensityError::InvalidQuote` - Mismatched lengths or non-finite values
    /// * `DensityError::InsufficientData` - Fewer than 3 strikes
    /// * `DensityError::DegenerateCurve` - Strikes not strictly increasing
    pub fn new(strikes: Vec<f64>, prices: Vec<f64>) -> Result<Self, DensityError> {
        let implied_vols = vec![0.0; strikes.len()];
        Self::with_implied_vols(strikes, prices, implied_vols)
    }

    /// Build a curve carrying one implied vol per strike.
    pub fn with_implied_vols(
        strikes: Vec<f64>,
        prices: Vec<f64>,
        implied_vols: Vec<f64>,
    ) -> Result<Self, DensityError> {
        if strikes.len() != prices.len() || strikes.len() != implied_vols.len() {
            return Err(DensityError::InvalidQuote(format!(
                "strikes, prices and vols must have same length: got {}, {} and {}",
                strikes.len(),
                prices.len(),
                implied_vols.len()
            )));
        }

        if strikes.len() < MIN_CURVE_POINTS {
            return Err(DensityError::InsufficientData {
                got: strikes.len(),
                need: MIN_CURVE_POINTS,
            });
        }

        if let Some(i) = strikes
            .iter()
            .zip(prices.iter())
            .position(|(k, p)| !k.is_finite() || !p.is_finite())
        {
            return Err(DensityError::InvalidQuote(format!(
                "non-finite strike or price at index {}",
                i
            )));
        }

        for i in 1..strikes.len() {
            if strikes[i] <= strikes[i - 1] {
                return Err(DensityError::DegenerateCurve {
                    index: i,
                    strike: strikes[i],
                });
            }
        }

        Ok(Self {
            strikes,
            prices,
            implied_vols,
        })
    }

    /// Build a curve from one quote bucket.
    ///
    /// Quotes failing [`OptionQuote::is_usable`] are dropped and the rest
    /// sorted ascending by strike before validation.
    pub fn from_quotes(quotes: &[OptionQuote], min_price: f64) -> Result<Self, DensityError> {
        let mut usable: Vec<OptionQuote> = quotes
            .iter()
            .filter(|q| q.is_usable(min_price))
            .copied()
            .collect();
        usable.sort_by(|a, b| a.strike.total_cmp(&b.strike));

        let strikes = usable.iter().map(|q| q.strike).collect();
        let prices = usable.iter().map(|q| q.mark_price).collect();
        let vols = usable.iter().map(|q| q.implied_vol).collect();
        Self::with_implied_vols(strikes, prices, vols)
    }

    /// Sorted strikes.
    #[inline]
    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    /// Prices in strike order.
    #[inline]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Implied vols in strike order.
    #[inline]
    pub fn implied_vols(&self) -> &[f64] {
        &self.implied_vols
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    /// Always false for a constructed curve.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// Implied vol of the quoted strike closest to `strike`.
    pub fn nearest_implied_vol(&self, strike: f64) -> f64 {
        let pos = self.strikes.partition_point(|&k| k < strike);
        let idx = if pos == 0 {
            0
        } else if pos >= self.strikes.len() {
            self.strikes.len() - 1
        } else if (strike - self.strikes[pos - 1]) <= (self.strikes[pos] - strike) {
            pos - 1
        } else {
            pos
        };
        self.implied_vols[idx]
    }
}
