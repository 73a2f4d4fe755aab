//! Assembly of per-expiry distributions into a probability surface.
//!
//! Each distribution is linearly interpolated onto the shared price axis,
//! with zero outside its support. The interpolant is normalised by its mass
//! over the same uniform spacing extended to cover the whole support, so a
//! column sums to one when the axis covers the support and to the retained
//! share otherwise. Mass falling outside the axis is dropped, not
//! redistributed.

use implied_core::math::interpolators::{Interpolator, LinearInterpolator};
use implied_core::types::{DensityError, ExpiryInfo};
use tracing::debug;

use super::axis::PriceAxis;
use super::grid::SurfaceGrid;
use super::quantiles::QuantileSet;
use crate::distribution::Distribution;
use crate::statistics::{summarise_weights, Statistics};

/// Summary of one surface column.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceColumn {
    /// Expiry of the column
    pub expiry: ExpiryInfo,
    /// Spot price the distribution was extracted against
    pub underlying_price: f64,
    /// Share of the distribution's mass inside the price axis
    pub retained_mass: f64,
    /// Quantiles of the column by cumulative mass
    pub quantiles: QuantileSet,
    /// Moments of the column, normalised by its retained mass
    pub statistics: Statistics,
}

/// A distribution that produced no column.
#[derive(Debug, Clone, PartialEq)]
pub struct OmittedColumn {
    /// Expiry label
    pub expiry: String,
    /// Why the column was dropped
    pub error: DensityError,
}

/// Assembled surface with per-column summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilitySurface {
    /// Dense `[price][time]` grid
    pub grid: SurfaceGrid,
    /// One summary per grid column, in time order
    pub columns: Vec<SurfaceColumn>,
    /// Distributions left out of the grid
    pub omitted: Vec<OmittedColumn>,
}

/// Resamples distributions onto a price axis and stacks them by expiry.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use implied_core::types::ExpiryInfo;
/// use implied_density::surface::{PriceAxis, SurfaceAssembler};
/// use implied_density::{DensityPoint, Distribution};
///
/// let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
/// let expiry = ExpiryInfo::from_label("31JAN25", as_of).unwrap();
/// let points = vec![
///     DensityPoint::new(90.0, 0.25, 0.5),
///     DensityPoint::new(100.0, 0.5, 0.5),
///     DensityPoint::new(110.0, 0.25, 0.5),
/// ];
/// let dist = Distribution::new(points, 100.0, expiry, 1e-6).unwrap();
/// let axis = PriceAxis::new(80.0, 120.0, 41).unwrap();
///
/// let surface = SurfaceAssembler::default().assemble(&[&dist], &axis).unwrap();
/// assert_eq!(surface.grid.shape(), (41, 1));
/// assert!((surface.grid.column_sum(0).unwrap() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SurfaceAssembler {
    mass_epsilon: f64,
}

impl Default for SurfaceAssembler {
    fn default() -> Self {
        Self { mass_epsilon: 1e-15 }
    }
}

impl SurfaceAssembler {
    /// Create an assembler treating mass at or below `mass_epsilon` as zero.
    pub fn new(mass_epsilon: f64) -> Self {
        Self { mass_epsilon }
    }

    /// Assemble distributions, which must be in strictly increasing expiry
    /// order, onto `axis`.
    ///
    /// A distribution leaving no mass on the axis is omitted and reported in
    /// [`ProbabilitySurface::omitted`].
    ///
    /// # Errors
    ///
    /// - `DensityError::EmptyInput` when there is nothing to assemble or
    ///   every column was omitted
    /// - `DensityError::OutOfOrderExpiry` when days to expiry do not
    ///   strictly increase
    pub fn assemble(
        &self,
        distributions: &[&Distribution],
        axis: &PriceAxis,
    ) -> Result<ProbabilitySurface, DensityError> {
        if distributions.is_empty() {
            return Err(DensityError::EmptyInput(
                "no distributions to assemble".to_string(),
            ));
        }

        for (i, pair) in distributions.windows(2).enumerate() {
            let (previous_days, days) = (pair[0].days_to_expiry(), pair[1].days_to_expiry());
            if !(days > previous_days) {
                return Err(DensityError::OutOfOrderExpiry {
                    index: i + 1,
                    previous_days,
                    days,
                });
            }
        }

        let prices = axis.values();
        let mut time_axis = Vec::with_capacity(distributions.len());
        let mut columns = Vec::with_capacity(distributions.len());
        let mut summaries = Vec::with_capacity(distributions.len());
        let mut omitted = Vec::new();

        for dist in distributions {
            match self.column(dist, axis, &prices) {
                Ok((column, summary)) => {
                    time_axis.push(dist.days_to_expiry());
                    columns.push(column);
                    summaries.push(summary);
                }
                Err(error) => {
                    debug!(expiry = %dist.expiry().label, %error, "omitting surface column");
                    omitted.push(OmittedColumn {
                        expiry: dist.expiry().label.clone(),
                        error,
                    });
                }
            }
        }

        if columns.is_empty() {
            return Err(DensityError::EmptyInput(format!(
                "none of {} distributions left mass on the price axis [{}, {}]",
                distributions.len(),
                axis.min(),
                axis.max()
            )));
        }

        Ok(ProbabilitySurface {
            grid: SurfaceGrid::from_columns(time_axis, prices, &columns),
            columns: summaries,
            omitted,
        })
    }

    fn column(
        &self,
        dist: &Distribution,
        axis: &PriceAxis,
        prices: &[f64],
    ) -> Result<(Vec<f64>, SurfaceColumn), DensityError> {
        let (column, retained_mass) = self.resample(dist, axis)?;
        let missing = DensityError::ZeroMass {
            total: retained_mass,
        };
        let quantiles = QuantileSet::from_weights(prices, &column).ok_or_else(|| missing.clone())?;
        let statistics =
            summarise_weights(prices, &column, dist.underlying_price()).ok_or(missing)?;

        Ok((
            column,
            SurfaceColumn {
                expiry: dist.expiry().clone(),
                underlying_price: dist.underlying_price(),
                retained_mass,
                quantiles,
                statistics,
            },
        ))
    }

    /// Resampled column and the share of mass it retains.
    ///
    /// # Errors
    ///
    /// `DensityError::ZeroMass` for a single-point distribution or when no
    /// mass lands on the axis.
    pub fn resample(
        &self,
        dist: &Distribution,
        axis: &PriceAxis,
    ) -> Result<(Vec<f64>, f64), DensityError> {
        if dist.len() < 2 {
            return Err(DensityError::ZeroMass { total: 0.0 });
        }
        let interp = LinearInterpolator::new(&dist.strikes(), &dist.probabilities())?;

        let mut column: Vec<f64> = (0..axis.len() as i64)
            .map(|i| interp.interpolate_or(axis.at(i), 0.0))
            .collect();
        let inside: f64 = column.iter().sum();

        // Grid nodes beyond either end of the axis that still fall on the support
        let (lo, hi) = interp.domain();
        let step = axis.step();
        let first = ((lo - axis.min()) / step).ceil() as i64;
        let last = ((hi - axis.min()) / step).floor() as i64;
        let n = axis.len() as i64;
        let outside: f64 = (first..(last + 1).min(0))
            .chain(first.max(n)..=last)
            .map(|k| interp.interpolate_or(axis.at(k), 0.0))
            .sum();

        let total = inside + outside;
        if !(total > self.mass_epsilon) {
            return Err(DensityError::ZeroMass { total });
        }

        for v in column.iter_mut() {
            *v /= total;
        }
        let retained = inside / total;
        if !(retained > self.mass_epsilon) {
            return Err(DensityError::ZeroMass { total: retained });
        }
        Ok((column, retained))
    }
}
