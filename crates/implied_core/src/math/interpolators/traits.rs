//! Common interface of 1D interpolators.

use crate::types::InterpolationError;
use num_traits::Float;

/// A 1D interpolant over a closed domain.
pub trait Interpolator<T: Float> {
    /// Interpolated value at `x`.
    ///
    /// # Errors
    ///
    /// `InterpolationError::OutOfBounds` when `x` lies outside [`Interpolator::domain`].
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Closed interval `(x_min, x_max)` of valid query points.
    fn domain(&self) -> (T, T);

    /// Interpolated value at `x`, or `fill` outside the domain.
    fn interpolate_or(&self, x: T, fill: T) -> T {
        self.interpolate(x).unwrap_or(fill)
    }

    /// Whether `x` lies inside the domain.
    #[inline]
    fn contains(&self, x: T) -> bool {
        let (lo, hi) = self.domain();
        x >= lo && x <= hi
    }
}
