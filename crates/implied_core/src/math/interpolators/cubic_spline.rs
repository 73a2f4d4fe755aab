//! Natural cubic spline interpolation.

use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Polynomial coefficients for a cubic spline segment.
///
/// Represents `y = a + b*(x-xi) + c*(x-xi)² + d*(x-xi)³`.
#[derive(Debug, Clone, Copy)]
struct SplineCoeffs<T: Float> {
    a: T,
    b: T,
    c: T,
    d: T,
}

/// Natural cubic spline interpolator with C² continuity.
///
/// Second derivatives vanish at both boundaries. Besides values, the spline
/// exposes its second derivative, which is what a density estimate needs.
///
/// # Example
///
/// ```
/// use implied_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
///
/// let xs = [0.0, 1.0, 2.0, 3.0];
/// let ys: [f64; 4] = [0.0, 1.0, 4.0, 9.0];
///
/// let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
/// assert!((spline.interpolate(2.0).unwrap() - 4.0).abs() < 1e-12);
/// assert!(spline.second_derivative(0.0).unwrap().abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CubicSplineInterpolator<T: Float> {
    /// Sorted x-coordinates
    xs: Vec<T>,
    /// Polynomial coefficients for each segment
    coeffs: Vec<SplineCoeffs<T>>,
}

impl<T: Float> CubicSplineInterpolator<T> {
    /// Construct a natural cubic spline from x and y data points.
    ///
    /// Data points are sorted by x-coordinate. Requires at least 3 points
    /// with distinct x-coordinates.
    ///
    /// # Returns
    ///
    /// * `Err(InterpolationError::InsufficientData)` - Fewer than 3 data points
    /// * `Err(InterpolationError::InvalidInput)` - Mismatched array lengths
    /// * `Err(InterpolationError::NonMonotonicData)` - Repeated x-coordinates
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }

        if xs.len() < 3 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 3,
            });
        }

        let mut pairs: Vec<(T, T)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(i) = pairs.windows(2).position(|w| w[1].0 <= w[0].0) {
            return Err(InterpolationError::NonMonotonicData { index: i + 1 });
        }

        let (sorted_xs, sorted_ys): (Vec<T>, Vec<T>) = pairs.into_iter().unzip();
        let coeffs = Self::compute_coefficients(&sorted_xs, &sorted_ys);

        Ok(Self {
            xs: sorted_xs,
            coeffs,
        })
    }

    /// Solve the tridiagonal system for the knot second derivatives `M`
    /// (Thomas algorithm, `M[0] = M[n-1] = 0`) and derive segment coefficients.
    fn compute_coefficients(xs: &[T], ys: &[T]) -> Vec<SplineCoeffs<T>> {
        let n = xs.len();
        let two = T::from(2.0).unwrap_or_else(T::one);
        let six = T::from(6.0).unwrap_or_else(T::one);

        let h: Vec<T> = xs.windows(2).map(|w| w[1] - w[0]).collect();

        // Row i (0-based) is the equation at knot i + 1:
        // h[i]*M[i] + 2*(h[i]+h[i+1])*M[i+1] + h[i+1]*M[i+2] = rhs[i]
        let interior = n - 2;
        let mut c_prime = vec![T::zero(); interior];
        let mut d_prime = vec![T::zero(); interior];

        for i in 0..interior {
            let diag = two * (h[i] + h[i + 1]);
            let rhs = six * ((ys[i + 2] - ys[i + 1]) / h[i + 1] - (ys[i + 1] - ys[i]) / h[i]);
            let sub = if i == 0 { T::zero() } else { h[i] };
            let sup = if i + 1 < interior { h[i + 1] } else { T::zero() };

            let (prev_c, prev_d) = if i == 0 {
                (T::zero(), T::zero())
            } else {
                (c_prime[i - 1], d_prime[i - 1])
            };
            let denom = diag - sub * prev_c;
            c_prime[i] = sup / denom;
            d_prime[i] = (rhs - sub * prev_d) / denom;
        }

        let mut m = vec![T::zero(); n];
        m[interior] = d_prime[interior - 1];
        for i in (0..interior - 1).rev() {
            m[i + 1] = d_prime[i] - c_prime[i] * m[i + 2];
        }

        (0..n - 1)
            .map(|i| SplineCoeffs {
                a: ys[i],
                b: (ys[i + 1] - ys[i]) / h[i] - h[i] * (two * m[i] + m[i + 1]) / six,
                c: m[i] / two,
                d: (m[i + 1] - m[i]) / (six * h[i]),
            })
            .collect()
    }

    /// Segment index `i` with `xs[i] <= x < xs[i+1]`, clamped to `[0, n-2]`.
    #[inline]
    fn find_segment(&self, x: T) -> usize {
        let pos = self.xs.partition_point(|&xi| xi <= x);
        if pos == 0 {
            0
        } else if pos >= self.xs.len() {
            self.xs.len() - 2
        } else {
            pos - 1
        }
    }

    fn check_bounds(&self, x: T) -> Result<(), InterpolationError> {
        let (x_min, x_max) = self.domain();
        if x < x_min || x > x_max {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    /// Second derivative `2c + 6d(x - xi)` of the spline at `x`.
    pub fn second_derivative(&self, x: T) -> Result<T, InterpolationError> {
        self.check_bounds(x)?;
        let i = self.find_segment(x);
        let dx = x - self.xs[i];
        let coeff = &self.coeffs[i];
        let two = T::from(2.0).unwrap_or_else(T::one);
        let six = T::from(6.0).unwrap_or_else(T::one);
        Ok(two * coeff.c + six * coeff.d * dx)
    }

    /// Returns a reference to the sorted x-coordinates.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Returns the number of data points.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a constructed spline.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl<T: Float> Interpolator<T> for CubicSplineInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        self.check_bounds(x)?;
        let i = self.find_segment(x);
        let dx = x - self.xs[i];
        let SplineCoeffs { a, b, c, d } = self.coeffs[i];
        Ok(a + dx * (b + dx * (c + dx * d)))
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_insufficient_data() {
        let result = CubicSplineInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]);
        assert_eq!(
            result.unwrap_err(),
            InterpolationError::InsufficientData { got: 2, need: 3 }
        );
    }

    #[test]
    fn test_passes_through_knots() {
        let xs = [0.0, 0.5, 1.5, 3.0, 4.0];
        let ys = [1.0, 0.2, 2.0, -1.0, 0.5];
        let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.interpolate(x).unwrap(), y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_three_points_single_interior_knot() {
        // M1 = 6*((ys2-ys1)/h1 - (ys1-ys0)/h0) / (2*(h0+h1)) = 6*(1 - (-1)) / 4 = 3
        let spline = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[1.0, 0.0, 1.0]).unwrap();
        assert_relative_eq!(spline.second_derivative(1.0).unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(spline.second_derivative(0.5).unwrap(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_natural_boundaries() {
        let spline =
            CubicSplineInterpolator::new(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 4.0, 9.0, 16.0])
                .unwrap();
        assert_relative_eq!(spline.second_derivative(0.0).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(spline.second_derivative(4.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_data_has_zero_curvature() {
        let spline =
            CubicSplineInterpolator::new(&[0.0, 1.0, 3.0, 4.0], &[1.0, 3.0, 7.0, 9.0]).unwrap();
        for x in [0.5, 1.0, 2.0, 3.5] {
            assert!(spline.second_derivative(x).unwrap().abs() < 1e-12);
            assert_relative_eq!(spline.interpolate(x).unwrap(), 1.0 + 2.0 * x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let spline = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert!(matches!(
            spline.interpolate(-0.1),
            Err(InterpolationError::OutOfBounds { .. })
        ));
        assert!(matches!(
            spline.second_derivative(2.1),
            Err(InterpolationError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_repeated_x() {
        let result = CubicSplineInterpolator::new(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 1.0, 2.0]);
        assert!(matches!(
            result,
            Err(InterpolationError::NonMonotonicData { .. })
        ));
    }
}
