//! Derivatives of price curves sampled at non-uniform strikes.
//!
//! For three consecutive samples `(xa, fa)`, `(xb, fb)`, `(xc, fc)` with
//! `d1 = xb - xa` and `d2 = xc - xb`, the three-point stencils are
//!
//! ```text
//! f'(xb)  = (-d2² fa + (d2² - d1²) fb + d1² fc) / (d1 d2 (d1 + d2))
//! f''(xb) = 2 (fa d2 + fc d1 - fb (d1 + d2)) / (d1 d2 (d1 + d2))
//! ```
//!
//! On a uniform grid (`d1 = d2 = h`) they reduce to the central differences
//! `(fc - fa) / 2h` and `(fa - 2fb + fc) / h²`. Boundary samples get no value.
//!
//! A stencil is singular when `d1 d2 (d1 + d2)` vanishes. The check is made
//! scale-free by comparing `d1 d2 (d1 + d2) / (d1 + d2)³`, which lies in
//! `(0, 1/4]`, against a threshold.

use crate::types::{DensityError, PriceCurve};

/// Default lower bound on the scale-free stencil measure `d1 d2 / (d1 + d2)²`.
pub const DEFAULT_DEGENERATE_EPSILON: f64 = 1e-9;

/// Finite-difference differentiator for [`PriceCurve`]s.
///
/// # Example
///
/// ```
/// use implied_core::math::differentiation::CurveDifferentiator;
/// use implied_core::types::PriceCurve;
///
/// // f(x) = x² has f'' = 2 everywhere
/// let curve = PriceCurve::new(vec![0.0, 1.0, 3.0, 4.0], vec![0.0, 1.0, 9.0, 16.0]).unwrap();
/// let d2 = CurveDifferentiator::default().second_derivatives(&curve).unwrap();
/// assert!(d2.iter().all(|v| (v - 2.0).abs() < 1e-12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveDifferentiator {
    /// Stencils whose measure `d1 d2 (d1 + d2) / (d1 + d2)³` is at or below this
    /// value fail with `DensityError::DegenerateCurve`.
    pub degenerate_epsilon: f64,
}

impl Default for CurveDifferentiator {
    fn default() -> Self {
        Self {
            degenerate_epsilon: DEFAULT_DEGENERATE_EPSILON,
        }
    }
}

impl CurveDifferentiator {
    /// Create a differentiator with a custom singularity threshold.
    pub fn new(degenerate_epsilon: f64) -> Self {
        Self { degenerate_epsilon }
    }

    /// Second derivative at each interior strike: `n - 2` values for `n` samples.
    ///
    /// # Errors
    ///
    /// `DensityError::DegenerateCurve` if any stencil is near-singular.
    pub fn second_derivatives(&self, curve: &PriceCurve) -> Result<Vec<f64>, DensityError> {
        self.apply(curve, |fa, fb, fc, d1, d2, denom| {
            2.0 * (fa * d2 + fc * d1 - fb * (d1 + d2)) / denom
        })
    }

    /// First derivative at each interior strike: `n - 2` values for `n` samples.
    ///
    /// # Errors
    ///
    /// `DensityError::DegenerateCurve` if any stencil is near-singular.
    pub fn first_derivatives(&self, curve: &PriceCurve) -> Result<Vec<f64>, DensityError> {
        self.apply(curve, |fa, fb, fc, d1, d2, denom| {
            (-d2 * d2 * fa + (d2 * d2 - d1 * d1) * fb + d1 * d1 * fc) / denom
        })
    }

    fn apply<F>(&self, curve: &PriceCurve, stencil: F) -> Result<Vec<f64>, DensityError>
    where
        F: Fn(f64, f64, f64, f64, f64, f64) -> f64,
    {
        let xs = curve.strikes();
        let fs = curve.prices();

        xs.windows(3)
            .zip(fs.windows(3))
            .enumerate()
            .map(|(i, (x, f))| {
                let d1 = x[1] - x[0];
                let d2 = x[2] - x[1];
                let span = d1 + d2;
                let denom = d1 * d2 * span;
                if d1 <= 0.0 || d2 <= 0.0 || denom <= self.degenerate_epsilon * span.powi(3) {
                    let index = if d1 <= d2 { i + 1 } else { i + 2 };
                    return Err(DensityError::DegenerateCurve {
                        index,
                        strike: xs[index],
                    });
                }
                Ok(stencil(f[0], f[1], f[2], d1, d2, denom))
            })
            .collect()
    }
}
