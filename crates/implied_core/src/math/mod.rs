//! Numerical building blocks.
//!
//! - [`interpolators`]: 1D interpolation (linear, natural cubic spline)
//! - [`differentiation`]: derivatives of price curves sampled at non-uniform strikes

pub mod differentiation;
pub mod interpolators;
