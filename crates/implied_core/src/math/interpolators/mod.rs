//! Interpolation methods for numerical computation.
//!
//! Interpolators are generic over `T: num_traits::Float`.
//!
//! ## Available Interpolators
//!
//! - [`LinearInterpolator`]: Piecewise linear interpolation between data points,
//!   used to resample densities onto shared price grids
//! - [`CubicSplineInterpolator`]: Natural cubic spline with C² continuity, used
//!   as the smooth alternative to finite differences on option price curves
//!
//! ## Core Trait
//!
//! Both implement [`Interpolator`]:
//! - `interpolate(x: T) -> Result<T, InterpolationError>`
//! - `domain() -> (T, T)`
//!
//! ## Example
//!
//! ```
//! use implied_core::math::interpolators::{Interpolator, LinearInterpolator};
//!
//! let xs = [0.0, 1.0, 2.0, 3.0];
//! let ys: [f64; 4] = [0.0, 1.0, 4.0, 9.0];
//!
//! let interp = LinearInterpolator::new(&xs, &ys).unwrap();
//! assert_eq!(interp.domain(), (0.0, 3.0));
//! assert!((interp.interpolate(1.5).unwrap() - 2.5).abs() < 1e-10);
//! assert_eq!(interp.interpolate_or(7.0, 0.0), 0.0);
//! ```

mod cubic_spline;
mod linear;
mod traits;

pub use cubic_spline::CubicSplineInterpolator;
pub use linear::LinearInterpolator;
pub use traits::Interpolator;
