//! Multi-expiry probability surfaces.
//!
//! Distributions from several expiries of one currency are resampled onto a
//! shared uniform price axis and stacked along a days-to-expiry time axis.
//!
//! - [`PriceAxis`]: the shared price axis
//! - [`SurfaceAssembler`]: resampling, ordering checks and column summaries
//! - [`SurfaceGrid`]: the dense `[price][time]` grid
//! - [`QuantileSet`]: per-column quantiles by cumulative mass

mod assembler;
mod axis;
mod grid;
mod quantiles;

pub use assembler::{OmittedColumn, ProbabilitySurface, SurfaceAssembler, SurfaceColumn};
pub use axis::PriceAxis;
pub use grid::SurfaceGrid;
pub use quantiles::{quantile, QuantileSet, QUANTILE_LEVELS};
