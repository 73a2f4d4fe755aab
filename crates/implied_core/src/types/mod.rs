//! Core quote, curve, time and error types.
//!
//! This module provides:
//! - `quote`: Option quotes and the call/put side marker
//! - `curve`: Validated price-vs-strike curves
//! - `time`: Expiry label parsing and year fractions
//! - `error`: Structured error types for density extraction, interpolation and dates
//!
//! # Re-exports
//!
//! Commonly used types are re-exported at this module level.

pub mod curve;
pub mod error;
pub mod quote;
pub mod time;

pub use curve::PriceCurve;
pub use error::{DateError, DensityError, InterpolationError};
pub use quote::{OptionQuote, OptionSide};
pub use time::{parse_expiry_label, year_fraction, ExpiryInfo, DAYS_PER_YEAR};
