//! Error types for structured error handling.
//!
//! This module provides:
//! - `DensityError`: Failures while turning option quotes into distributions and surfaces
//! - `InterpolationError`: Errors from interpolation operations
//! - `DateError`: Errors from expiry label parsing

use thiserror::Error;

/// Density extraction and surface assembly errors.
///
/// The first group of variants is isolated per expiry (or per side of an expiry)
/// and never aborts a batch; `OutOfOrderExpiry` and `EmptyInput` are structural
/// and abort the surface of the affected currency.
///
/// # Examples
/// ```
/// use implied_core::types::DensityError;
///
/// let err = DensityError::InsufficientData { got: 2, need: 3 };
/// assert!(format!("{}", err).contains("got 2"));
/// assert!(!err.is_structural());
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DensityError {
    /// Fewer strikes than a centred second derivative needs.
    #[error("Insufficient data: got {got} strikes, need at least {need}")]
    InsufficientData {
        /// Number of usable strikes supplied
        got: usize,
        /// Minimum number of strikes required
        need: usize,
    },

    /// Duplicate or near-duplicate strikes producing a near-singular stencil.
    #[error("Degenerate curve at index {index} (strike {strike})")]
    DegenerateCurve {
        /// Index of the offending strike in the sorted curve
        index: usize,
        /// The offending strike
        strike: f64,
    },

    /// Density carries no usable probability mass.
    #[error("Density has (near-)zero total mass: {total}")]
    ZeroMass {
        /// Total mass found before normalisation
        total: f64,
    },

    /// Expiries are not strictly increasing in time.
    #[error("Expiry at index {index} is out of order: {days} days after {previous_days} days")]
    OutOfOrderExpiry {
        /// Index of the offending expiry
        index: usize,
        /// Days to expiry of the preceding entry
        previous_days: f64,
        /// Days to expiry of the offending entry
        days: f64,
    },

    /// No input left to work with.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Expiry already settled relative to the valuation instant.
    #[error("Expiry {label} has expired (time to expiry {time_to_expiry})")]
    Expired {
        /// Expiry label
        label: String,
        /// Time to expiry in years (non-positive)
        time_to_expiry: f64,
    },

    /// Malformed quote data.
    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    /// Malformed price axis.
    #[error("Invalid price axis: {0}")]
    InvalidAxis(String),

    /// Expiry label could not be parsed.
    #[error("Invalid expiry: {0}")]
    InvalidExpiry(#[from] DateError),

    /// Interpolation failure.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),
}

impl DensityError {
    /// Whether the error aborts a whole currency rather than a single expiry.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DensityError::OutOfOrderExpiry { .. } | DensityError::EmptyInput(_)
        )
    }
}

/// Interpolation-related errors.
///
/// # Variants
/// - `OutOfBounds`: Query point outside valid interpolation domain
/// - `InsufficientData`: Not enough data points for interpolation
/// - `NonMonotonicData`: Abscissae are not strictly increasing
/// - `InvalidInput`: General invalid input error
///
/// # Examples
/// ```
/// use implied_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(format!("{}", err).contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationError {
    /// Query point outside valid interpolation domain.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data points for interpolation.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Abscissae are not strictly increasing.
    #[error("Data is not monotonic at index {index}")]
    NonMonotonicData {
        /// Index where monotonicity violation was detected
        index: usize,
    },

    /// Invalid input data or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Expiry date errors.
///
/// # Examples
/// ```
/// use implied_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2025, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2025-2-30");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse an expiry label.
    #[error("Date parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(DensityError::EmptyInput("no expiries".to_string()).is_structural());
        assert!(DensityError::OutOfOrderExpiry {
            index: 1,
            previous_days: 10.0,
            days: 5.0
        }
        .is_structural());
        assert!(!DensityError::ZeroMass { total: 0.0 }.is_structural());
        assert!(!DensityError::DegenerateCurve {
            index: 1,
            strike: 100.0
        }
        .is_structural());
    }

    #[test]
    fn test_out_of_order_display() {
        let err = DensityError::OutOfOrderExpiry {
            index: 1,
            previous_days: 10.0,
            days: 5.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("index 1"));
        assert!(msg.contains("5 days after 10 days"));
    }

    #[test]
    fn test_from_interpolation_error() {
        let err: DensityError = InterpolationError::InsufficientData { got: 1, need: 2 }.into();
        assert!(matches!(err, DensityError::Interpolation(_)));
    }

    #[test]
    fn test_from_date_error() {
        let err: DensityError = DateError::ParseError("bad".to_string()).into();
        assert!(err.to_string().contains("bad"));
    }
}
