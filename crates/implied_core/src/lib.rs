//! # implied_core: Foundation for Implied Density Extraction
//!
//! ## Layer 1 (Foundation) Role
//!
//! implied_core is the bottom layer of the workspace, providing:
//! - Option quote and price curve types (`types::quote`, `types::curve`)
//! - Expiry labels and year fractions (`types::time`)
//! - Error taxonomy: `DensityError`, `InterpolationError`, `DateError` (`types::error`)
//! - Interpolators over generic `T: Float` (`math::interpolators`)
//! - Non-uniform finite-difference derivatives of price curves (`math::differentiation`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other workspace crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - chrono: Expiry timestamps
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional, on by default)
//!
//! ## Usage Examples
//!
//! ```rust
//! use implied_core::math::differentiation::CurveDifferentiator;
//! use implied_core::types::PriceCurve;
//!
//! let curve = PriceCurve::new(
//!     vec![90.0, 95.0, 100.0, 105.0, 110.0],
//!     vec![12.0, 8.0, 5.0, 3.0, 2.0],
//! )
//! .unwrap();
//!
//! let second = CurveDifferentiator::default().second_derivatives(&curve).unwrap();
//! assert_eq!(second.len(), 3);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;
