//! Option quotes as delivered by the market data collaborator.
//!
//! # Examples
//!
//! ```
//! use implied_core::types::quote::{OptionQuote, OptionSide};
//!
//! let quote = OptionQuote::new(60_000.0, 0.042, 55.0);
//! assert!(quote.is_usable(0.0));
//!
//! let side: OptionSide = "P".parse().unwrap();
//! assert_eq!(side, OptionSide::Put);
//! assert_eq!(side.code(), "P");
//! ```

use std::fmt;
use std::str::FromStr;

use super::error::DensityError;

/// Side of an option quote bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionSide {
    /// Call options
    Call,
    /// Put options
    Put,
}

impl OptionSide {
    /// Both sides, calls first.
    pub const ALL: [OptionSide; 2] = [OptionSide::Call, OptionSide::Put];

    /// Single-letter exchange code (`C` or `P`).
    pub fn code(&self) -> &'static str {
        match self {
            OptionSide::Call => "C",
            OptionSide::Put => "P",
        }
    }

    /// Plural label used in payloads (`calls` or `puts`).
    pub fn plural(&self) -> &'static str {
        match self {
            OptionSide::Call => "calls",
            OptionSide::Put => "puts",
        }
    }
}

impl FromStr for OptionSide {
    type Err = DensityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "call" | "calls" => Ok(OptionSide::Call),
            "p" | "put" | "puts" => Ok(OptionSide::Put),
            other => Err(DensityError::InvalidQuote(format!(
                "unknown option side '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSide::Call => write!(f, "call"),
            OptionSide::Put => write!(f, "put"),
        }
    }
}

/// A single option quote within one `(currency, expiry, side)` bucket.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionQuote {
    /// Strike price
    pub strike: f64,
    /// Market mark price
    pub mark_price: f64,
    /// Mark implied volatility
    #[cfg_attr(feature = "serde", serde(rename = "mark_iv", alias = "implied_vol", default))]
    pub implied_vol: f64,
}

impl OptionQuote {
    /// Create a quote.
    pub fn new(strike: f64, mark_price: f64, implied_vol: f64) -> Self {
        Self {
            strike,
            mark_price,
            implied_vol,
        }
    }

    /// Whether the quote can take part in a price curve.
    ///
    /// Requires a finite positive strike and a finite mark price strictly
    /// above `min_price`.
    #[inline]
    pub fn is_usable(&self, min_price: f64) -> bool {
        self.strike.is_finite()
            && self.strike > 0.0
            && self.mark_price.is_finite()
            && self.mark_price > min_price
    }
}
