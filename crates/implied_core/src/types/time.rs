//! Expiry labels and year fractions.
//!
//! Exchange option expiries are labelled `DMMMYY` or `DDMMMYY` (e.g. `7NOV25`,
//! `14OCT25`) and settle at 08:00 UTC. Year fractions are ACT/365 on the exact
//! elapsed time, measured against an injected valuation instant rather than
//! the wall clock.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use implied_core::types::time::{parse_expiry_label, ExpiryInfo};
//!
//! let expiration = parse_expiry_label("14OCT25").unwrap();
//! assert_eq!(expiration, Utc.with_ymd_and_hms(2025, 10, 14, 8, 0, 0).unwrap());
//!
//! let as_of = Utc.with_ymd_and_hms(2025, 10, 4, 8, 0, 0).unwrap();
//! let info = ExpiryInfo::from_label("14OCT25", as_of).unwrap();
//! assert!((info.days_to_expiry() - 10.0).abs() < 1e-9);
//! ```

use chrono::{DateTime, TimeZone, Utc};

use super::error::DateError;

/// Day count denominator (ACT/365).
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Settlement hour (UTC) of exchange-listed expiries.
pub const EXPIRY_HOUR_UTC: u32 = 8;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Parse an exchange expiry label into its UTC settlement instant.
///
/// # Errors
///
/// * `DateError::ParseError` - Label does not match `D(D)MMMYY`
/// * `DateError::InvalidDate` - Components do not form a calendar date
pub fn parse_expiry_label(label: &str) -> Result<DateTime<Utc>, DateError> {
    let label = label.trim();
    let digits = label.chars().take_while(|c| c.is_ascii_digit()).count();
    if !(1..=2).contains(&digits) || label.len() != digits + 5 || !label.is_ascii() {
        return Err(DateError::ParseError(format!(
            "expected DMMMYY or DDMMMYY, got '{}'",
            label
        )));
    }

    let day: u32 = label[..digits]
        .parse()
        .map_err(|_| DateError::ParseError(format!("bad day in '{}'", label)))?;
    let month_str = label[digits..digits + 3].to_ascii_uppercase();
    let month = MONTHS
        .iter()
        .position(|m| *m == month_str)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| DateError::ParseError(format!("unknown month '{}'", month_str)))?;
    let year: i32 = label[digits + 3..]
        .parse::<i32>()
        .map(|yy| 2000 + yy)
        .map_err(|_| DateError::ParseError(format!("bad year in '{}'", label)))?;

    Utc.with_ymd_and_hms(year, month, day, EXPIRY_HOUR_UTC, 0, 0)
        .single()
        .ok_or(DateError::InvalidDate { year, month, day })
}

/// ACT/365 year fraction between two instants. Negative if `end` precedes `start`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use implied_core::types::time::year_fraction;
///
/// let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let end = start + Duration::days(73);
/// assert!((year_fraction(start, end) - 0.2).abs() < 1e-12);
/// ```
pub fn year_fraction(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / (MILLIS_PER_DAY * DAYS_PER_YEAR)
}

/// One expiry resolved against a valuation instant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpiryInfo {
    /// Exchange label, e.g. `27DEC24`
    pub label: String,
    /// Settlement instant
    pub expiration: DateTime<Utc>,
    /// Years from valuation to settlement
    pub time_to_expiry: f64,
}

impl ExpiryInfo {
    /// Resolve an expiry with a known settlement instant.
    pub fn new(label: impl Into<String>, expiration: DateTime<Utc>, as_of: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            expiration,
            time_to_expiry: year_fraction(as_of, expiration),
        }
    }

    /// Resolve an expiry from its exchange label.
    pub fn from_label(label: &str, as_of: DateTime<Utc>) -> Result<Self, DateError> {
        let expiration = parse_expiry_label(label)?;
        Ok(Self::new(label.trim(), expiration, as_of))
    }

    /// Days from valuation to settlement.
    #[inline]
    pub fn days_to_expiry(&self) -> f64 {
        self.time_to_expiry * DAYS_PER_YEAR
    }

    /// Settlement instant in milliseconds since the Unix epoch.
    #[inline]
    pub fn expiration_millis(&self) -> i64 {
        self.expiration.timestamp_millis()
    }

    /// Whether the expiry has settled relative to the valuation instant.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.time_to_expiry <= 0.0
    }
}
