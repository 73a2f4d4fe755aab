//! Per-expiry and per-currency extraction with isolated failures.
//!
//! Every expiry is processed independently into an [`ExpiryOutcome`]. A
//! failing side or expiry is logged and collected, never aborting the batch.
//! Only structural problems (no expiries, out-of-order expiries) stop a
//! currency's surface assembly.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use implied_core::types::{DensityError, ExpiryInfo, OptionQuote, OptionSide};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{DensityConfig, SurfaceConfig};
use crate::distribution::Distribution;
use crate::extractor::DensityExtractor;
use crate::normaliser::DistributionNormaliser;
use crate::parallel::map_ordered;
use crate::surface::{PriceAxis, ProbabilitySurface, SurfaceAssembler};

/// Quotes for one expiry of one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryChain {
    /// Exchange expiry label, e.g. `27DEC25`
    pub expiry: String,
    /// Settlement instant; parsed from the label when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Spot price of the underlying
    pub underlying_price: f64,
    /// Call quotes
    #[serde(default)]
    pub calls: Vec<OptionQuote>,
    /// Put quotes
    #[serde(default)]
    pub puts: Vec<OptionQuote>,
}

impl ExpiryChain {
    /// Empty chain for an expiry label.
    pub fn new(expiry: impl Into<String>, underlying_price: f64) -> Self {
        Self {
            expiry: expiry.into(),
            expiration: None,
            underlying_price,
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }

    /// Quotes of one side.
    pub fn quotes(&self, side: OptionSide) -> &[OptionQuote] {
        match side {
            OptionSide::Call => &self.calls,
            OptionSide::Put => &self.puts,
        }
    }

    /// Mutable quotes of one side.
    pub fn quotes_mut(&mut self, side: OptionSide) -> &mut Vec<OptionQuote> {
        match side {
            OptionSide::Call => &mut self.calls,
            OptionSide::Put => &mut self.puts,
        }
    }

    /// Resolve the expiry against the valuation instant.
    pub fn resolve(&self, as_of: DateTime<Utc>) -> Result<ExpiryInfo, DensityError> {
        match self.expiration {
            Some(expiration) => Ok(ExpiryInfo::new(self.expiry.trim(), expiration, as_of)),
            None => Ok(ExpiryInfo::from_label(&self.expiry, as_of)?),
        }
    }
}

/// Option chains of every currency at one valuation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Valuation instant all times to expiry are measured from
    pub as_of: DateTime<Utc>,
    /// Expiry chains keyed by currency
    pub currencies: BTreeMap<String, Vec<ExpiryChain>>,
}

/// A failed side or expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryFailure {
    /// Currency of the expiry
    pub currency: String,
    /// Expiry label
    pub expiry: String,
    /// Failing side, `None` when the whole expiry failed
    pub side: Option<OptionSide>,
    /// Cause
    pub error: DensityError,
}

impl fmt::Display for ExpiryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            Some(side) => write!(f, "{} {} {}: {}", self.currency, self.expiry, side, self.error),
            None => write!(f, "{} {}: {}", self.currency, self.expiry, self.error),
        }
    }
}

/// Distributions extracted for one expiry.
///
/// `combined` always exists; it falls back to the single surviving side when
/// the other failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryDistributions {
    /// Resolved expiry
    pub expiry: ExpiryInfo,
    /// Spot price of the underlying
    pub underlying_price: f64,
    /// Call-side distribution
    pub call: Option<Distribution>,
    /// Put-side distribution
    pub put: Option<Distribution>,
    /// Average of both sides, renormalised
    pub combined: Distribution,
    /// Sides that failed
    pub side_failures: Vec<ExpiryFailure>,
}

impl ExpiryDistributions {
    /// Distribution for a surface kind.
    pub fn get(&self, kind: SurfaceKind) -> Option<&Distribution> {
        match kind {
            SurfaceKind::Call => self.call.as_ref(),
            SurfaceKind::Put => self.put.as_ref(),
            SurfaceKind::Combined => Some(&self.combined),
        }
    }
}

/// Result of extracting one expiry.
pub type ExpiryOutcome = Result<ExpiryDistributions, ExpiryFailure>;

/// Everything extracted for one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyExtraction {
    /// Currency code
    pub currency: String,
    /// Successful expiries in ascending expiration order
    pub expiries: Vec<ExpiryDistributions>,
    /// Failed expiries and sides
    pub failures: Vec<ExpiryFailure>,
    /// Labels skipped for lying beyond the horizon
    pub skipped: Vec<String>,
}

impl CurrencyExtraction {
    /// Every failure, whole-expiry and per-side, in processing order.
    pub fn all_failures(&self) -> Vec<&ExpiryFailure> {
        self.failures
            .iter()
            .chain(self.expiries.iter().flat_map(|e| e.side_failures.iter()))
            .collect()
    }
}

/// Which distributions a surface is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceKind {
    /// Call-side distributions
    Call,
    /// Put-side distributions
    Put,
    /// Combined distributions
    Combined,
}

impl SurfaceKind {
    /// All kinds, calls first.
    pub const ALL: [SurfaceKind; 3] = [SurfaceKind::Call, SurfaceKind::Put, SurfaceKind::Combined];

    /// Label used as `option_type` in payloads.
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceKind::Call => OptionSide::Call.plural(),
            SurfaceKind::Put => OptionSide::Put.plural(),
            SurfaceKind::Combined => "combined",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three surfaces of one currency on a shared price axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySurfaces {
    /// Currency code
    pub currency: String,
    /// Shared price axis
    pub axis: PriceAxis,
    /// Surfaces by kind; a side with no usable distributions has none
    pub surfaces: BTreeMap<SurfaceKind, ProbabilitySurface>,
    /// Side surfaces that could not be assembled
    pub failures: Vec<(SurfaceKind, DensityError)>,
}

/// A currency whose surfaces could not be assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyFailure {
    /// Currency code
    pub currency: String,
    /// Cause
    pub error: DensityError,
}

/// Runs extraction and surface assembly with one configuration.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use implied_core::types::OptionQuote;
/// use implied_density::{DensityConfig, DensityPipeline, ExpiryChain};
///
/// let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
/// let mut chain = ExpiryChain::new("31JAN25", 100.0);
/// chain.calls = vec![
///     OptionQuote::new(90.0, 12.0, 0.5),
///     OptionQuote::new(100.0, 5.0, 0.5),
///     OptionQuote::new(110.0, 1.5, 0.5),
///     OptionQuote::new(120.0, 0.4, 0.5),
/// ];
///
/// let pipeline = DensityPipeline::new(DensityConfig::default());
/// let outcome = pipeline.process_expiry("BTC", &chain, as_of).unwrap();
/// assert!(outcome.put.is_none());
/// assert_eq!(outcome.combined, outcome.call.clone().unwrap());
/// assert_eq!(outcome.side_failures.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DensityPipeline {
    config: DensityConfig,
    extractor: DensityExtractor,
    normaliser: DistributionNormaliser,
}

impl DensityPipeline {
    /// Create a pipeline.
    pub fn new(config: DensityConfig) -> Self {
        Self {
            extractor: DensityExtractor::new(&config),
            normaliser: DistributionNormaliser::new(&config),
            config,
        }
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &DensityConfig {
        &self.config
    }

    /// Normalised distribution of one side's quotes.
    pub fn side_distribution(
        &self,
        quotes: &[OptionQuote],
        expiry: &ExpiryInfo,
        underlying_price: f64,
    ) -> Result<Distribution, DensityError> {
        let raw = self.extractor.extract(quotes)?;
        let normalised = self.normaliser.normalise(raw)?;
        Distribution::new(
            normalised,
            underlying_price,
            expiry.clone(),
            self.config.normalisation_tolerance,
        )
    }

    /// Extract call, put and combined distributions for one expiry.
    pub fn process_expiry(
        &self,
        currency: &str,
        chain: &ExpiryChain,
        as_of: DateTime<Utc>,
    ) -> ExpiryOutcome {
        let failure = |side: Option<OptionSide>, error: DensityError| ExpiryFailure {
            currency: currency.to_string(),
            expiry: chain.expiry.clone(),
            side,
            error,
        };

        let expiry = chain.resolve(as_of).map_err(|e| failure(None, e))?;
        if expiry.is_expired() {
            return Err(failure(
                None,
                DensityError::Expired {
                    label: expiry.label.clone(),
                    time_to_expiry: expiry.time_to_expiry,
                },
            ));
        }
        let underlying_price = chain.underlying_price;
        if !(underlying_price.is_finite() && underlying_price > 0.0) {
            return Err(failure(
                None,
                DensityError::InvalidQuote(format!(
                    "underlying price must be positive, got {}",
                    underlying_price
                )),
            ));
        }

        let mut side_failures = Vec::new();
        let mut extract = |side: OptionSide| {
            match self.side_distribution(chain.quotes(side), &expiry, underlying_price) {
                Ok(dist) => {
                    debug!(
                        currency,
                        expiry = %expiry.label,
                        %side,
                        points = dist.len(),
                        "extracted distribution"
                    );
                    Some(dist)
                }
                Err(error) => {
                    warn!(currency, expiry = %expiry.label, %side, %error, "side extraction failed");
                    side_failures.push(failure(Some(side), error));
                    None
                }
            }
        };
        let call = extract(OptionSide::Call);
        let put = extract(OptionSide::Put);

        let combined = match (&call, &put) {
            (Some(c), Some(p)) => {
                let points = self
                    .normaliser
                    .combine(c.points(), p.points())
                    .map_err(|e| failure(None, e))?;
                Distribution::new(
                    points,
                    underlying_price,
                    expiry.clone(),
                    self.config.normalisation_tolerance,
                )
                .map_err(|e| failure(None, e))?
            }
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => {
                let error = side_failures
                    .first()
                    .map(|f| f.error.clone())
                    .unwrap_or_else(|| DensityError::EmptyInput("no quotes".to_string()));
                return Err(failure(None, error));
            }
        };

        Ok(ExpiryDistributions {
            expiry,
            underlying_price,
            call,
            put,
            combined,
            side_failures,
        })
    }

    /// Extract every expiry of one currency.
    ///
    /// Expiries beyond `max_days` are skipped. Successful expiries are
    /// returned sorted by expiration.
    pub fn process_currency(
        &self,
        currency: &str,
        chains: &[ExpiryChain],
        as_of: DateTime<Utc>,
    ) -> CurrencyExtraction {
        let mut skipped = Vec::new();
        let in_horizon: Vec<&ExpiryChain> = chains
            .iter()
            .filter(|chain| match chain.resolve(as_of) {
                Ok(info) if info.days_to_expiry() > self.config.max_days => {
                    debug!(currency, expiry = %info.label, days = info.days_to_expiry(), "beyond horizon");
                    skipped.push(chain.expiry.clone());
                    false
                }
                _ => true,
            })
            .collect();

        let outcomes = map_ordered(&in_horizon, self.config.parallel, |chain| {
            self.process_expiry(currency, chain, as_of)
        });

        let mut expiries = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(distributions) => expiries.push(distributions),
                Err(failure) => {
                    warn!(
                        currency,
                        expiry = %failure.expiry,
                        error = %failure.error,
                        "expiry extraction failed"
                    );
                    failures.push(failure);
                }
            }
        }
        expiries.sort_by(|a, b| a.expiry.expiration.cmp(&b.expiry.expiration));

        info!(
            currency,
            expiries = expiries.len(),
            failures = failures.len(),
            skipped = skipped.len(),
            "extracted currency"
        );

        CurrencyExtraction {
            currency: currency.to_string(),
            expiries,
            failures,
            skipped,
        }
    }

    /// Extract every currency of a snapshot, in currency order.
    pub fn process_snapshot(&self, snapshot: &MarketSnapshot) -> Vec<CurrencyExtraction> {
        let currencies: Vec<(&String, &Vec<ExpiryChain>)> = snapshot.currencies.iter().collect();
        map_ordered(&currencies, self.config.parallel, |(currency, chains)| {
            self.process_currency(currency, chains, snapshot.as_of)
        })
    }

    /// Assemble call, put and combined surfaces for one currency.
    ///
    /// # Errors
    ///
    /// Fails when the combined surface cannot be built: no expiries, expiries
    /// out of order, or no column left on the axis. Side surfaces that fail
    /// are recorded in [`CurrencySurfaces::failures`].
    pub fn build_surfaces(
        &self,
        extraction: &CurrencyExtraction,
        surface_config: &SurfaceConfig,
    ) -> Result<CurrencySurfaces, DensityError> {
        if extraction.expiries.is_empty() {
            return Err(DensityError::EmptyInput(format!(
                "no distributions for {}",
                extraction.currency
            )));
        }

        let all: Vec<&Distribution> = SurfaceKind::ALL
            .iter()
            .flat_map(|&kind| extraction.expiries.iter().filter_map(move |e| e.get(kind)))
            .collect();
        let axis = PriceAxis::from_config(surface_config, &all)?;
        let assembler = SurfaceAssembler::new(self.config.mass_epsilon);

        let mut surfaces = BTreeMap::new();
        let mut failures = Vec::new();
        for kind in SurfaceKind::ALL {
            let distributions: Vec<&Distribution> =
                extraction.expiries.iter().filter_map(|e| e.get(kind)).collect();
            if distributions.is_empty() {
                debug!(currency = %extraction.currency, %kind, "no distributions for surface");
                continue;
            }

            match assembler.assemble(&distributions, &axis) {
                Ok(surface) => {
                    for omitted in &surface.omitted {
                        warn!(
                            currency = %extraction.currency,
                            expiry = %omitted.expiry,
                            %kind,
                            error = %omitted.error,
                            "column omitted from surface"
                        );
                    }
                    surfaces.insert(kind, surface);
                }
                Err(error) if kind == SurfaceKind::Combined => return Err(error),
                Err(error) => {
                    warn!(currency = %extraction.currency, %kind, %error, "surface assembly failed");
                    failures.push((kind, error));
                }
            }
        }

        info!(
            currency = %extraction.currency,
            surfaces = surfaces.len(),
            price_points = axis.len(),
            "assembled surfaces"
        );

        Ok(CurrencySurfaces {
            currency: extraction.currency.clone(),
            axis,
            surfaces,
            failures,
        })
    }

    /// Assemble surfaces for every currency, one result per currency.
    pub fn build_all_surfaces(
        &self,
        extractions: &[CurrencyExtraction],
        surface_config: &SurfaceConfig,
    ) -> Vec<Result<CurrencySurfaces, CurrencyFailure>> {
        map_ordered(extractions, self.config.parallel, |extraction| {
            self.build_surfaces(extraction, surface_config)
                .map_err(|error| {
                    warn!(currency = %extraction.currency, %error, "currency surface failed");
                    CurrencyFailure {
                        currency: extraction.currency.clone(),
                        error,
                    }
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()
    }

    fn convex_quotes() -> Vec<OptionQuote> {
        [(80.0, 21.0), (90.0, 12.5), (100.0, 6.0), (110.0, 2.5), (120.0, 1.0)]
            .iter()
            .map(|&(k, p)| OptionQuote::new(k, p, 0.6))
            .collect()
    }

    fn put_quotes() -> Vec<OptionQuote> {
        [(80.0, 1.0), (90.0, 2.5), (100.0, 6.0), (110.0, 12.5), (120.0, 21.0)]
            .iter()
            .map(|&(k, p)| OptionQuote::new(k, p, 0.6))
            .collect()
    }

    fn chain(days: i64) -> ExpiryChain {
        let mut chain = ExpiryChain::new(format!("D{}", days), 100.0);
        chain.expiration = Some(as_of() + Duration::days(days));
        chain.calls = convex_quotes();
        chain.puts = put_quotes();
        chain
    }

    fn pipeline() -> DensityPipeline {
        DensityPipeline::new(DensityConfig::default())
    }

    #[test]
    fn test_both_sides_combined() {
        let outcome = pipeline().process_expiry("BTC", &chain(30), as_of()).unwrap();
        let call = outcome.call.as_ref().unwrap();
        let put = outcome.put.as_ref().unwrap();
        assert_eq!(call.strikes(), vec![90.0, 100.0, 110.0]);
        // mirror-image quotes give mirror-image masses, averaged on shared strikes
        assert!((outcome.combined.total_mass() - 1.0).abs() < 1e-12);
        assert_eq!(outcome.combined.len(), 3);
        assert!((outcome.combined.points()[0].probability
            - 0.5 * (call.points()[0].probability + put.points()[0].probability))
            .abs()
            < 1e-12);
        assert!(outcome.side_failures.is_empty());
    }

    #[test]
    fn test_expired_expiry_fails() {
        let failure = pipeline()
            .process_expiry("BTC", &chain(-1), as_of())
            .unwrap_err();
        assert!(matches!(failure.error, DensityError::Expired { .. }));
        assert_eq!(failure.side, None);
    }

    #[test]
    fn test_bad_label_fails() {
        let c = ExpiryChain::new("NOTADATE", 100.0);
        let failure = pipeline().process_expiry("ETH", &c, as_of()).unwrap_err();
        assert!(matches!(failure.error, DensityError::InvalidExpiry(_)));
        assert_eq!(failure.currency, "ETH");
    }

    #[test]
    fn test_non_positive_underlying_fails() {
        let mut c = chain(30);
        c.underlying_price = 0.0;
        let failure = pipeline().process_expiry("BTC", &c, as_of()).unwrap_err();
        assert!(matches!(failure.error, DensityError::InvalidQuote(_)));
    }

    #[test]
    fn test_both_sides_failing_fails_expiry() {
        let mut c = chain(30);
        c.calls.truncate(2);
        c.puts.clear();
        let failure = pipeline().process_expiry("BTC", &c, as_of()).unwrap_err();
        assert_eq!(
            failure.error,
            DensityError::InsufficientData { got: 2, need: 3 }
        );
    }

    #[test]
    fn test_currency_sorted_and_horizon_filtered() {
        let chains = vec![chain(60), chain(7), chain(120), chain(30)];
        let extraction = pipeline().process_currency("BTC", &chains, as_of());

        let days: Vec<f64> = extraction
            .expiries
            .iter()
            .map(|e| e.expiry.days_to_expiry().round())
            .collect();
        assert_eq!(days, vec![7.0, 30.0, 60.0]);
        assert_eq!(extraction.skipped, vec!["D120".to_string()]);
        assert!(extraction.failures.is_empty());
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let chains = vec![chain(7), chain(30), chain(60)];
        let sequential = DensityPipeline::new(DensityConfig {
            parallel: false,
            ..DensityConfig::default()
        });
        let a = sequential.process_currency("BTC", &chains, as_of());
        let b = pipeline().process_currency("BTC", &chains, as_of());
        assert_eq!(a, b);
    }

    #[test]
    fn test_surfaces_for_every_kind() {
        let chains = vec![chain(7), chain(30)];
        let extraction = pipeline().process_currency("BTC", &chains, as_of());
        let surfaces = pipeline()
            .build_surfaces(&extraction, &SurfaceConfig::default())
            .unwrap();

        assert_eq!(surfaces.surfaces.len(), 3);
        for surface in surfaces.surfaces.values() {
            assert_eq!(surface.grid.shape(), (100, 2));
        }
        assert!(surfaces.failures.is_empty());
    }

    #[test]
    fn test_surfaces_without_expiries() {
        let extraction = pipeline().process_currency("BTC", &[], as_of());
        let results = pipeline().build_all_surfaces(&[extraction], &SurfaceConfig::default());
        let failure = results[0].as_ref().unwrap_err();
        assert_eq!(failure.currency, "BTC");
        assert!(matches!(failure.error, DensityError::EmptyInput(_)));
    }
}
