//! End-to-end scenarios for extraction and surface assembly.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use implied_core::types::{DensityError, ExpiryInfo, OptionQuote, PriceCurve};
use implied_density::surface::{quantile, PriceAxis, QuantileSet, SurfaceAssembler};
use implied_density::{
    DensityConfig, DensityExtractor, DensityPipeline, DensityPoint, DifferentiationMethod,
    Distribution, DistributionNormaliser, ExpiryChain, MarketSnapshot, SurfaceConfig,
    SurfaceDocument, SurfaceKind,
};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

fn expiry_in(days: i64) -> ExpiryInfo {
    ExpiryInfo::new(format!("D{}", days), as_of() + Duration::days(days), as_of())
}

fn distribution(days: i64, strikes: &[f64], probs: &[f64]) -> Distribution {
    let points = strikes
        .iter()
        .zip(probs)
        .map(|(&k, &p)| DensityPoint::new(k, p, 0.5))
        .collect();
    Distribution::new(points, 100.0, expiry_in(days), 1e-6).unwrap()
}

fn quotes(strikes: &[f64], prices: &[f64]) -> Vec<OptionQuote> {
    strikes
        .iter()
        .zip(prices)
        .map(|(&k, &p)| OptionQuote::new(k, p, 0.65))
        .collect()
}

/// Chain with Black-Scholes-like convex call and put prices around 100.
fn smooth_chain(days: i64) -> ExpiryChain {
    let strikes: Vec<f64> = (0..21).map(|i| 50.0 + 5.0 * i as f64).collect();
    let width = 10.0 + days as f64 / 3.0;
    let calls: Vec<f64> = strikes
        .iter()
        .map(|k| width * (1.0 + ((100.0 - k) / width).exp()).ln())
        .collect();
    let puts: Vec<f64> = strikes
        .iter()
        .zip(&calls)
        .map(|(k, c)| c - 100.0 + k)
        .collect();

    let mut chain = ExpiryChain::new(format!("D{}", days), 100.0);
    chain.expiration = Some(as_of() + Duration::days(days));
    chain.calls = quotes(&strikes, &calls);
    chain.puts = quotes(&strikes, &puts);
    chain
}

fn flat_chain(days: i64) -> ExpiryChain {
    let strikes = [80.0, 90.0, 100.0, 110.0, 120.0];
    let mut chain = ExpiryChain::new(format!("D{}", days), 100.0);
    chain.expiration = Some(as_of() + Duration::days(days));
    chain.calls = quotes(&strikes, &[5.0; 5]);
    chain.puts = quotes(&strikes, &[5.0; 5]);
    chain
}

#[test]
fn test_triangular_density_normalises_to_itself() {
    let raw: Vec<DensityPoint> = [90.0, 95.0, 100.0, 105.0, 110.0]
        .iter()
        .zip([0.0, 0.0, 1.0, 0.0, 0.0])
        .map(|(&k, p)| DensityPoint::new(k, p, 0.5))
        .collect();

    let normalised = DistributionNormaliser::new(&DensityConfig::default())
        .normalise(raw)
        .unwrap();
    let probs: Vec<f64> = normalised.iter().map(|p| p.probability).collect();
    assert_eq!(probs, vec![0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_duplicate_strikes_are_degenerate() {
    let curve = PriceCurve::new(vec![100.0, 100.0, 105.0], vec![5.0, 5.0, 3.0]);
    assert!(matches!(
        curve,
        Err(DensityError::DegenerateCurve { index: 1, .. })
    ));

    let extractor = DensityExtractor::new(&DensityConfig::default());
    let result = extractor.extract(&quotes(&[100.0, 100.0, 105.0], &[5.0, 5.0, 3.0]));
    assert!(matches!(
        result,
        Err(DensityError::DegenerateCurve { .. })
    ));
}

#[test]
fn test_single_expiry_surface_reproduces_distribution() {
    let strikes = [90.0, 95.0, 100.0, 105.0, 110.0];
    let probs = [0.1, 0.2, 0.4, 0.2, 0.1];
    let dist = distribution(14, &strikes, &probs);

    // axis nodes coincide with the strikes
    let axis = PriceAxis::new(90.0, 110.0, 5).unwrap();
    let surface = SurfaceAssembler::default().assemble(&[&dist], &axis).unwrap();
    assert_eq!(surface.grid.shape(), (5, 1));

    let column = surface.grid.column(0).unwrap();
    for (c, p) in column.iter().zip(probs) {
        assert_relative_eq!(*c, p, epsilon = 1e-12);
    }

    let direct = QuantileSet::from_weights(&strikes, &probs).unwrap();
    let from_surface = surface.columns[0].quantiles;
    for (a, b) in direct.as_array().iter().zip(from_surface.as_array()) {
        assert_relative_eq!(*a, b, epsilon = 1e-9);
    }

    // a finer axis keeps the quantiles within one strike spacing
    let fine = PriceAxis::new(80.0, 120.0, 401).unwrap();
    let surface = SurfaceAssembler::default().assemble(&[&dist], &fine).unwrap();
    assert_relative_eq!(surface.grid.column_sum(0).unwrap(), 1.0, epsilon = 1e-9);
    for (a, b) in direct.as_array().iter().zip(surface.columns[0].quantiles.as_array()) {
        assert!((a - b).abs() <= 5.0, "quantile {} vs {}", a, b);
    }
    assert_relative_eq!(
        quantile(&strikes, &probs, 0.5).unwrap(),
        surface.columns[0].quantiles.q50,
        epsilon = 5.0
    );
}

#[test]
fn test_out_of_order_expiries_rejected() {
    let strikes = [90.0, 100.0, 110.0];
    let probs = [0.25, 0.5, 0.25];
    let ten = distribution(10, &strikes, &probs);
    let five = distribution(5, &strikes, &probs);
    let axis = PriceAxis::new(80.0, 120.0, 41).unwrap();

    let result = SurfaceAssembler::default().assemble(&[&ten, &five], &axis);
    assert!(matches!(
        result,
        Err(DensityError::OutOfOrderExpiry { index: 1, .. })
    ));
}

#[test]
fn test_zero_mass_expiry_excluded_from_surface() {
    let pipeline = DensityPipeline::new(DensityConfig::default());
    let chains = vec![smooth_chain(7), flat_chain(14), smooth_chain(30)];
    let extraction = pipeline.process_currency("BTC", &chains, as_of());

    assert_eq!(extraction.expiries.len(), 2);
    assert_eq!(extraction.failures.len(), 1);
    assert_eq!(extraction.failures[0].expiry, "D14");
    assert_eq!(
        extraction.failures[0].error,
        DensityError::ZeroMass { total: 0.0 }
    );

    let surfaces = pipeline
        .build_surfaces(&extraction, &SurfaceConfig::default())
        .unwrap();
    let combined = &surfaces.surfaces[&SurfaceKind::Combined];
    assert_eq!(combined.grid.shape(), (100, 2));
    for t in 0..2 {
        assert_relative_eq!(combined.grid.column_sum(t).unwrap(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_smooth_chain_statistics_near_forward() {
    let pipeline = DensityPipeline::new(DensityConfig::default());
    let outcome = pipeline.process_expiry("BTC", &smooth_chain(30), as_of()).unwrap();
    let stats = implied_density::summarise(&outcome.combined);

    assert!((stats.expected_price - 100.0).abs() < 2.0);
    assert!(stats.std_dev > 0.0);
    assert_relative_eq!(
        stats.prob_above_current + stats.prob_below_current,
        1.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_spline_method_end_to_end() {
    let pipeline = DensityPipeline::new(DensityConfig {
        method: DifferentiationMethod::CubicSpline,
        ..DensityConfig::default()
    });
    let outcome = pipeline.process_expiry("ETH", &smooth_chain(30), as_of()).unwrap();
    let call = outcome.call.as_ref().unwrap();

    // 21 strikes -> max(100, 210) = 210 steps, endpoints excluded
    assert_eq!(call.len(), 209);
    assert_relative_eq!(call.total_mass(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_pipeline_is_idempotent() {
    let mut currencies = std::collections::BTreeMap::new();
    currencies.insert(
        "BTC".to_string(),
        vec![smooth_chain(30), smooth_chain(7), flat_chain(14)],
    );
    currencies.insert("ETH".to_string(), vec![smooth_chain(60)]);
    let snapshot = MarketSnapshot {
        as_of: as_of(),
        currencies,
    };

    let render = || {
        let pipeline = DensityPipeline::new(DensityConfig::default());
        let extractions = pipeline.process_snapshot(&snapshot);
        let results = pipeline.build_all_surfaces(&extractions, &SurfaceConfig::default());
        let doc = SurfaceDocument::new(as_of(), DifferentiationMethod::FiniteDiff, &results);
        serde_json::to_string(&doc).unwrap()
    };

    assert_eq!(render(), render());
}
