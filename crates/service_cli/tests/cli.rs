//! End-to-end runs of the `implied` binary.

use std::path::Path;
use std::process::Command;

fn implied() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_implied"));
    cmd.env_remove("RUST_LOG");
    for key in [
        "IMPLIED_CURRENCIES",
        "IMPLIED_METHOD",
        "IMPLIED_MAX_DAYS",
        "IMPLIED_PRICE_POINTS",
        "IMPLIED_LOG_LEVEL",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

/// Softplus call prices and parity puts for two BTC expiries.
fn write_snapshot_csv(path: &Path) {
    let mut rows = vec![
        "currency,expiry,strike,option_type,mark_price,mark_iv,underlying_price".to_string(),
    ];
    for (expiry, width) in [("14MAR25", 12.0_f64), ("28MAR25", 18.0)] {
        for i in 0..21 {
            let strike = 50.0 + 5.0 * i as f64;
            let call = width * (1.0 + ((100.0 - strike) / width).exp()).ln();
            let put = call - 100.0 + strike;
            rows.push(format!("BTC,{},{},call,{},0.6,100", expiry, strike, call));
            rows.push(format!("BTC,{},{},put,{},0.6,100", expiry, strike, put));
        }
    }
    std::fs::write(path, rows.join("\n")).unwrap();
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_run_writes_both_documents() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("snapshot.csv");
    write_snapshot_csv(&input);
    let out = dir.path().join("out");

    let status = implied()
        .args(["--config"])
        .arg(dir.path().join("missing.toml"))
        .args(["run", "--as-of", "2025-03-01T08:00:00Z", "--price-points", "50"])
        .arg("--input")
        .arg(&input)
        .arg("--output-dir")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let extraction = read_json(&out.join("implied_probabilities.json"));
    assert_eq!(extraction["timestamp"], "2025-03-01T08:00:00Z");
    let btc = extraction["currencies"]["BTC"].as_object().unwrap();
    assert_eq!(btc.len(), 2);
    assert!(btc["14MAR25"]["combined_probabilities"].as_array().unwrap().len() > 10);

    let surface = read_json(&out.join("probability_surface.json"));
    let combined = &surface["currencies"]["BTC"]["combined_surface"];
    assert_eq!(combined["option_type"], "combined");
    assert_eq!(combined["grid"]["prices"].as_array().unwrap().len(), 50);
    assert_eq!(combined["grid"]["time_unix"].as_array().unwrap().len(), 2);
}

#[test]
fn test_extract_then_surface() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("snapshot.csv");
    write_snapshot_csv(&input);
    let extraction = dir.path().join("extraction.json");
    let surface = dir.path().join("surface.json");

    let status = implied()
        .arg("extract")
        .arg("--input")
        .arg(&input)
        .args(["--as-of", "2025-03-01"])
        .arg("--output")
        .arg(&extraction)
        .status()
        .unwrap();
    assert!(status.success());

    let status = implied()
        .arg("surface")
        .arg("--input")
        .arg(&extraction)
        .arg("--output")
        .arg(&surface)
        .status()
        .unwrap();
    assert!(status.success());

    let doc = read_json(&surface);
    assert_eq!(doc["method"], "finite-diff");
    let stats = doc["currencies"]["BTC"]["combined_statistics"]["statistics"]
        .as_array()
        .unwrap();
    assert_eq!(stats.len(), 2);
    assert!(stats[0]["days_to_expiry"].as_f64().unwrap() < stats[1]["days_to_expiry"].as_f64().unwrap());
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("implied.toml");
    std::fs::write(&config, "[surface]\nprice_points = 1\n").unwrap();

    let output = implied().arg("--config").arg(&config).arg("check").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("price_points = 1"));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let status = implied()
        .arg("--config")
        .arg(dir.path().join("none.toml"))
        .args(["extract", "--input"])
        .arg(dir.path().join("absent.json"))
        .status()
        .unwrap();
    assert!(!status.success());
}
