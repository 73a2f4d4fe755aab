//! Input loading and output writing.
//!
//! Market snapshots come either as JSON (a serialised [`MarketSnapshot`]) or
//! as a flat CSV of quotes, one row per option:
//!
//! ```text
//! currency,expiry,strike,option_type,mark_price,mark_iv,underlying_price
//! BTC,27DEC25,90000,call,12000.5,0.55,97000
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use implied_core::types::{OptionQuote, OptionSide};
use implied_density::{ExpiryChain, ExtractionDocument, MarketSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CliError, Result};

/// Snapshot file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Serialised snapshot document
    Json,
    /// One quote per row
    Csv,
}

impl InputFormat {
    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    }
}

impl FromStr for InputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "csv" => Ok(InputFormat::Csv),
            other => Err(CliError::invalid_argument(format!(
                "Unknown format: {}. Supported: json, csv",
                other
            ))),
        }
    }
}

/// One CSV quote row.
#[derive(Debug, Deserialize)]
struct QuoteRow {
    currency: String,
    expiry: String,
    strike: f64,
    option_type: String,
    mark_price: f64,
    #[serde(default)]
    mark_iv: f64,
    underlying_price: f64,
}

/// Load a market snapshot.
///
/// `as_of` overrides the valuation instant stored in a JSON snapshot; a CSV
/// carries none, so it falls back to the current time when not given.
pub fn load_snapshot(
    path: &Path,
    format: InputFormat,
    as_of: Option<DateTime<Utc>>,
) -> Result<MarketSnapshot> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }

    let mut snapshot = match format {
        InputFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            serde_json::from_reader::<_, MarketSnapshot>(reader)?
        }
        InputFormat::Csv => {
            let as_of = as_of.unwrap_or_else(|| {
                let now = Utc::now();
                warn!("No valuation time given for CSV input, using {}", now.to_rfc3339());
                now
            });
            let reader = csv::Reader::from_path(path)?;
            snapshot_from_csv(reader, as_of)?
        }
    };

    if let Some(as_of) = as_of {
        snapshot.as_of = as_of;
    }

    info!(
        "Loaded snapshot: {} currencies, {} expiries, as of {}",
        snapshot.currencies.len(),
        snapshot.currencies.values().map(Vec::len).sum::<usize>(),
        snapshot.as_of.to_rfc3339()
    );
    Ok(snapshot)
}

fn snapshot_from_csv<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    as_of: DateTime<Utc>,
) -> Result<MarketSnapshot> {
    let mut grouped: BTreeMap<String, BTreeMap<String, ExpiryChain>> = BTreeMap::new();

    for (idx, row) in reader.deserialize::<QuoteRow>().enumerate() {
        let row = row?;
        let side = OptionSide::from_str(&row.option_type)
            .map_err(|e| CliError::invalid_argument(format!("row {}: {}", idx + 1, e)))?;

        let currency = row.currency.trim().to_uppercase();
        let chain = grouped
            .entry(currency)
            .or_default()
            .entry(row.expiry.trim().to_string())
            .or_insert_with(|| ExpiryChain::new(row.expiry.trim(), row.underlying_price));
        chain
            .quotes_mut(side)
            .push(OptionQuote::new(row.strike, row.mark_price, row.mark_iv));
    }

    let currencies = grouped
        .into_iter()
        .map(|(currency, chains)| {
            let chains = chains
                .into_values()
                .map(|mut chain| {
                    for side in OptionSide::ALL {
                        chain
                            .quotes_mut(side)
                            .sort_by(|a, b| a.strike.total_cmp(&b.strike));
                    }
                    chain
                })
                .collect();
            (currency, chains)
        })
        .collect();

    Ok(MarketSnapshot { as_of, currencies })
}

/// Keep only the configured currencies.
pub fn filter_currencies(snapshot: &mut MarketSnapshot, currencies: &[String]) {
    snapshot.currencies.retain(|currency, _| {
        let keep = currencies.iter().any(|c| c.eq_ignore_ascii_case(currency));
        if !keep {
            debug!("Skipping unconfigured currency {}", currency);
        }
        keep
    });
    for wanted in currencies {
        if !snapshot
            .currencies
            .keys()
            .any(|c| c.eq_ignore_ascii_case(wanted))
        {
            warn!("No quotes for configured currency {}", wanted);
        }
    }
}

/// Load a previously written extraction document.
pub fn load_extraction(path: &Path) -> Result<ExtractionDocument> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write a value as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    const CSV: &str = "\
currency,expiry,strike,option_type,mark_price,mark_iv,underlying_price
btc,28MAR25,110,call,2.5,0.6,100
BTC,28MAR25,90,call,12.5,0.6,100
BTC,28MAR25,100,call,6.0,0.6,100
BTC,28MAR25,90,put,2.5,0.6,100
ETH,28MAR25,3000,P,120,0.7,3100
";

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<InputFormat>().unwrap(), InputFormat::Csv);
        assert_eq!("json".parse::<InputFormat>().unwrap(), InputFormat::Json);
        assert!(matches!(
            "xml".parse::<InputFormat>(),
            Err(CliError::InvalidArgument(_))
        ));
        assert_eq!(InputFormat::from_path(Path::new("q.csv")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("q")), InputFormat::Json);
    }

    #[test]
    fn test_csv_groups_and_sorts() {
        let reader = csv::Reader::from_reader(CSV.as_bytes());
        let snapshot = snapshot_from_csv(reader, as_of()).unwrap();

        assert_eq!(snapshot.as_of, as_of());
        let btc = &snapshot.currencies["BTC"];
        assert_eq!(btc.len(), 1);
        let strikes: Vec<f64> = btc[0].calls.iter().map(|q| q.strike).collect();
        assert_eq!(strikes, vec![90.0, 100.0, 110.0]);
        assert_eq!(btc[0].puts.len(), 1);
        assert_eq!(snapshot.currencies["ETH"][0].puts[0].implied_vol, 0.7);
        assert_eq!(snapshot.currencies["ETH"][0].underlying_price, 3100.0);
    }

    #[test]
    fn test_csv_bad_side() {
        let data = "currency,expiry,strike,option_type,mark_price,mark_iv,underlying_price\n\
                    BTC,28MAR25,90,straddle,1,0.5,100\n";
        let result = snapshot_from_csv(csv::Reader::from_reader(data.as_bytes()), as_of());
        match result {
            Err(CliError::InvalidArgument(msg)) => assert!(msg.starts_with("row 1")),
            other => panic!("Expected invalid argument, got {:?}", other),
        }
    }

    #[test]
    fn test_load_csv_file_with_as_of() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", CSV).unwrap();

        let snapshot = load_snapshot(file.path(), InputFormat::Csv, Some(as_of())).unwrap();
        assert_eq!(snapshot.as_of, as_of());
        assert_eq!(snapshot.currencies.len(), 2);
    }

    #[test]
    fn test_json_round_trip_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");
        let reader = csv::Reader::from_reader(CSV.as_bytes());
        let snapshot = snapshot_from_csv(reader, as_of()).unwrap();
        write_json(&path, &snapshot).unwrap();

        let loaded = load_snapshot(&path, InputFormat::Json, None).unwrap();
        assert_eq!(loaded, snapshot);

        let later = as_of() + chrono::Duration::hours(1);
        let loaded = load_snapshot(&path, InputFormat::Json, Some(later)).unwrap();
        assert_eq!(loaded.as_of, later);
    }

    #[test]
    fn test_missing_file() {
        let result = load_snapshot(Path::new("does-not-exist.json"), InputFormat::Json, None);
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
        assert!(matches!(
            load_extraction(Path::new("does-not-exist.json")),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_filter_currencies() {
        let reader = csv::Reader::from_reader(CSV.as_bytes());
        let mut snapshot = snapshot_from_csv(reader, as_of()).unwrap();
        filter_currencies(&mut snapshot, &["btc".to_string(), "SOL".to_string()]);
        assert_eq!(snapshot.currencies.keys().collect::<Vec<_>>(), vec!["BTC"]);
    }
}
