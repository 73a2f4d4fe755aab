//! implied CLI - market-implied probability distributions from option chains
//!
//! # Commands
//!
//! - `implied extract --input <file>` - Extract per-expiry distributions
//! - `implied surface --input <extraction>` - Assemble probability surfaces
//! - `implied run --input <file>` - Extraction and surfaces in one pass
//! - `implied check` - Print and validate the effective configuration
//!
//! # Architecture
//!
//! As the service layer, this crate owns all file and clock access and
//! drives the pure computations in `implied_density`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod loader;

pub use error::{CliError, Result};

use config::AppConfig;
use loader::InputFormat;

/// Market-implied probability distributions
#[derive(Parser)]
#[command(name = "implied")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "implied.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract implied distributions from a market snapshot
    Extract {
        /// Snapshot file (JSON or CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format (json, csv); guessed from the extension when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Valuation time (RFC 3339 or YYYY-MM-DD)
        #[arg(short, long)]
        as_of: Option<String>,

        /// Output file, defaults to the extraction file in the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Assemble probability surfaces from an extraction file
    Surface {
        /// Extraction file written by `extract`
        #[arg(short, long)]
        input: PathBuf,

        /// Output file, defaults to the surface file in the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of price axis points
        #[arg(short, long)]
        price_points: Option<usize>,
    },

    /// Extract and assemble surfaces in one pass
    Run {
        /// Snapshot file (JSON or CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format (json, csv); guessed from the extension when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Valuation time (RFC 3339 or YYYY-MM-DD)
        #[arg(short, long)]
        as_of: Option<String>,

        /// Output directory, overrides the configured one
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Number of price axis points
        #[arg(short, long)]
        price_points: Option<usize>,
    },

    /// Print the effective configuration and validate it
    Check,
}

fn init_tracing(verbose: bool, log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { log_level })
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn input_format(input: &Path, format: Option<&str>) -> Result<InputFormat> {
    match format {
        Some(f) => f.parse(),
        None => Ok(InputFormat::from_path(input)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)?.with_env_override()?;
    if let Commands::Surface {
        price_points: Some(points),
        ..
    }
    | Commands::Run {
        price_points: Some(points),
        ..
    } = &cli.command
    {
        config.surface.price_points = *points;
    }

    init_tracing(cli.verbose, &config.log_level);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Commands::Check = cli.command {
        return commands::check::run(&cli.config, &config);
    }
    config.validate()?;

    match cli.command {
        Commands::Extract {
            input,
            format,
            as_of,
            output,
        } => {
            let format = input_format(&input, format.as_deref())?;
            let as_of = as_of.as_deref().map(commands::parse_as_of).transpose()?;
            let output =
                output.unwrap_or_else(|| config.output_dir.join(commands::run::EXTRACTION_FILE));
            commands::extract::run(&config, &input, format, as_of, &output)
        }
        Commands::Surface { input, output, .. } => {
            let output =
                output.unwrap_or_else(|| config.output_dir.join(commands::run::SURFACE_FILE));
            commands::surface::run(&config, &input, &output)
        }
        Commands::Run {
            input,
            format,
            as_of,
            output_dir,
            ..
        } => {
            let format = input_format(&input, format.as_deref())?;
            let as_of = as_of.as_deref().map(commands::parse_as_of).transpose()?;
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            commands::run::run(&config, &input, format, as_of, &output_dir)
        }
        Commands::Check => Ok(()),
    }
}
