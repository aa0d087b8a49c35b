//! APT factor extraction CLI tool.
//!
//! Reads a wide CSV (a `date` column plus one column per asset) and extracts
//! the leading factors over a date range.
//!
//! Usage: `cargo run --features cli --bin extract -- --input returns.csv -k 3`
//! Example: `cargo run --features cli --bin extract -- --input closes.csv --prices log-diff --json`

use std::{path::PathBuf, process};

use aptpca::{
    math::GrandMean,
    model::{ExtractorConfig, FactorExtraction, FactorModel},
    primitives::Date,
    traits::{DataProvider, ShrinkageTarget},
    utils::{CsvPanelProvider, ProviderOptions, ReturnKind},
};
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "extract")]
#[command(about = "Extract APT factors from a return panel", long_about = None)]
#[command(version)]
struct Cli {
    /// Wide CSV with a date column and one column per asset
    #[arg(long)]
    input: PathBuf,

    /// First date of the window, inclusive (defaults to the first date in the file)
    #[arg(long)]
    start: Option<Date>,

    /// Last date of the window, inclusive (defaults to the last date in the file)
    #[arg(long)]
    end: Option<Date>,

    /// Number of factors to extract
    #[arg(short = 'k', long = "factors", default_value_t = 3)]
    k: usize,

    /// Weight on the mean-return shrinkage target
    #[arg(long, default_value_t = 50.0)]
    weight: f64,

    /// Shrinkage target
    #[arg(long, value_enum, default_value_t = Target::MeanOuter)]
    target: Target,

    /// Treat the input as close prices and convert them to returns
    #[arg(long, value_enum)]
    prices: Option<Prices>,

    /// Name of the date column
    #[arg(long, default_value = "date")]
    date_column: String,

    /// Emit the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    /// Outer product of the per-asset mean returns
    MeanOuter,
    /// Squared grand mean in every entry
    GrandMean,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Prices {
    /// Simple returns
    PctChange,
    /// Log returns
    LogDiff,
}

impl From<Prices> for ReturnKind {
    fn from(prices: Prices) -> Self {
        match prices {
            Prices::PctChange => Self::PctChange,
            Prices::LogDiff => Self::LogDiff,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let options = ProviderOptions {
        date_column: cli.date_column.clone(),
        prices: cli.prices.map(ReturnKind::from),
    };
    let provider = CsvPanelProvider::open(&cli.input, &options)?;

    let (Some(&first), Some(&last)) = (provider.dates().first(), provider.dates().last()) else {
        return Err(format!("{} has no rows", cli.input.display()).into());
    };
    let start = cli.start.unwrap_or(first);
    let end = cli.end.unwrap_or(last);

    let config = ExtractorConfig { shrinkage_weight: cli.weight, ..Default::default() };
    let result = match cli.target {
        Target::MeanOuter => extract(FactorModel::with_config(config), &provider, start, end, cli.k)?,
        Target::GrandMean => {
            extract(FactorModel::with_target(config, GrandMean), &provider, start, end, cli.k)?
        }
    };

    if cli.json {
        let output = json!({
            "input": cli.input.display().to_string(),
            "start": start.to_string(),
            "end": end.to_string(),
            "weight": cli.weight,
            "result": result.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Window: {} to {}", start, end);
        result.print_summary();
    }

    Ok(())
}

fn extract<S: ShrinkageTarget>(
    model: FactorModel<S>,
    provider: &dyn DataProvider,
    start: Date,
    end: Date,
    k: usize,
) -> Result<FactorExtraction, Box<dyn std::error::Error>> {
    model.extract_from_provider(provider, start, end, k).map_err(|e| {
        if e.is_recoverable() {
            format!("{e} (try a different weight or date window)").into()
        } else {
            e.into()
        }
    })
}
