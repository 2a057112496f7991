//! # Tide Chain Application Entry Point
//!
//! Command-line front end: reads a level file (or generates a demo series),
//! runs chain building or the legacy top-N selection, and prints a table,
//! JSON, or writes CSV. The processed input series can be exported too.


use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tide_chain_lib::chain::analyze;
use tide_chain_lib::config::{Config, CONFIG_FILE};
use tide_chain_lib::synthetic::SineWave;
use tide_chain_lib::top_n::select_top_n;
use tide_chain_lib::window::ExtremumKind;
use tide_chain_lib::{ingest, report, TimeSeries};

/// Extremum selection strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Alternating high/low chain anchored on the dominant swing
    Chain,
    /// Legacy: N most extreme samples spaced at least --min-gap apart
    TopN,
}

/// Derive high/low tide chains from water-level records.
#[derive(Debug, Parser)]
#[command(name = "tide-chain", version, about)]
pub struct Cli {
    /// CSV file: timestamp in column 0, raw level in --value-column
    pub input: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// First date to include (mm/dd/yyyy)
    #[arg(long)]
    pub start: Option<String>,

    /// Last date to include (mm/dd/yyyy)
    #[arg(long)]
    pub end: Option<String>,

    /// Reference level; values become constant - raw
    #[arg(long, allow_negative_numbers = true)]
    pub constant: Option<f64>,

    /// Zero-based column of the raw level
    #[arg(long)]
    pub value_column: Option<usize>,

    #[arg(long, value_enum, default_value_t = Mode::Chain)]
    pub mode: Mode,

    /// Hours between a high and the next low
    #[arg(long)]
    pub gap: Option<f64>,

    /// Slack around --gap, in hours
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Extrema per kind in top-n mode
    #[arg(long)]
    pub count: Option<usize>,

    /// Minimum hours between picks in top-n mode
    #[arg(long)]
    pub min_gap: Option<f64>,

    /// Forward moving-average width in samples
    #[arg(long)]
    pub smooth: Option<usize>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Also write the selected extrema as CSV to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Also write the filtered, transformed series as CSV to this path
    #[arg(long)]
    pub processed: Option<PathBuf>,

    /// Analyse a generated 48 h semidiurnal series instead of a file
    #[arg(long)]
    pub demo: bool,

    /// Write the effective configuration to --config and exit
    #[arg(long)]
    pub init_config: bool,
}

/// Layer command-line overrides on top of the file configuration.
pub fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(start) = &cli.start {
        config.input.start_date = Some(start.clone());
    }
    if let Some(end) = &cli.end {
        config.input.end_date = Some(end.clone());
    }
    if let Some(constant) = cli.constant {
        config.input.datum_constant = constant;
    }
    if let Some(column) = cli.value_column {
        config.input.value_column = column;
    }
    if let Some(window) = cli.smooth {
        config.input.smoothing_window = window;
    }
    if let Some(gap) = cli.gap {
        config.analysis.gap_hours = gap;
    }
    if let Some(tolerance) = cli.tolerance {
        config.analysis.tolerance_hours = tolerance;
    }
    if let Some(count) = cli.count {
        config.legacy.count = count;
    }
    if let Some(min_gap) = cli.min_gap {
        config.legacy.min_gap_hours = min_gap;
    }
    config
}

/// Series to analyse: the demo wave or the ingested input file.
pub fn load_series(cli: &Cli, config: &Config) -> anyhow::Result<TimeSeries> {
    if cli.demo {
        let start = chrono::Local::now()
            .naive_local()
            .date()
            .and_hms_opt(0, 0, 0)
            .context("midnight is a valid time")?;
        let wave = SineWave {
            amplitude: 4.5,
            offset: config.input.datum_constant,
            ..SineWave::default()
        };
        info!("Generating demo series starting {}", start);
        return Ok(wave.sample(start, 48, 10));
    }

    let path = cli
        .input
        .as_ref()
        .context("no input file given (pass a CSV path or --demo)")?;
    let options = config
        .input
        .ingest_options()
        .context("invalid date range")?;
    let series = ingest::load_csv(path, &options)
        .with_context(|| format!("failed to read {}", path.display()))?;
    info!("Loaded {} samples from {}", series.len(), path.display());
    Ok(series)
}

fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Run the selected analysis and return the text to print.
pub fn run(cli: &Cli, config: &Config) -> anyhow::Result<String> {
    let series = load_series(cli, config)?;
    if series.is_empty() {
        warn!("No samples left after filtering");
    }
    if let Some(path) = &cli.processed {
        report::write_series_csv(&series, create_output(path)?)?;
        info!("Processed series written to {}", path.display());
    }

    match cli.mode {
        Mode::Chain => {
            let window = config.analysis.window()?;
            let (anchor, chain) = analyze(&series, &window, config.analysis.numeric_tolerance)
                .context("chain building failed")?;
            if anchor.fallback {
                warn!("No high pairs with the absolute low; anchored on the global maximum");
            }
            if let Some(path) = &cli.csv {
                report::write_csv(&chain, create_output(path)?)?;
                info!("Chain written to {}", path.display());
            }
            if cli.json {
                Ok(report::to_json(&chain)?)
            } else {
                Ok(report::render_table(&chain))
            }
        }
        Mode::TopN => {
            let legacy = &config.legacy;
            let highs = select_top_n(&series, legacy.count, legacy.min_gap_hours, ExtremumKind::High)?;
            let lows = select_top_n(&series, legacy.count, legacy.min_gap_hours, ExtremumKind::Low)?;
            if let Some(path) = &cli.csv {
                report::write_top_n_csv(&highs, &lows, create_output(path)?)?;
                info!("Top-N extrema written to {}", path.display());
            }
            if cli.json {
                Ok(report::top_n_to_json(&highs, &lows)?)
            } else {
                Ok(report::render_top_n(&highs, &lows))
            }
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = apply_overrides(&cli, Config::load_from_path(&cli.config));

    if cli.init_config {
        config.save_to_path(&cli.config)?;
        return Ok(());
    }

    let output = run(&cli, &config)?;
    print!("{}", output);
    if cli.json {
        println!();
    }
    Ok(())
}
