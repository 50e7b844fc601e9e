//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// What the binary computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Single run with cost, energy and ROI report.
    Report,
    /// Grid-only, solar-only and solar+storage side by side.
    Compare,
    /// Design-space grid search with ROI sensitivity fit.
    Sweep,
    /// Repeated runs over consecutive seeds.
    MonteCarlo,
}

/// EV charging site simulator: solar, battery storage and ROI.
///
/// If neither `--scenario` nor `--preset` is given, the baseline preset is used.
#[derive(Debug, Parser)]
#[command(name = "ev-roi-sim", author, version, about, long_about = None)]
pub struct Args {
    /// Load the site from a TOML config file.
    #[arg(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, grid_only, solar_only, commuter, price_threshold).
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the number of simulated days.
    #[arg(long)]
    pub days: Option<usize>,

    #[arg(long, value_enum, default_value_t = Mode::Report)]
    pub mode: Mode,

    /// Monte Carlo repetitions.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub iterations: usize,

    /// Export per-step records to CSV (report mode).
    #[arg(long)]
    pub telemetry_out: Option<PathBuf>,

    /// Export sweep rows to CSV (sweep mode).
    #[arg(long)]
    pub sweep_out: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
