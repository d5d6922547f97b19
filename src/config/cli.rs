//! Command-line argument parsing
//!
//! Workload sizes are fixed; the CLI only selects regimes, repetition and
//! output.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::shared::Regime;

/// Concurrency hazard harness: races, buffer faults, deadlock and starvation
/// with and without synchronization
#[derive(Parser, Debug, Clone)]
#[command(name = "sync-hazard-bench")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Workload Options =====
    /// Regime(s) to run
    #[arg(long = "regime", value_enum, default_value_t = RegimeSelection::Both)]
    pub regime: RegimeSelection,

    /// Repeat each selected regime N times
    #[arg(short = 'n', long = "trials", default_value_t = 1)]
    pub trials: u32,

    /// Fixed swap penalty in seconds (skips the disk/memory probe)
    #[arg(long = "swap-penalty")]
    pub swap_penalty: Option<f64>,

    // ===== Output Options =====
    /// Write all snapshots as JSON to this path
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,

    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Which regimes to run
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegimeSelection {
    Unsynchronized,
    Synchronized,
    /// Unsynchronized then synchronized, followed by a comparison
    #[default]
    Both,
}

impl RegimeSelection {
    /// Regimes in execution order
    pub fn regimes(&self) -> Vec<Regime> {
        match self {
            RegimeSelection::Unsynchronized => vec![Regime::Unsynchronized],
            RegimeSelection::Synchronized => vec![Regime::Synchronized],
            RegimeSelection::Both => vec![Regime::Unsynchronized, Regime::Synchronized],
        }
    }
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.trials == 0 {
            return Err("--trials must be at least 1".to_string());
        }

        if let Some(penalty) = self.swap_penalty {
            if !penalty.is_finite() || penalty < 0.0 {
                return Err("--swap-penalty must be a finite, non-negative number".to_string());
            }
        }

        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        Ok(())
    }
}
