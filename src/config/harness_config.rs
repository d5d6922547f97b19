//! Harness configuration derived from CLI arguments

use std::path::PathBuf;
use std::time::Duration;

use super::cli::{CliArgs, OutputFormat};
use crate::shared::Regime;

pub const DEFAULT_PRODUCERS: usize = 6;
pub const DEFAULT_ITERATIONS: u64 = 100_000;
pub const DEFAULT_BUFFER_CAPACITY: usize = 4;
pub const DEFAULT_YIELD_EVERY: u64 = 1_000;
pub const DEFAULT_DEADLOCK_HOLD: Duration = Duration::from_millis(100);
pub const DEFAULT_STARVATION_ITERATIONS: u64 = 5;
pub const DEFAULT_STARVATION_INTERVAL: Duration = Duration::from_secs(1);

/// Complete harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Regimes in execution order
    pub regimes: Vec<Regime>,
    /// Runs per regime
    pub trials: u32,

    // Workload
    pub producers: usize,
    pub iterations_per_producer: u64,
    pub buffer_capacity: usize,
    /// Forced context switch every N producer iterations (0 = never)
    pub yield_every: u64,

    // Hazard scenarios
    /// Sleep between the first and second lock in the deadlock pair
    pub deadlock_hold: Duration,
    pub starvation_iterations: u64,
    pub starvation_interval: Duration,

    /// Fixed swap penalty; `None` probes the hardware
    pub swap_penalty: Option<f64>,

    // Output
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub quiet: bool,
}

impl HarnessConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        // Validate first
        args.validate()?;

        Ok(Self {
            regimes: args.regime.regimes(),
            trials: args.trials,
            swap_penalty: args.swap_penalty,
            output_format: args.output_format,
            output_file: args.output_file.clone(),
            quiet: args.quiet,
            ..Self::default()
        })
    }

    /// Default workload for a single regime
    pub fn for_regime(regime: Regime) -> Self {
        Self {
            regimes: vec![regime],
            ..Self::default()
        }
    }

    /// Total increments (and pushes) across all producers
    pub fn expected_total(&self) -> u64 {
        self.producers as u64 * self.iterations_per_producer
    }

    /// Whether both regimes are selected
    pub fn compares_regimes(&self) -> bool {
        self.regimes.contains(&Regime::Unsynchronized) && self.regimes.contains(&Regime::Synchronized)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            regimes: vec![Regime::Unsynchronized, Regime::Synchronized],
            trials: 1,
            producers: DEFAULT_PRODUCERS,
            iterations_per_producer: DEFAULT_ITERATIONS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            yield_every: DEFAULT_YIELD_EVERY,
            deadlock_hold: DEFAULT_DEADLOCK_HOLD,
            starvation_iterations: DEFAULT_STARVATION_ITERATIONS,
            starvation_interval: DEFAULT_STARVATION_INTERVAL,
            swap_penalty: None,
            output_format: OutputFormat::Text,
            output_file: None,
            quiet: false,
        }
    }
}
