//! sync-hazard-bench - concurrency hazard harness
//!
//! Runs a multi-producer/single-consumer workload over a shared counter and
//! bounded buffer, once without synchronization and once with locks and
//! counting semaphores, and reports the hazards each regime exhibits.

use anyhow::Result;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sync_hazard_bench::config::{CliArgs, HarnessConfig};
use sync_hazard_bench::harness::Orchestrator;
use sync_hazard_bench::metrics::{MetricsReporter, MetricsSnapshot};
use sync_hazard_bench::shared::Regime;
use sync_hazard_bench::utils::HarnessError;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_banner(config: &HarnessConfig) {
    if config.quiet {
        return;
    }

    println!("sync-hazard-bench v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!(
        "Regimes: {}",
        config
            .regimes
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Producers: {}, Iterations: {}, Buffer: {} slots",
        config.producers, config.iterations_per_producer, config.buffer_capacity
    );
    println!("Trials: {}", config.trials);
    match config.swap_penalty {
        Some(penalty) => println!("Swap penalty: {:.6}s (fixed)", penalty),
        None => println!("Swap penalty: measured"),
    }
    println!("====================================\n");
}

fn last_of(snapshots: &[MetricsSnapshot], regime: Regime) -> Option<&MetricsSnapshot> {
    snapshots.iter().rev().find(|s| s.regime == regime)
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    // Build configuration
    let config = HarnessConfig::from_cli(&args).map_err(HarnessError::Config)?;

    print_banner(&config);

    let orchestrator = Orchestrator::new(config.clone());
    let snapshots = orchestrator.run_all()?;

    let reporter = MetricsReporter::new(config.output_format);
    for snapshot in &snapshots {
        println!("{}", reporter.render(snapshot));
    }

    if config.trials > 1 {
        for regime in &config.regimes {
            let batch: Vec<MetricsSnapshot> = snapshots
                .iter()
                .filter(|s| s.regime == *regime)
                .cloned()
                .collect();
            println!("{}", reporter.render_batch(&batch));
        }
    }

    if config.compares_regimes() {
        if let (Some(unsync), Some(sync)) = (
            last_of(&snapshots, Regime::Unsynchronized),
            last_of(&snapshots, Regime::Synchronized),
        ) {
            println!("{}", reporter.render_comparison(unsync, sync));
        }
    }

    // Export to JSON if requested
    if let Some(ref output_path) = config.output_file {
        info!("Writing results to: {:?}", output_path);
        reporter.write_json_file(output_path, &snapshots)?;
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
