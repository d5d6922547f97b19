//! Run orchestrator
//!
//! Coordinates worker threads for one regime, collects their results, and
//! assembles the metrics snapshot. Only producers and the consumer are
//! joined; the deadlock pair and starvation witness are detached so a
//! circular wait can never hold up the report.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::consumer::{Consumer, ConsumerResult};
use super::counters::HazardCounters;
use super::deadlock::{DeadlockObservation, DeadlockPair};
use super::producer::{Producer, ProducerResult};
use super::starvation::StarvationWorker;
use crate::config::HarnessConfig;
use crate::metrics::{format_count, MetricsCollector, MetricsSnapshot, RunTimings};
use crate::probe::{rusage_self, FixedSwapProbe, HardwareSwapProbe, SwapProbe};
use crate::shared::{build_state, Regime};
use crate::utils::{HarnessError, Result};

/// Multiple of the deadlock hold to wait for the pair to settle
const DEADLOCK_SETTLE_FACTOR: u32 = 3;

/// Run orchestrator
pub struct Orchestrator {
    config: Arc<HarnessConfig>,
    probe: Box<dyn SwapProbe>,
}

impl Orchestrator {
    /// Create orchestrator; a configured swap penalty bypasses the hardware probe
    pub fn new(config: HarnessConfig) -> Self {
        let probe: Box<dyn SwapProbe> = match config.swap_penalty {
            Some(penalty) => Box::new(FixedSwapProbe(penalty)),
            None => Box::new(HardwareSwapProbe::new()),
        };
        Self::with_probe(config, probe)
    }

    pub fn with_probe(config: HarnessConfig, probe: Box<dyn SwapProbe>) -> Self {
        Self {
            config: Arc::new(config),
            probe,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run one trial of a regime
    pub fn run(&self, regime: Regime, trial: u32) -> Result<MetricsSnapshot> {
        let config = &self.config;

        info!(
            "Starting {} regime (trial {}/{})",
            regime, trial, config.trials
        );
        let swap_penalty_secs = self.probe.measure();
        info!("Swap penalty: {:.6}s", swap_penalty_secs);

        let state = build_state(regime, config.buffer_capacity);
        let counters = Arc::new(HazardCounters::new());
        let mut collector = MetricsCollector::new(regime, trial, config.iterations_per_producer);
        let expected = config.expected_total();

        let usage_before = rusage_self();
        let start_time = Instant::now();
        let spawn_start = Instant::now();

        let consumer = Consumer::new(
            expected,
            config.producers,
            Arc::clone(&state),
            Arc::clone(&counters),
        );
        let consumer_handle = thread::Builder::new()
            .name("consumer".to_string())
            .spawn(move || consumer.run())
            .map_err(|e| HarnessError::spawn("consumer", e))?;

        let mut producer_handles: Vec<JoinHandle<ProducerResult>> =
            Vec::with_capacity(config.producers);
        for producer_id in 0..config.producers {
            let producer = Producer::new(
                producer_id,
                config.iterations_per_producer,
                config.yield_every,
                Arc::clone(&state),
                Arc::clone(&counters),
            );
            let role = format!("producer-{}", producer_id);
            let handle = thread::Builder::new()
                .name(role.clone())
                .spawn(move || producer.run())
                .map_err(|e| HarnessError::spawn(role, e))?;
            producer_handles.push(handle);
        }
        debug!("Spawned {} producers and 1 consumer", config.producers);

        let deadlock = match regime {
            Regime::Unsynchronized => {
                let pair = DeadlockPair::new(config.deadlock_hold).start()?;

                let witness = StarvationWorker::new(
                    config.starvation_iterations,
                    config.starvation_interval,
                    Arc::clone(&counters),
                );
                // Detached: the witness may outlive the run
                let _witness = thread::Builder::new()
                    .name("starvation".to_string())
                    .spawn(move || witness.run())
                    .map_err(|e| HarnessError::spawn("starvation", e))?;
                collector.set_starvation_witness(config.starvation_iterations);

                Some(pair)
            }
            Regime::Synchronized => None,
        };

        // Progress reporting (if not quiet); stopped on every exit path
        let progress = ProgressGuard::start(Arc::clone(&counters), expected, config.quiet);

        let joined = Self::join_workers(producer_handles, consumer_handle, &mut collector);
        let scheduling_latency = spawn_start.elapsed();
        let wall_clock = start_time.elapsed();
        let usage = rusage_self().since(&usage_before);

        drop(progress);
        joined?;
        info!("Workers joined after {:.3}s", wall_clock.as_secs_f64());

        let observation = match &deadlock {
            Some(pair) => pair.settle(config.deadlock_hold * DEADLOCK_SETTLE_FACTOR),
            None => DeadlockObservation::NotRun,
        };
        collector.set_deadlock(observation);

        let timings = RunTimings {
            wall_clock,
            scheduling_latency,
            cpu_time_secs: usage.total_cpu_time().as_secs_f64(),
            swap_penalty_secs,
        };

        let snapshot = collector.finish(state.as_ref(), &counters, timings);
        info!("{}", snapshot.summary());
        Ok(snapshot)
    }

    /// Run every configured trial of one regime
    pub fn run_trials(&self, regime: Regime) -> Result<Vec<MetricsSnapshot>> {
        (1..=self.config.trials)
            .map(|trial| self.run(regime, trial))
            .collect()
    }

    /// Run all configured regimes in order
    pub fn run_all(&self) -> Result<Vec<MetricsSnapshot>> {
        let mut snapshots = Vec::new();

        for &regime in &self.config.regimes {
            if !self.config.quiet {
                println!("\nRunning regime: {}", regime);
            }
            snapshots.extend(self.run_trials(regime)?);
        }

        Ok(snapshots)
    }

    /// Join producers then the consumer, merging results as they arrive
    fn join_workers(
        producers: Vec<JoinHandle<ProducerResult>>,
        consumer: JoinHandle<ConsumerResult>,
        collector: &mut MetricsCollector,
    ) -> Result<()> {
        let mut panicked = None;
        for handle in producers {
            match handle.join() {
                Ok(result) => collector.add_producer(result),
                Err(_) => panicked = Some("producer"),
            }
        }

        match consumer.join() {
            Ok(result) => collector.set_consumer(result),
            Err(_) => panicked = panicked.or(Some("consumer")),
        }

        match panicked {
            Some(role) => Err(HarnessError::WorkerPanicked(role.to_string())),
            None => Ok(()),
        }
    }
}

/// Progress bar thread; dropping the guard signals shutdown and waits for it
struct ProgressGuard {
    counters: Arc<HazardCounters>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressGuard {
    fn start(counters: Arc<HazardCounters>, total: u64, quiet: bool) -> Self {
        let handle = if quiet {
            None
        } else {
            let counters = Arc::clone(&counters);
            Some(thread::spawn(move || {
                report_progress(&counters, total);
            }))
        };
        Self { counters, handle }
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.counters.signal_shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Progress reporter panicked");
            }
        }
    }
}

/// Report progress while producers run
fn report_progress(counters: &HazardCounters, total: u64) {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let start = Instant::now();
    let mut last_finished = 0u64;
    let mut last_time = start;

    while !counters.is_shutdown() {
        let finished = counters.iterations_completed();
        pb.set_position(finished);

        // Calculate current throughput without decimals
        let now = Instant::now();
        let interval = now.duration_since(last_time).as_secs_f64();
        if interval >= 0.5 {
            let throughput = (finished - last_finished) as f64 / interval;
            pb.set_message(format!("{}/s", format_count(throughput as u64)));
            last_finished = finished;
            last_time = now;
        }

        if finished >= total {
            break;
        }

        thread::sleep(Duration::from_millis(100));
    }

    pb.finish_with_message("done");
}
