//! Metrics collector - merges per-worker results into a snapshot
//!
//! Owned by the orchestrator for the duration of one run. Producer results
//! arrive as their threads are joined; the final shared state and run-wide
//! counters are read once in [`MetricsCollector::finish`].

use std::time::Duration;

use hdrhistogram::Histogram;

use super::snapshot::{LatencySummary, MetricsSnapshot, WorkerRecord};
use crate::harness::{ConsumerResult, DeadlockObservation, HazardCounters, ProducerResult};
use crate::shared::{Regime, SharedState};

/// Timings measured by the orchestrator around a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTimings {
    pub wall_clock: Duration,
    pub scheduling_latency: Duration,
    pub cpu_time_secs: f64,
    pub swap_penalty_secs: f64,
}

pub struct MetricsCollector {
    regime: Regime,
    trial: u32,
    iterations_per_producer: u64,
    workers: Vec<WorkerRecord>,
    push_wait: Histogram<u64>,
    consumer: ConsumerResult,
    deadlock: DeadlockObservation,
    starvation_witness: bool,
    starvation_target: u64,
}

impl MetricsCollector {
    pub fn new(regime: Regime, trial: u32, iterations_per_producer: u64) -> Self {
        Self {
            regime,
            trial,
            iterations_per_producer,
            workers: Vec::new(),
            push_wait: Histogram::new_with_bounds(1, 3_600_000_000, 3)
                .expect("Failed to create histogram"),
            consumer: ConsumerResult::default(),
            deadlock: DeadlockObservation::NotRun,
            starvation_witness: false,
            starvation_target: 0,
        }
    }

    /// Merge one joined producer
    pub fn add_producer(&mut self, result: ProducerResult) {
        self.push_wait.add(&result.push_wait).ok();
        self.workers.push(result.record);
    }

    pub fn set_consumer(&mut self, result: ConsumerResult) {
        self.consumer = result;
    }

    pub fn set_deadlock(&mut self, observation: DeadlockObservation) {
        self.deadlock = observation;
    }

    /// Record that the witness was started for `iterations`
    pub fn set_starvation_witness(&mut self, iterations: u64) {
        self.starvation_witness = true;
        self.starvation_target = iterations;
    }

    /// Read final state and produce the immutable snapshot
    pub fn finish(
        mut self,
        state: &dyn SharedState,
        counters: &HazardCounters,
        timings: RunTimings,
    ) -> MetricsSnapshot {
        self.workers.sort_by_key(|w| w.worker_id);

        MetricsSnapshot {
            regime: self.regime,
            trial: self.trial,
            producers: self.workers.len(),
            iterations_per_producer: self.iterations_per_producer,
            buffer_capacity: state.capacity(),
            counter_value: state.counter(),
            faults: state.faults(),
            consumer: self.consumer,
            push_wait: LatencySummary::from_histogram(&self.push_wait),
            workers: self.workers,
            context_switches: counters.context_switches(),
            swap_events: counters.swap_events(),
            swap_penalty_secs: timings.swap_penalty_secs,
            starvation_events: counters.starvation_events(),
            starvation_witness: self.starvation_witness,
            starvation_target: self.starvation_target,
            deadlock: self.deadlock,
            wall_clock: timings.wall_clock,
            scheduling_latency: timings.scheduling_latency,
            cpu_time_secs: timings.cpu_time_secs,
        }
    }
}
