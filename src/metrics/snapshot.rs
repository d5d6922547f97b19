//! End-of-run metrics snapshot
//!
//! Assembled once by the collector after producers and the consumer have
//! joined, then only read. Hazard flags are derived from the measured data
//! rather than from the regime label, so an unsynchronized run that happened
//! to lose no updates reports exactly that.

use std::time::Duration;

use hdrhistogram::Histogram;

use crate::harness::{ConsumerResult, DeadlockObservation};
use crate::shared::{BufferFaults, Regime};

/// Per-producer counter observations
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerRecord {
    pub worker_id: usize,
    pub iterations: u64,
    /// Counter value read just before the first iteration
    pub counter_before: u64,
    /// Counter value read just after the last iteration
    pub counter_after: u64,
    pub elapsed: Duration,
}

impl WorkerRecord {
    /// Counter growth observed across this worker's lifetime
    pub fn contribution(&self) -> u64 {
        self.counter_after.saturating_sub(self.counter_before)
    }

    pub fn is_monotonic(&self) -> bool {
        self.counter_after >= self.counter_before
    }
}

/// Push-wait latency distribution (microseconds)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencySummary {
    pub samples: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencySummary {
    pub fn from_histogram(histogram: &Histogram<u64>) -> Self {
        if histogram.is_empty() {
            return Self::default();
        }
        Self {
            samples: histogram.len(),
            mean_us: histogram.mean(),
            p50_us: histogram.value_at_percentile(50.0),
            p99_us: histogram.value_at_percentile(99.0),
            max_us: histogram.max(),
        }
    }
}

/// Which hazards the run exhibited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HazardFlags {
    /// Counter ended below the number of increments performed
    pub race_condition: bool,
    /// The counter/buffer critical sections ran unguarded
    pub critical_section_violated: bool,
    /// Any overwrite or underflow fault
    pub producer_consumer_fault: bool,
    /// Deadlock pair observed in circular wait
    pub deadlock: bool,
    /// Starvation witness ran alongside the workload
    pub starvation: bool,
    /// Counter mismatch or a worker saw the counter go backwards
    pub data_inconsistency: bool,
}

/// Immutable end-of-run metrics
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub regime: Regime,
    /// 1-based trial number within a batch
    pub trial: u32,
    pub producers: usize,
    pub iterations_per_producer: u64,
    pub buffer_capacity: usize,

    pub counter_value: u64,
    pub faults: BufferFaults,
    pub consumer: ConsumerResult,
    pub workers: Vec<WorkerRecord>,

    pub context_switches: u64,
    pub swap_events: u64,
    pub swap_penalty_secs: f64,
    pub starvation_events: u64,
    pub starvation_witness: bool,
    /// Iterations the witness was configured for (0 when not run)
    pub starvation_target: u64,
    pub deadlock: DeadlockObservation,

    pub push_wait: LatencySummary,
    pub wall_clock: Duration,
    pub scheduling_latency: Duration,
    pub cpu_time_secs: f64,
}

impl MetricsSnapshot {
    /// Increments all producers performed
    pub fn expected_total(&self) -> u64 {
        self.producers as u64 * self.iterations_per_producer
    }

    pub fn lost_updates(&self) -> u64 {
        self.expected_total().saturating_sub(self.counter_value)
    }

    /// Counter as a percentage of expected
    pub fn integrity_rate(&self) -> f64 {
        let expected = self.expected_total();
        if expected == 0 {
            100.0
        } else {
            self.counter_value as f64 / expected as f64 * 100.0
        }
    }

    /// Expected increments per wall-clock second
    pub fn throughput(&self) -> f64 {
        let secs = self.wall_clock.as_secs_f64();
        if secs > 0.0 {
            self.expected_total() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn swap_overhead_secs(&self) -> f64 {
        self.swap_events as f64 * self.swap_penalty_secs
    }

    pub fn flags(&self) -> HazardFlags {
        let race_condition = self.counter_value < self.expected_total();
        HazardFlags {
            race_condition,
            critical_section_violated: self.regime == Regime::Unsynchronized,
            producer_consumer_fault: self.faults.any(),
            deadlock: self.deadlock.is_deadlocked(),
            starvation: self.starvation_witness,
            data_inconsistency: self.counter_value != self.expected_total()
                || self.workers.iter().any(|w| !w.is_monotonic()),
        }
    }

    /// Whether the detached witness had not finished by snapshot time
    pub fn starvation_in_progress(&self) -> bool {
        self.starvation_witness && self.starvation_events < self.starvation_target
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "Regime: {} | Trial: {} | Counter: {}/{} | Lost: {} | Overwrites: {} | Underflows: {} | Deadlock: {} | {:.3}s",
            self.regime,
            self.trial,
            self.counter_value,
            self.expected_total(),
            self.lost_updates(),
            self.faults.overwrites,
            self.faults.underflows,
            self.deadlock.as_str(),
            self.wall_clock.as_secs_f64()
        )
    }

    /// Convert to JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let flags = self.flags();
        serde_json::json!({
            "regime": self.regime.as_str(),
            "trial": self.trial,
            "workload": {
                "producers": self.producers,
                "iterations_per_producer": self.iterations_per_producer,
                "buffer_capacity": self.buffer_capacity,
                "expected_total": self.expected_total()
            },
            "integrity": {
                "counter": self.counter_value,
                "lost_updates": self.lost_updates(),
                "integrity_rate_pct": self.integrity_rate()
            },
            "buffer": {
                "overwrites": self.faults.overwrites,
                "underflows": self.faults.underflows,
                "consumer_iterations": self.consumer.iterations,
                "items_consumed": self.consumer.consumed,
                "consumed_by_producer": self.consumer.per_producer
            },
            "swapping": {
                "penalty_secs": self.swap_penalty_secs,
                "events": self.swap_events,
                "overhead_secs": self.swap_overhead_secs()
            },
            "scheduling": {
                "latency_secs": self.scheduling_latency.as_secs_f64(),
                "context_switches": self.context_switches,
                "starvation_events": self.starvation_events,
                "starvation_target": self.starvation_target
            },
            "performance": {
                "wall_clock_secs": self.wall_clock.as_secs_f64(),
                "cpu_time_secs": self.cpu_time_secs,
                "throughput": self.throughput(),
                "push_wait_us": {
                    "samples": self.push_wait.samples,
                    "mean": self.push_wait.mean_us,
                    "p50": self.push_wait.p50_us,
                    "p99": self.push_wait.p99_us,
                    "max": self.push_wait.max_us
                }
            },
            "workers": self.workers.iter().map(|w| {
                serde_json::json!({
                    "worker_id": w.worker_id,
                    "iterations": w.iterations,
                    "counter_before": w.counter_before,
                    "counter_after": w.counter_after,
                    "contribution": w.contribution(),
                    "elapsed_secs": w.elapsed.as_secs_f64()
                })
            }).collect::<Vec<_>>(),
            "deadlock": self.deadlock.as_str(),
            "hazards": {
                "race_condition": flags.race_condition,
                "critical_section_violated": flags.critical_section_violated,
                "producer_consumer_fault": flags.producer_consumer_fault,
                "deadlock": flags.deadlock,
                "starvation": flags.starvation,
                "data_inconsistency": flags.data_inconsistency
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_snapshot(regime: Regime, counter_value: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            regime,
            trial: 1,
            producers: 2,
            iterations_per_producer: 50,
            buffer_capacity: 4,
            counter_value,
            faults: BufferFaults::default(),
            consumer: ConsumerResult {
                iterations: 100,
                consumed: 100,
                per_producer: vec![50, 50],
                elapsed: Duration::from_millis(5),
            },
            workers: vec![
                WorkerRecord {
                    worker_id: 0,
                    iterations: 50,
                    counter_before: 0,
                    counter_after: 60,
                    elapsed: Duration::from_millis(4),
                },
                WorkerRecord {
                    worker_id: 1,
                    iterations: 50,
                    counter_before: 3,
                    counter_after: counter_value,
                    elapsed: Duration::from_millis(4),
                },
            ],
            context_switches: 2,
            swap_events: 2,
            swap_penalty_secs: 0.5,
            starvation_events: 0,
            starvation_witness: false,
            starvation_target: 0,
            deadlock: DeadlockObservation::NotRun,
            push_wait: LatencySummary::default(),
            wall_clock: Duration::from_millis(10),
            scheduling_latency: Duration::from_millis(9),
            cpu_time_secs: 0.01,
        }
    }

    #[test]
    fn test_exact_counter_has_no_hazards() {
        let snap = sample_snapshot(Regime::Synchronized, 100);
        assert_eq!(snap.expected_total(), 100);
        assert_eq!(snap.lost_updates(), 0);
        assert_eq!(snap.integrity_rate(), 100.0);

        let flags = snap.flags();
        assert!(!flags.race_condition);
        assert!(!flags.critical_section_violated);
        assert!(!flags.producer_consumer_fault);
        assert!(!flags.deadlock);
        assert!(!flags.data_inconsistency);
    }

    #[test]
    fn test_lost_updates_flag_race_and_inconsistency() {
        let mut snap = sample_snapshot(Regime::Unsynchronized, 80);
        snap.faults.underflows = 5;
        snap.deadlock = DeadlockObservation::Stuck;
        snap.starvation_witness = true;

        assert_eq!(snap.lost_updates(), 20);
        assert_eq!(snap.integrity_rate(), 80.0);

        let flags = snap.flags();
        assert!(flags.race_condition);
        assert!(flags.critical_section_violated);
        assert!(flags.producer_consumer_fault);
        assert!(flags.deadlock);
        assert!(flags.starvation);
        assert!(flags.data_inconsistency);
    }

    #[test]
    fn test_backwards_worker_record_is_inconsistent() {
        let mut snap = sample_snapshot(Regime::Unsynchronized, 100);
        snap.workers[1].counter_before = 150;
        assert!(!snap.workers[1].is_monotonic());
        assert_eq!(snap.workers[1].contribution(), 0);
        assert!(snap.flags().data_inconsistency);
    }

    #[test]
    fn test_swap_overhead_and_throughput() {
        let snap = sample_snapshot(Regime::Synchronized, 100);
        assert_eq!(snap.swap_overhead_secs(), 1.0);
        assert!((snap.throughput() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_latency_summary_from_histogram() {
        let mut histogram = Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3).unwrap();
        for _ in 0..99 {
            histogram.record(10).unwrap();
        }
        histogram.record(1_000).unwrap();

        let summary = LatencySummary::from_histogram(&histogram);
        assert_eq!(summary.samples, 100);
        assert_eq!(summary.p50_us, 10);
        assert!(summary.max_us >= 1_000);

        let empty = Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3).unwrap();
        assert_eq!(LatencySummary::from_histogram(&empty), LatencySummary::default());
    }

    #[test]
    fn test_starvation_in_progress() {
        let mut snap = sample_snapshot(Regime::Unsynchronized, 100);
        assert!(!snap.starvation_in_progress());

        snap.starvation_witness = true;
        snap.starvation_target = 5;
        snap.starvation_events = 1;
        assert!(snap.starvation_in_progress());

        snap.starvation_events = 5;
        assert!(!snap.starvation_in_progress());
    }

    #[test]
    fn test_snapshot_json() {
        let snap = sample_snapshot(Regime::Unsynchronized, 90);
        let json = snap.to_json();
        assert_eq!(json["regime"], "unsynchronized");
        assert_eq!(json["integrity"]["counter"], 90);
        assert_eq!(json["integrity"]["lost_updates"], 10);
        assert_eq!(json["workers"].as_array().unwrap().len(), 2);
        assert_eq!(json["hazards"]["race_condition"], true);
        assert_eq!(json["deadlock"], "not-run");
    }
}
