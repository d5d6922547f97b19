//! Starvation witness
//!
//! A low-priority periodic worker: each iteration records one starvation
//! event and then sleeps for a coarse interval, so its progress rate sits
//! orders of magnitude below the producers' tight loop.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::counters::HazardCounters;

#[derive(Debug, Clone)]
pub struct StarvationResult {
    pub iterations: u64,
    /// Shortest observed sleep
    pub min_sleep: Duration,
    pub elapsed: Duration,
}

pub struct StarvationWorker {
    iterations: u64,
    interval: Duration,
    counters: Arc<HazardCounters>,
}

impl StarvationWorker {
    pub fn new(iterations: u64, interval: Duration, counters: Arc<HazardCounters>) -> Self {
        Self {
            iterations,
            interval,
            counters,
        }
    }

    pub fn run(self) -> StarvationResult {
        let started = Instant::now();
        let mut min_sleep = Duration::MAX;

        for _ in 0..self.iterations {
            self.counters.record_starvation_event();

            let nap = Instant::now();
            thread::sleep(self.interval);
            min_sleep = min_sleep.min(nap.elapsed());
        }

        if self.iterations == 0 {
            min_sleep = Duration::ZERO;
        }

        let elapsed = started.elapsed();
        debug!(
            "Starvation witness done: {} iterations in {:.3}s",
            self.iterations,
            elapsed.as_secs_f64()
        );

        StarvationResult {
            iterations: self.iterations,
            min_sleep,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_fixed_iterations_with_minimum_sleep() {
        let counters = Arc::new(HazardCounters::new());
        let interval = Duration::from_millis(40);

        let result = StarvationWorker::new(3, interval, Arc::clone(&counters)).run();

        assert_eq!(result.iterations, 3);
        assert_eq!(counters.starvation_events(), 3);
        assert!(result.min_sleep >= interval);
        assert!(result.elapsed >= interval * 3);
    }

    #[test]
    fn test_zero_iterations() {
        let counters = Arc::new(HazardCounters::new());
        let result = StarvationWorker::new(0, Duration::from_secs(1), Arc::clone(&counters)).run();

        assert_eq!(result.iterations, 0);
        assert_eq!(result.min_sleep, Duration::ZERO);
        assert_eq!(counters.starvation_events(), 0);
    }

    #[test]
    fn test_progress_rate_far_below_tight_loop() {
        let counters = Arc::new(HazardCounters::new());
        let result = StarvationWorker::new(2, Duration::from_millis(25), counters).run();

        let witness_rate = result.iterations as f64 / result.elapsed.as_secs_f64();
        // 2 iterations over >= 50ms is at most 40 per second
        assert!(witness_rate <= 40.0);
    }
}
