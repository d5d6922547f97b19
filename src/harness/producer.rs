//! Producer worker
//!
//! Each iteration pushes one item tagged with the producer's id, then
//! increments the shared counter. Every `yield_every`-th iteration the
//! increment carries a forced context switch. Blocking and racing are
//! properties of the injected [`SharedState`], never of this loop.

use std::sync::Arc;
use std::time::Instant;

use hdrhistogram::Histogram;
use tracing::debug;

use super::counters::HazardCounters;
use crate::metrics::WorkerRecord;
use crate::shared::{Checkpoint, SharedState};

/// Iterations between progress counter updates
const PROGRESS_BATCH: u64 = 256;

/// Result from a producer thread
pub struct ProducerResult {
    /// Counter snapshots around the producer's loop
    pub record: WorkerRecord,
    /// Time spent inside `push` (microseconds)
    pub push_wait: Histogram<u64>,
    /// Forced context switches taken by this producer
    pub context_switches: u64,
}

/// Producer worker (runs in dedicated OS thread)
pub struct Producer {
    id: usize,
    iterations: u64,
    yield_every: u64,
    state: Arc<dyn SharedState>,
    counters: Arc<HazardCounters>,
}

impl Producer {
    pub fn new(
        id: usize,
        iterations: u64,
        yield_every: u64,
        state: Arc<dyn SharedState>,
        counters: Arc<HazardCounters>,
    ) -> Self {
        Self {
            id,
            iterations,
            yield_every,
            state,
            counters,
        }
    }

    #[inline]
    fn checkpoint(&self, iteration: u64) -> Checkpoint {
        if self.yield_every > 0 && iteration % self.yield_every == 0 {
            Checkpoint::Yield
        } else {
            Checkpoint::Continue
        }
    }

    /// Run the fixed iteration count to completion
    pub fn run(self) -> ProducerResult {
        let mut push_wait =
            Histogram::new_with_bounds(1, 3_600_000_000, 3).expect("Failed to create histogram");
        let mut context_switches = 0u64;
        let mut unreported = 0u64;

        let started = Instant::now();
        let counter_before = self.state.counter();

        for i in 0..self.iterations {
            let push_start = Instant::now();
            self.state.push(self.id);
            push_wait.saturating_record(push_start.elapsed().as_micros() as u64);

            let checkpoint = self.checkpoint(i);
            if checkpoint == Checkpoint::Yield {
                context_switches += 1;
                self.counters.record_context_switch();
            }
            self.state.increment(checkpoint);

            unreported += 1;
            if unreported == PROGRESS_BATCH {
                self.counters.record_iterations(unreported);
                unreported = 0;
            }
        }
        self.counters.record_iterations(unreported);

        let counter_after = self.state.counter();
        let elapsed = started.elapsed();

        debug!(
            "Producer {} done: {} iterations in {:.3}s, counter {} -> {}",
            self.id,
            self.iterations,
            elapsed.as_secs_f64(),
            counter_before,
            counter_after
        );

        ProducerResult {
            record: WorkerRecord {
                worker_id: self.id,
                iterations: self.iterations,
                counter_before,
                counter_after,
                elapsed,
            },
            push_wait,
            context_switches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{build_state, Regime};

    #[test]
    fn test_single_producer_synchronized() {
        let state = build_state(Regime::Synchronized, 1_000);
        let counters = Arc::new(HazardCounters::new());

        let result = Producer::new(3, 250, 100, Arc::clone(&state), Arc::clone(&counters)).run();

        assert_eq!(result.record.worker_id, 3);
        assert_eq!(result.record.counter_before, 0);
        assert_eq!(result.record.counter_after, 250);
        assert_eq!(result.record.contribution(), 250);
        assert_eq!(result.push_wait.len(), 250);
        // Iterations 0, 100, 200
        assert_eq!(result.context_switches, 3);
        assert_eq!(counters.context_switches(), 3);
        assert_eq!(counters.swap_events(), 3);
        assert_eq!(counters.iterations_completed(), 250);
        assert_eq!(state.cursor(), 250);
    }

    #[test]
    fn test_yield_every_zero_never_yields() {
        let state = build_state(Regime::Unsynchronized, 4);
        let counters = Arc::new(HazardCounters::new());

        let result = Producer::new(0, 50, 0, state, Arc::clone(&counters)).run();

        assert_eq!(result.context_switches, 0);
        assert_eq!(counters.context_switches(), 0);
        assert_eq!(counters.iterations_completed(), 50);
    }

    #[test]
    fn test_unsynchronized_producer_overwrites_full_buffer() {
        let state = build_state(Regime::Unsynchronized, 4);
        let counters = Arc::new(HazardCounters::new());

        let result = Producer::new(1, 10, 1_000, Arc::clone(&state), counters).run();

        // Alone, the counter is exact; the buffer wraps at 4, 8
        assert_eq!(result.record.counter_after, 10);
        assert_eq!(state.faults().overwrites, 2);
    }
}
