//! Consumer worker
//!
//! Pops exactly `producers × iterations` times regardless of what is
//! actually in the buffer. In the synchronized regime that drains every
//! produced item; in the unsynchronized regime surplus iterations become
//! underflow faults.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::counters::HazardCounters;
use crate::shared::SharedState;

/// Result from the consumer thread
#[derive(Debug, Clone, Default)]
pub struct ConsumerResult {
    /// Pop attempts made
    pub iterations: u64,
    /// Pops that returned an item
    pub consumed: u64,
    /// Items received, indexed by producer id
    pub per_producer: Vec<u64>,
    pub elapsed: Duration,
}

pub struct Consumer {
    iterations: u64,
    producers: usize,
    state: Arc<dyn SharedState>,
    counters: Arc<HazardCounters>,
}

impl Consumer {
    pub fn new(
        iterations: u64,
        producers: usize,
        state: Arc<dyn SharedState>,
        counters: Arc<HazardCounters>,
    ) -> Self {
        Self {
            iterations,
            producers,
            state,
            counters,
        }
    }

    pub fn run(self) -> ConsumerResult {
        let started = Instant::now();
        let mut per_producer = vec![0u64; self.producers];
        let mut consumed = 0u64;

        for _ in 0..self.iterations {
            if let Some(producer) = self.state.pop() {
                consumed += 1;
                self.counters.record_consumed();
                if let Some(tally) = per_producer.get_mut(producer) {
                    *tally += 1;
                }
            }
        }

        let elapsed = started.elapsed();
        debug!(
            "Consumer done: {}/{} pops returned items in {:.3}s",
            consumed,
            self.iterations,
            elapsed.as_secs_f64()
        );

        ConsumerResult {
            iterations: self.iterations,
            consumed,
            per_producer,
            elapsed,
        }
    }
}
