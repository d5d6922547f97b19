//! Run-wide atomic tallies
//!
//! These are metrics, not coordination: they are updated with atomic
//! `fetch_add` in both regimes so the reported numbers are exact even when
//! the workload itself is racing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Tallies shared between all workers of one run
pub struct HazardCounters {
    /// Voluntary yields taken by producers
    pub context_switches: AtomicU64,

    /// Simulated swap events (one per forced context switch)
    pub swap_events: AtomicU64,

    /// Completed starvation-witness iterations
    pub starvation_events: AtomicU64,

    /// Producer iterations completed (progress reporting)
    pub iterations_completed: AtomicU64,

    /// Consumer iterations that obtained an item
    pub items_consumed: AtomicU64,

    /// Stops the progress reporter
    pub shutdown: AtomicBool,
}

impl HazardCounters {
    /// Create new counters initialized to zero
    pub fn new() -> Self {
        Self {
            context_switches: AtomicU64::new(0),
            swap_events: AtomicU64::new(0),
            starvation_events: AtomicU64::new(0),
            iterations_completed: AtomicU64::new(0),
            items_consumed: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Record a forced context switch and the swap it simulates
    #[inline]
    pub fn record_context_switch(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
        self.swap_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_starvation_event(&self) {
        self.starvation_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_iterations(&self, count: u64) {
        self.iterations_completed.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_consumed(&self) {
        self.items_consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn context_switches(&self) -> u64 {
        self.context_switches.load(Ordering::Relaxed)
    }

    pub fn swap_events(&self) -> u64 {
        self.swap_events.load(Ordering::Relaxed)
    }

    pub fn starvation_events(&self) -> u64 {
        self.starvation_events.load(Ordering::Relaxed)
    }

    pub fn iterations_completed(&self) -> u64 {
        self.iterations_completed.load(Ordering::Relaxed)
    }

    pub fn items_consumed(&self) -> u64 {
        self.items_consumed.load(Ordering::Relaxed)
    }

    /// Signal shutdown to the progress reporter
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

impl Default for HazardCounters {
    fn default() -> Self {
        Self::new()
    }
}
