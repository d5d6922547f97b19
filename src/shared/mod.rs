//! Shared state for the producer/consumer workload
//!
//! Both regimes expose the same capability set (`increment`, `push`, `pop`)
//! through the [`SharedState`] trait, so the worker loops are identical and
//! only the injected strategy decides whether hazards can happen:
//! - [`SynchronizedState`]: counter mutex, buffer mutex, and a free/filled
//!   semaphore pair. No lost updates, no buffer faults.
//! - [`UnsynchronizedState`]: racy read-modify-write with a widened window,
//!   and a buffer that records overwrite/underflow faults instead of blocking.

pub mod ring_buffer;
pub mod semaphore;
pub mod synchronized;
pub mod unsynchronized;

use std::fmt;
use std::sync::Arc;

pub use ring_buffer::RingBuffer;
pub use semaphore::Semaphore;
pub use synchronized::SynchronizedState;
pub use unsynchronized::UnsynchronizedState;

/// Buffer item: the identity of the producer that wrote it
pub type Item = usize;

/// Which synchronization regime a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    /// Hazard-exhibiting: no locks, no blocking
    Unsynchronized,
    /// Hazard-resolved: mutexes and counting semaphores
    Synchronized,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Unsynchronized => "unsynchronized",
            Regime::Synchronized => "synchronized",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a producer does between reading and writing the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Run straight through
    Continue,
    /// Voluntarily give up the CPU (a forced context switch)
    Yield,
}

/// Bounded-buffer invariant violations observed during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferFaults {
    pub overwrites: u64,
    pub underflows: u64,
}

impl BufferFaults {
    #[inline]
    pub fn total(&self) -> u64 {
        self.overwrites + self.underflows
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.total() > 0
    }
}

/// Counter and bounded buffer shared by all producers and the consumer
pub trait SharedState: Send + Sync {
    /// Regime this strategy implements
    fn regime(&self) -> Regime;

    /// Add one to the shared counter
    fn increment(&self, checkpoint: Checkpoint);

    /// Place an item in the buffer (blocks when full in the synchronized regime)
    fn push(&self, item: Item);

    /// Remove an item (blocks when empty in the synchronized regime);
    /// `None` means an underflow was recorded instead
    fn pop(&self) -> Option<Item>;

    /// Current counter value
    fn counter(&self) -> u64;

    /// Current write cursor
    fn cursor(&self) -> usize;

    /// Buffer capacity in slots
    fn capacity(&self) -> usize;

    /// Faults recorded so far
    fn faults(&self) -> BufferFaults;
}

/// Build the shared-state strategy for a regime
pub fn build_state(regime: Regime, capacity: usize) -> Arc<dyn SharedState> {
    match regime {
        Regime::Unsynchronized => Arc::new(UnsynchronizedState::new(capacity)),
        Regime::Synchronized => Arc::new(SynchronizedState::new(capacity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_matches_regime() {
        for regime in [Regime::Unsynchronized, Regime::Synchronized] {
            let state = build_state(regime, 4);
            assert_eq!(state.regime(), regime);
            assert_eq!(state.capacity(), 4);
            assert_eq!(state.counter(), 0);
            assert_eq!(state.cursor(), 0);
            assert!(!state.faults().any());
        }
    }

    #[test]
    fn test_regime_display() {
        assert_eq!(Regime::Unsynchronized.to_string(), "unsynchronized");
        assert_eq!(Regime::Synchronized.to_string(), "synchronized");
    }

    #[test]
    fn test_buffer_faults_total() {
        let faults = BufferFaults {
            overwrites: 3,
            underflows: 4,
        };
        assert_eq!(faults.total(), 7);
        assert!(faults.any());
        assert!(!BufferFaults::default().any());
    }
}
