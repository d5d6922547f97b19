//! Unsynchronized regime
//!
//! An instrumented fault generator, not a lock-free queue. Every access is
//! a separate relaxed load or store, so concurrent read-modify-write
//! sequences interleave and lose updates exactly as unguarded shared
//! integers do, without undefined behaviour. Buffer policy:
//! - producer finds cursor >= capacity: record an overwrite, reset cursor to 0
//! - consumer finds cursor == 0: record an underflow, take nothing

use std::hint;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

use super::{BufferFaults, Checkpoint, Item, Regime, SharedState};

/// Spin iterations inserted between the counter read and write
const RACE_WINDOW_SPINS: u32 = 32;

pub struct UnsynchronizedState {
    counter: AtomicU64,
    slots: Box<[AtomicUsize]>,
    cursor: AtomicUsize,
    overwrites: AtomicU64,
    underflows: AtomicU64,
}

impl UnsynchronizedState {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be non-zero");
        Self {
            counter: AtomicU64::new(0),
            slots: (0..capacity).map(|_| AtomicUsize::new(0)).collect(),
            cursor: AtomicUsize::new(0),
            overwrites: AtomicU64::new(0),
            underflows: AtomicU64::new(0),
        }
    }

    #[inline]
    fn widen_race_window(checkpoint: Checkpoint) {
        match checkpoint {
            Checkpoint::Yield => thread::yield_now(),
            Checkpoint::Continue => {
                for _ in 0..RACE_WINDOW_SPINS {
                    hint::spin_loop();
                }
            }
        }
    }
}

impl SharedState for UnsynchronizedState {
    fn regime(&self) -> Regime {
        Regime::Unsynchronized
    }

    fn increment(&self, checkpoint: Checkpoint) {
        let observed = self.counter.load(Ordering::Relaxed);
        Self::widen_race_window(checkpoint);
        self.counter.store(observed + 1, Ordering::Relaxed);
    }

    fn push(&self, item: Item) {
        let mut cursor = self.cursor.load(Ordering::Relaxed);
        if cursor >= self.slots.len() {
            self.overwrites.fetch_add(1, Ordering::Relaxed);
            cursor = 0;
        }
        self.slots[cursor].store(item, Ordering::Relaxed);
        self.cursor.store(cursor + 1, Ordering::Relaxed);
    }

    fn pop(&self) -> Option<Item> {
        let cursor = self.cursor.load(Ordering::Relaxed);
        if cursor == 0 {
            self.underflows.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let top = cursor.min(self.slots.len()) - 1;
        let item = self.slots[top].load(Ordering::Relaxed);
        self.cursor.store(top, Ordering::Relaxed);
        Some(item)
    }

    fn counter(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn faults(&self) -> BufferFaults {
        BufferFaults {
            overwrites: self.overwrites.load(Ordering::Relaxed),
            underflows: self.underflows.load(Ordering::Relaxed),
        }
    }
}
