//! Synchronized regime
//!
//! The counter and the buffer are guarded by two distinct mutexes. Buffer
//! admission is controlled by a free-slot semaphore (seeded at capacity) and
//! a filled-slot semaphore (seeded at zero); the buffer mutex still
//! serializes the slot write itself.

use std::thread;

use parking_lot::Mutex;

use super::{
    BufferFaults, Checkpoint, Item, Regime, RingBuffer, Semaphore, SharedState,
};

pub struct SynchronizedState {
    counter: Mutex<u64>,
    buffer: Mutex<RingBuffer>,
    free_slots: Semaphore,
    filled_slots: Semaphore,
    capacity: usize,
}

impl SynchronizedState {
    pub fn new(capacity: usize) -> Self {
        Self {
            counter: Mutex::new(0),
            buffer: Mutex::new(RingBuffer::new(capacity)),
            free_slots: Semaphore::new(capacity),
            filled_slots: Semaphore::new(0),
            capacity,
        }
    }
}

impl SharedState for SynchronizedState {
    fn regime(&self) -> Regime {
        Regime::Synchronized
    }

    fn increment(&self, checkpoint: Checkpoint) {
        let mut counter = self.counter.lock();
        *counter += 1;
        // The yield happens inside the critical section: other producers
        // queue on the mutex instead of slipping in a stale write.
        if checkpoint == Checkpoint::Yield {
            thread::yield_now();
        }
    }

    fn push(&self, item: Item) {
        self.free_slots.acquire();
        {
            let mut buffer = self.buffer.lock();
            let pushed = buffer.push(item);
            debug_assert!(pushed.is_ok(), "free-slot permit granted on a full buffer");
        }
        self.filled_slots.release();
    }

    fn pop(&self) -> Option<Item> {
        self.filled_slots.acquire();
        let item = self.buffer.lock().pop();
        debug_assert!(item.is_some(), "filled-slot permit granted on an empty buffer");
        self.free_slots.release();
        item
    }

    fn counter(&self) -> u64 {
        *self.counter.lock()
    }

    fn cursor(&self) -> usize {
        self.buffer.lock().len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn faults(&self) -> BufferFaults {
        BufferFaults::default()
    }
}
