//! Counting semaphore with FIFO hand-off
//!
//! Built from a mutex and a condition variable. Each caller draws a ticket
//! on entry; a permit is only granted to the holder of the oldest
//! outstanding ticket, so excess callers are admitted strictly in arrival
//! order and never spin.

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
struct SemaphoreState {
    permits: usize,
    next_ticket: u64,
    now_serving: u64,
}

impl SemaphoreState {
    #[inline]
    fn waiters(&self) -> u64 {
        self.next_ticket - self.now_serving
    }
}

/// Counting semaphore
#[derive(Debug)]
pub struct Semaphore {
    state: Mutex<SemaphoreState>,
    changed: Condvar,
}

impl Semaphore {
    /// Create a semaphore seeded with `permits`
    pub fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(SemaphoreState {
                permits,
                next_ticket: 0,
                now_serving: 0,
            }),
            changed: Condvar::new(),
        }
    }

    /// Take one permit, blocking until it is this caller's turn and a
    /// permit is available
    pub fn acquire(&self) {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        while state.now_serving != ticket || state.permits == 0 {
            self.changed.wait(&mut state);
        }

        state.permits -= 1;
        state.now_serving += 1;

        // The next ticket holder may be able to proceed on a remaining permit
        if state.permits > 0 && state.waiters() > 0 {
            self.changed.notify_all();
        }
    }

    /// Return one permit and wake waiters
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.permits += 1;
        let wake = state.waiters() > 0;
        drop(state);

        if wake {
            self.changed.notify_all();
        }
    }

    /// Permits currently available
    #[cfg(test)]
    pub fn available(&self) -> usize {
        self.state.lock().permits
    }

    /// Callers currently blocked in `acquire`
    #[cfg(test)]
    pub fn waiting(&self) -> u64 {
        self.state.lock().waiters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    #[test]
    fn test_acquire_release_counts() {
        let sem = Semaphore::new(2);
        sem.acquire();
        sem.acquire();
        assert_eq!(sem.available(), 0);
        sem.release();
        assert_eq!(sem.available(), 1);
        sem.release();
        assert_eq!(sem.available(), 2);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(0));
        let done = Arc::new(AtomicU64::new(0));

        let handle = {
            let sem = Arc::clone(&sem);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                sem.acquire();
                done.store(1, Ordering::SeqCst);
            })
        };

        assert!(wait_until(Duration::from_secs(5), || sem.waiting() == 1));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(done.load(Ordering::SeqCst), 0);

        sem.release();
        handle.join().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_waiters_admitted_in_arrival_order() {
        let sem = Arc::new(Semaphore::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for id in 0..3u64 {
            let sem_c = Arc::clone(&sem);
            let order_c = Arc::clone(&order);
            handles.push(thread::spawn(move || {
                sem_c.acquire();
                order_c.lock().push(id);
            }));
            // Queue each waiter before starting the next one
            assert!(wait_until(Duration::from_secs(5), || sem.waiting() == id + 1));
        }

        for expected_len in 1..=3 {
            sem.release();
            assert!(wait_until(Duration::from_secs(5), || order.lock().len() == expected_len));
        }

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_permits_conserved_under_contention() {
        let sem = Arc::new(Semaphore::new(3));
        let inside = Arc::new(AtomicU64::new(0));
        let max_inside = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sem = Arc::clone(&sem);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..200 {
                        sem.acquire();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                        sem.release();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert!(max_inside.load(Ordering::SeqCst) <= 3);
        assert_eq!(sem.available(), 3);
        assert_eq!(sem.waiting(), 0);
    }
}
