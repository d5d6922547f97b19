//! Two-resource deadlock pair
//!
//! W1 takes A then B, W2 takes B then A, with a hold period between the two
//! acquisitions. When both workers are inside the hold window at the same
//! time each ends up waiting for the lock the other owns, forever. Nothing
//! here detects or breaks that: the pair is started detached and must never
//! be joined.
//!
//! Per-worker state machine:
//! `Idle -> HoldingFirst -> AttemptingSecond -> HoldingBoth -> Released`

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::utils::{HarnessError, Result};

/// Progress of one deadlock worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PairState {
    Idle = 0,
    HoldingFirst = 1,
    AttemptingSecond = 2,
    HoldingBoth = 3,
    Released = 4,
}

impl PairState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PairState::HoldingFirst,
            2 => PairState::AttemptingSecond,
            3 => PairState::HoldingBoth,
            4 => PairState::Released,
            _ => PairState::Idle,
        }
    }
}

/// What the report can say about the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlockObservation {
    /// Pair not started (synchronized regime)
    NotRun,
    /// Still inside the hold window when observed
    Pending,
    /// Both workers released their locks
    Completed,
    /// Both workers blocked on their second lock
    Stuck,
}

impl DeadlockObservation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlockObservation::NotRun => "not-run",
            DeadlockObservation::Pending => "pending",
            DeadlockObservation::Completed => "completed",
            DeadlockObservation::Stuck => "stuck",
        }
    }

    pub fn is_deadlocked(&self) -> bool {
        matches!(self, DeadlockObservation::Stuck)
    }
}

#[derive(Debug, Clone, Copy)]
enum Resource {
    A,
    B,
}

/// The two locks the pair contends on; never shared with producers/consumer
#[derive(Default)]
pub struct TwoResourceLock {
    a: Mutex<()>,
    b: Mutex<()>,
}

impl TwoResourceLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, resource: Resource) -> &Mutex<()> {
        match resource {
            Resource::A => &self.a,
            Resource::B => &self.b,
        }
    }
}

/// Lock-order-violating worker pair
pub struct DeadlockPair {
    locks: Arc<TwoResourceLock>,
    hold: Duration,
}

impl DeadlockPair {
    pub fn new(hold: Duration) -> Self {
        Self {
            locks: Arc::new(TwoResourceLock::new()),
            hold,
        }
    }

    /// Spawn both workers detached
    pub fn start(self) -> Result<DeadlockHandle> {
        let states: Arc<[AtomicU8; 2]> =
            Arc::new([AtomicU8::new(PairState::Idle as u8), AtomicU8::new(PairState::Idle as u8)]);

        let orders = [[Resource::A, Resource::B], [Resource::B, Resource::A]];

        for (index, order) in orders.into_iter().enumerate() {
            let locks = Arc::clone(&self.locks);
            let states = Arc::clone(&states);
            let hold = self.hold;
            let role = format!("deadlock-w{}", index + 1);

            // Handle dropped immediately: the pair is never joined
            thread::Builder::new()
                .name(role.clone())
                .spawn(move || run_worker(&locks, order, hold, &states[index]))
                .map_err(|e| HarnessError::spawn(role, e))?;
        }

        debug!("Deadlock pair started (hold {:?})", self.hold);
        Ok(DeadlockHandle { states })
    }
}

fn run_worker(locks: &TwoResourceLock, order: [Resource; 2], hold: Duration, state: &AtomicU8) {
    let first = locks.get(order[0]).lock();
    state.store(PairState::HoldingFirst as u8, Ordering::SeqCst);

    thread::sleep(hold);

    state.store(PairState::AttemptingSecond as u8, Ordering::SeqCst);
    let second = locks.get(order[1]).lock();
    state.store(PairState::HoldingBoth as u8, Ordering::SeqCst);

    drop(second);
    drop(first);
    state.store(PairState::Released as u8, Ordering::SeqCst);
}

/// Observer for a running pair's state machines
pub struct DeadlockHandle {
    states: Arc<[AtomicU8; 2]>,
}

impl DeadlockHandle {
    /// Current state of worker 0 (A then B) or 1 (B then A)
    pub fn state(&self, worker: usize) -> PairState {
        PairState::from_u8(self.states[worker].load(Ordering::SeqCst))
    }

    /// Classify the pair right now
    pub fn observe(&self) -> DeadlockObservation {
        let states = [self.state(0), self.state(1)];
        if states.iter().all(|s| *s == PairState::AttemptingSecond) {
            DeadlockObservation::Stuck
        } else if states.iter().all(|s| *s == PairState::Released) {
            DeadlockObservation::Completed
        } else {
            DeadlockObservation::Pending
        }
    }

    /// Poll until the pair is stuck or completed, giving up after `timeout`.
    /// Always returns within the timeout; never joins.
    pub fn settle(&self, timeout: Duration) -> DeadlockObservation {
        let deadline = Instant::now() + timeout;
        loop {
            let observed = self.observe();
            if observed != DeadlockObservation::Pending || Instant::now() >= deadline {
                info!("Deadlock pair observed: {}", observed.as_str());
                return observed;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}
