//! Workload execution
//!
//! This module provides the multi-threaded hazard workload:
//! - HazardCounters: Atomic run-wide tallies and the progress shutdown flag
//! - Producer / Consumer: Worker loops over an injected SharedState
//! - DeadlockPair: Two workers acquiring two locks in opposite order
//! - StarvationWorker: Coarse periodic witness
//! - Orchestrator: Spawns workers, joins them, and assembles the snapshot

pub mod consumer;
pub mod counters;
pub mod deadlock;
pub mod orchestrator;
pub mod producer;
pub mod starvation;

pub use consumer::{Consumer, ConsumerResult};
pub use counters::HazardCounters;
pub use deadlock::{DeadlockHandle, DeadlockObservation, DeadlockPair, PairState, TwoResourceLock};
pub use orchestrator::Orchestrator;
pub use producer::{Producer, ProducerResult};
pub use starvation::{StarvationResult, StarvationWorker};
