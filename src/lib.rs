//! sync-hazard-bench library
//!
//! Dual-regime concurrency hazard harness: an unsynchronized regime that
//! exhibits lost updates, buffer overwrite/underflow, a two-lock deadlock
//! and starvation, and a synchronized regime that removes the race and
//! buffer hazards with locks and counting semaphores.

pub mod config;
pub mod harness;
pub mod metrics;
pub mod probe;
pub mod shared;
pub mod utils;
