//! Metrics collection and reporting
//!
//! This module provides:
//! - Per-producer counter observations and push-wait latency
//! - End-of-run snapshot with data-derived hazard flags
//! - Batch and cross-regime summaries
//! - Text/JSON/CSV export

pub mod collector;
pub mod reporter;
pub mod snapshot;

pub use collector::{MetricsCollector, RunTimings};
pub use reporter::{format_count, format_throughput, BatchSummary, MetricsReporter};
pub use snapshot::{HazardFlags, LatencySummary, MetricsSnapshot, WorkerRecord};
