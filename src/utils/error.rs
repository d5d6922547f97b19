//! Error types for sync-hazard-bench
//!
//! Workers never fail: hazards are measured, not raised. The only errors
//! are bad configuration, fatal resource exhaustion while starting workers,
//! a worker thread panicking, and I/O while exporting a report.

use std::io;
use thiserror::Error;

/// Top-level harness error
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to spawn {role} thread: {source}")]
    Spawn { role: String, source: io::Error },

    #[error("{0} thread panicked")]
    WorkerPanicked(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl HarnessError {
    /// Wrap a thread spawn failure for the named worker role
    pub fn spawn(role: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            role: role.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
