//! Swap penalty probe
//!
//! The penalty stands in for the cost of paging a worker out: twice the sum
//! of a small-file write latency and the time to move the process's peak
//! resident set at the measured disk write speed. Any probe failure falls back to
//! [`FALLBACK_SWAP_PENALTY`]; a run is never blocked on it.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, warn};

use super::rusage::rusage_self;

/// Penalty used when the hardware cannot be measured
pub const FALLBACK_SWAP_PENALTY: f64 = 2.0;

/// Resident set assumed when the platform reports no peak RSS (MB)
const DEFAULT_RESIDENT_MB: f64 = 10.0;

const BLOCK_SIZE: usize = 1024 * 1024;
const BLOCK_COUNT: usize = 5;

/// Distinguishes scratch files of concurrent probes in one process
static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// Source of the per-run swap penalty
pub trait SwapProbe: Send + Sync {
    /// Penalty in seconds; always finite and non-negative
    fn measure(&self) -> f64;
}

/// Constant penalty (CLI override, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedSwapProbe(pub f64);

impl SwapProbe for FixedSwapProbe {
    fn measure(&self) -> f64 {
        sanitize(self.0)
    }
}

/// Disk/memory benchmark probe
#[derive(Debug, Clone)]
pub struct HardwareSwapProbe {
    scratch_dir: PathBuf,
    scratch_id: u64,
}

impl HardwareSwapProbe {
    /// Probe that writes its scratch files under the system temp directory
    pub fn new() -> Self {
        Self::with_scratch_dir(std::env::temp_dir())
    }

    pub fn with_scratch_dir(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            scratch_id: SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch_dir.join(format!(
            "sync-hazard-{}-{}-{}",
            std::process::id(),
            self.scratch_id,
            name
        ))
    }

    /// Disk write speed in MB/s
    fn disk_speed(&self) -> io::Result<f64> {
        let path = self.scratch_path("disk.bin");
        let block = vec![0u8; BLOCK_SIZE];

        let start = Instant::now();
        let result = (|| {
            let mut file = File::create(&path)?;
            for _ in 0..BLOCK_COUNT {
                file.write_all(&block)?;
            }
            file.flush()
        })();
        let elapsed = start.elapsed().as_secs_f64();
        let _ = fs::remove_file(&path);
        result?;

        if elapsed <= 0.0 {
            return Err(io::Error::other("disk write completed in zero time"));
        }
        Ok(BLOCK_COUNT as f64 / elapsed)
    }

    /// Latency of creating and writing a one-byte file, in seconds
    fn write_latency(&self) -> io::Result<f64> {
        let path = self.scratch_path("lat.txt");

        let start = Instant::now();
        let result = File::create(&path).and_then(|mut f| f.write_all(b"A"));
        let elapsed = start.elapsed().as_secs_f64();
        let _ = fs::remove_file(&path);
        result?;

        Ok(elapsed)
    }
}

impl Default for HardwareSwapProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapProbe for HardwareSwapProbe {
    fn measure(&self) -> f64 {
        let disk_speed = match self.disk_speed() {
            Ok(speed) => speed,
            Err(e) => {
                warn!(
                    "Swap probe disk benchmark failed in {}: {}; using {:.1}",
                    self.scratch_dir.display(),
                    e,
                    FALLBACK_SWAP_PENALTY
                );
                return FALLBACK_SWAP_PENALTY;
            }
        };

        let resident_mb = rusage_self().max_rss_mb().unwrap_or(DEFAULT_RESIDENT_MB);

        let latency = match self.write_latency() {
            Ok(latency) => latency,
            Err(e) => {
                warn!("Swap probe latency write failed: {}; ignoring latency term", e);
                0.0
            }
        };

        let penalty = 2.0 * (latency + resident_mb / disk_speed);
        debug!(
            "Swap probe: disk={:.1} MB/s rss={:.1} MB latency={:.6}s penalty={:.6}s",
            disk_speed, resident_mb, latency, penalty
        );
        sanitize(penalty)
    }
}

fn sanitize(penalty: f64) -> f64 {
    if penalty.is_finite() && penalty >= 0.0 {
        penalty
    } else {
        FALLBACK_SWAP_PENALTY
    }
}
