//! Hardware probes
//!
//! - [`SwapProbe`]: one scalar swap penalty (seconds) per run
//! - [`rusage_self`]: CPU time and peak RSS for this process

pub mod rusage;
pub mod swap;

pub use rusage::{rusage_self, ProcUsage, ProcUsageDelta};
pub use swap::{FixedSwapProbe, HardwareSwapProbe, SwapProbe, FALLBACK_SWAP_PENALTY};
