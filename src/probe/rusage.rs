//! Process resource usage via `getrusage(RUSAGE_SELF)`
//!
//! CPU times come back as timevals, so no clock-tick rate is assumed.
//! `max_rss_bytes` is the process high-water mark, not current RSS.
//! Non-Unix targets report zeros.

use std::time::Duration;

/// Resource usage snapshot for this process
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcUsage {
    pub user_time: Duration,
    pub sys_time: Duration,
    /// Peak resident set size in bytes (0 when unknown)
    pub max_rss_bytes: u64,
}

impl ProcUsage {
    /// User + system CPU time
    #[inline]
    pub fn total_cpu_time(&self) -> Duration {
        self.user_time.saturating_add(self.sys_time)
    }

    /// Usage accumulated since an earlier snapshot
    #[inline]
    pub fn since(&self, earlier: &ProcUsage) -> ProcUsageDelta {
        ProcUsageDelta {
            user_time: self.user_time.saturating_sub(earlier.user_time),
            sys_time: self.sys_time.saturating_sub(earlier.sys_time),
            ending_max_rss_bytes: self.max_rss_bytes,
        }
    }

    /// Peak resident set in MB, if the platform reports it
    pub fn max_rss_mb(&self) -> Option<f64> {
        (self.max_rss_bytes > 0).then(|| self.max_rss_bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Difference between two snapshots
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcUsageDelta {
    pub user_time: Duration,
    pub sys_time: Duration,
    /// High-water mark at the later snapshot (not a delta)
    pub ending_max_rss_bytes: u64,
}

impl ProcUsageDelta {
    #[inline]
    pub fn total_cpu_time(&self) -> Duration {
        self.user_time.saturating_add(self.sys_time)
    }
}

#[cfg(unix)]
#[inline]
fn timeval_to_duration(tv: libc::timeval) -> Duration {
    let secs = if tv.tv_sec < 0 { 0 } else { tv.tv_sec as u64 };
    let usec = tv.tv_usec.clamp(0, 999_999) as u64;
    Duration::from_secs(secs) + Duration::from_micros(usec)
}

/// `ru_maxrss` is KiB on Linux and the BSDs, bytes on macOS
#[cfg(unix)]
#[inline]
fn maxrss_to_bytes(ru_maxrss: libc::c_long) -> u64 {
    let rss = if ru_maxrss <= 0 { 0 } else { ru_maxrss as u64 };

    #[cfg(target_os = "macos")]
    {
        rss
    }

    #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    {
        rss.saturating_mul(1024)
    }

    #[cfg(not(any(
        target_os = "macos",
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    )))]
    {
        let _ = rss;
        0
    }
}

/// Resource usage of the current process; zeros if `getrusage` fails
#[cfg(unix)]
pub fn rusage_self() -> ProcUsage {
    // SAFETY: a zeroed rusage is a valid out-parameter and the return code
    // is checked before any field is read.
    unsafe {
        let mut ru: libc::rusage = std::mem::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, &mut ru) != 0 {
            return ProcUsage::default();
        }
        ProcUsage {
            user_time: timeval_to_duration(ru.ru_utime),
            sys_time: timeval_to_duration(ru.ru_stime),
            max_rss_bytes: maxrss_to_bytes(ru.ru_maxrss),
        }
    }
}

#[cfg(not(unix))]
pub fn rusage_self() -> ProcUsage {
    ProcUsage::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_subtracts_times_and_keeps_peak() {
        let earlier = ProcUsage {
            user_time: Duration::from_millis(100),
            sys_time: Duration::from_millis(20),
            max_rss_bytes: 1_000,
        };
        let later = ProcUsage {
            user_time: Duration::from_millis(350),
            sys_time: Duration::from_millis(50),
            max_rss_bytes: 4_000,
        };

        let delta = later.since(&earlier);
        assert_eq!(delta.user_time, Duration::from_millis(250));
        assert_eq!(delta.sys_time, Duration::from_millis(30));
        assert_eq!(delta.total_cpu_time(), Duration::from_millis(280));
        assert_eq!(delta.ending_max_rss_bytes, 4_000);

        // Never negative
        assert_eq!(earlier.since(&later).total_cpu_time(), Duration::ZERO);
    }

    #[test]
    fn test_max_rss_mb() {
        let usage = ProcUsage {
            max_rss_bytes: 2 * 1024 * 1024,
            ..ProcUsage::default()
        };
        assert_eq!(usage.max_rss_mb(), Some(2.0));
        assert_eq!(ProcUsage::default().max_rss_mb(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_cpu_time_advances_with_work() {
        let before = rusage_self();
        let mut acc = 0u64;
        let started = std::time::Instant::now();
        while started.elapsed() < Duration::from_millis(50) {
            acc = acc.wrapping_mul(31).wrapping_add(7);
            std::hint::black_box(acc);
        }
        let after = rusage_self();

        assert!(after.since(&before).total_cpu_time() > Duration::ZERO);
        assert!(after.max_rss_bytes > 0);
    }
}
