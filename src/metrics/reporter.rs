//! Metrics reporter - output formatting and export
//!
//! Supports multiple output formats:
//! - Text (sectioned tables)
//! - JSON
//! - CSV

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::snapshot::MetricsSnapshot;
use crate::config::OutputFormat;
use crate::shared::Regime;
use crate::utils::Result;

const RULE: &str = "=====================================================";

/// Metrics reporter
pub struct MetricsReporter {
    format: OutputFormat,
}

impl MetricsReporter {
    /// Create new reporter with specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render one run
    pub fn render(&self, snapshot: &MetricsSnapshot) -> String {
        match self.format {
            OutputFormat::Text => TextReport(snapshot).to_string(),
            OutputFormat::Json => format!("{:#}", snapshot.to_json()),
            OutputFormat::Csv => format!("{}\n{}", csv_header(), csv_row(snapshot)),
        }
    }

    /// Render a batch of trials of one regime
    pub fn render_batch(&self, snapshots: &[MetricsSnapshot]) -> String {
        let Some(first) = snapshots.first() else {
            return String::new();
        };
        let batch = BatchSummary::from_snapshots(snapshots);

        match self.format {
            OutputFormat::Text => format!(
                "\n[ BATCH SUMMARY: {} x{} ]\n\
                 Counter Range             : {} .. {} (expected {})\n\
                 Trials With Lost Updates  : {}/{}\n\
                 Trials With Buffer Faults : {}/{}\n\
                 Max Overwrites            : {}\n\
                 Max Underflows            : {}\n",
                first.regime,
                batch.trials,
                format_count(batch.min_counter),
                format_count(batch.max_counter),
                format_count(first.expected_total()),
                batch.trials_with_lost_updates,
                batch.trials,
                batch.trials_with_faults,
                batch.trials,
                format_count(batch.max_overwrites),
                format_count(batch.max_underflows),
            ),
            OutputFormat::Json => format!(
                "{:#}",
                serde_json::json!({
                    "regime": first.regime.as_str(),
                    "trials": batch.trials,
                    "min_counter": batch.min_counter,
                    "max_counter": batch.max_counter,
                    "trials_with_lost_updates": batch.trials_with_lost_updates,
                    "trials_with_faults": batch.trials_with_faults,
                    "max_overwrites": batch.max_overwrites,
                    "max_underflows": batch.max_underflows
                })
            ),
            OutputFormat::Csv => {
                let mut out = csv_header().to_string();
                for snap in snapshots {
                    out.push('\n');
                    out.push_str(&csv_row(snap));
                }
                out
            }
        }
    }

    /// Side-by-side comparison of the two regimes (text only)
    pub fn render_comparison(
        &self,
        unsynchronized: &MetricsSnapshot,
        synchronized: &MetricsSnapshot,
    ) -> String {
        let rows: [(&str, String, String); 9] = [
            (
                "Counter",
                format_count(unsynchronized.counter_value),
                format_count(synchronized.counter_value),
            ),
            (
                "Lost Updates",
                format_count(unsynchronized.lost_updates()),
                format_count(synchronized.lost_updates()),
            ),
            (
                "Integrity Rate",
                format!("{:.2}%", unsynchronized.integrity_rate()),
                format!("{:.2}%", synchronized.integrity_rate()),
            ),
            (
                "Overwrites",
                format_count(unsynchronized.faults.overwrites),
                format_count(synchronized.faults.overwrites),
            ),
            (
                "Underflows",
                format_count(unsynchronized.faults.underflows),
                format_count(synchronized.faults.underflows),
            ),
            (
                "Context Switches",
                format_count(unsynchronized.context_switches),
                format_count(synchronized.context_switches),
            ),
            (
                "Push Wait p99 (us)",
                format_count(unsynchronized.push_wait.p99_us),
                format_count(synchronized.push_wait.p99_us),
            ),
            (
                "Execution Time (s)",
                format!("{:.6}", unsynchronized.wall_clock.as_secs_f64()),
                format!("{:.6}", synchronized.wall_clock.as_secs_f64()),
            ),
            (
                "Throughput (ops/s)",
                format_throughput(unsynchronized.throughput()),
                format_throughput(synchronized.throughput()),
            ),
        ];

        let mut out = format!(
            "\n[ REGIME COMPARISON ]\n{:24} {:>16} {:>16}\n{}\n",
            "Metric",
            Regime::Unsynchronized.as_str(),
            Regime::Synchronized.as_str(),
            "-".repeat(58)
        );
        for (label, left, right) in rows {
            out.push_str(&format!("{:24} {:>16} {:>16}\n", label, left, right));
        }
        out
    }

    /// Write all snapshots to a JSON file
    pub fn write_json_file(&self, path: &Path, snapshots: &[MetricsSnapshot]) -> Result<()> {
        let json = serde_json::json!({
            "runs": snapshots.iter().map(|s| s.to_json()).collect::<Vec<_>>()
        });

        let mut file = File::create(path)?;
        writeln!(file, "{:#}", json)?;
        Ok(())
    }
}

/// Aggregate over repeated trials of one regime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub trials: usize,
    pub min_counter: u64,
    pub max_counter: u64,
    pub trials_with_lost_updates: usize,
    pub trials_with_faults: usize,
    pub max_overwrites: u64,
    pub max_underflows: u64,
}

impl BatchSummary {
    pub fn from_snapshots(snapshots: &[MetricsSnapshot]) -> Self {
        Self {
            trials: snapshots.len(),
            min_counter: snapshots.iter().map(|s| s.counter_value).min().unwrap_or(0),
            max_counter: snapshots.iter().map(|s| s.counter_value).max().unwrap_or(0),
            trials_with_lost_updates: snapshots.iter().filter(|s| s.lost_updates() > 0).count(),
            trials_with_faults: snapshots.iter().filter(|s| s.faults.any()).count(),
            max_overwrites: snapshots.iter().map(|s| s.faults.overwrites).max().unwrap_or(0),
            max_underflows: snapshots.iter().map(|s| s.faults.underflows).max().unwrap_or(0),
        }
    }
}

/// Sectioned text layout for one run
struct TextReport<'a>(&'a MetricsSnapshot);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let flags = s.flags();
        let title = match s.regime {
            Regime::Unsynchronized => "CONCURRENCY FAILURE REPORT",
            Regime::Synchronized => "CONCURRENCY SOLUTION REPORT",
        };

        writeln!(f, "\n{}", RULE)?;
        writeln!(f, "  {} ({}, trial {})", title, s.regime, s.trial)?;
        writeln!(f, "{}", RULE)?;

        writeln!(f, "\n[ DATA INTEGRITY MATRIX ]")?;
        writeln!(f, "+---------+-------------+-------------+")?;
        writeln!(f, "| Worker  | Before      | After       |")?;
        writeln!(f, "+---------+-------------+-------------+")?;
        for w in &s.workers {
            writeln!(
                f,
                "| {:>7} | {:>11} | {:>11} |",
                w.worker_id + 1,
                w.counter_before,
                w.counter_after
            )?;
        }
        writeln!(f, "+---------+-------------+-------------+")?;

        writeln!(f, "\nExpected Increments       : {}", format_count(s.expected_total()))?;
        writeln!(f, "Actual Recorded           : {}", format_count(s.counter_value))?;
        writeln!(f, "Lost Updates (Race)       : {}", format_count(s.lost_updates()))?;
        writeln!(f, "Data Integrity Rate       : {:.2}%", s.integrity_rate())?;

        writeln!(f, "\n[ PRODUCER-CONSUMER MATRIX ]")?;
        writeln!(f, "Buffer Size               : {} slots", s.buffer_capacity)?;
        writeln!(f, "Buffer Overwrites         : {}", format_count(s.faults.overwrites))?;
        writeln!(f, "Buffer Underflows         : {}", format_count(s.faults.underflows))?;
        writeln!(
            f,
            "Items Consumed            : {}/{}",
            format_count(s.consumer.consumed),
            format_count(s.consumer.iterations)
        )?;

        writeln!(f, "\n[ SWAPPING MATRIX ]")?;
        writeln!(f, "Swap Penalty (Measured)   : {:.6} units", s.swap_penalty_secs)?;
        writeln!(f, "Total Swap Events         : {}", format_count(s.swap_events))?;
        writeln!(f, "Total Swap Overhead       : {:.6} units", s.swap_overhead_secs())?;

        writeln!(f, "\n[ SCHEDULING & STARVATION ]")?;
        writeln!(
            f,
            "Scheduling Latency        : {:.6} sec",
            s.scheduling_latency.as_secs_f64()
        )?;
        writeln!(f, "Forced Context Switches   : {}", format_count(s.context_switches))?;
        if s.starvation_witness {
            write!(
                f,
                "Starvation Events         : {}/{}",
                s.starvation_events, s.starvation_target
            )?;
            if s.starvation_in_progress() {
                write!(f, " (witness still running)")?;
            }
            writeln!(f)?;
        } else {
            writeln!(f, "Starvation Events         : {}", s.starvation_events)?;
        }
        writeln!(f, "Deadlock Pair             : {}", s.deadlock.as_str())?;

        writeln!(f, "\n[ PERFORMANCE METRICS ]")?;
        writeln!(
            f,
            "Total Execution Time      : {:.6} seconds",
            s.wall_clock.as_secs_f64()
        )?;
        writeln!(f, "CPU Time Used             : {:.6} seconds", s.cpu_time_secs)?;
        writeln!(
            f,
            "Throughput                : {} ops/sec",
            format_throughput(s.throughput())
        )?;
        writeln!(
            f,
            "Push Wait (us)            : avg={:.2} p50={} p99={} max={}",
            s.push_wait.mean_us, s.push_wait.p50_us, s.push_wait.p99_us, s.push_wait.max_us
        )?;

        writeln!(f, "\n[ PROBLEMS ]")?;
        writeln!(f, "Race Condition            : {}", yes_no(flags.race_condition))?;
        writeln!(
            f,
            "Critical Section          : {}",
            if flags.critical_section_violated {
                "Violated"
            } else {
                "Protected"
            }
        )?;
        writeln!(
            f,
            "Producer-Consumer         : {}",
            if flags.producer_consumer_fault {
                "YES"
            } else {
                "RESOLVED"
            }
        )?;
        writeln!(f, "Deadlock                  : {}", yes_no(flags.deadlock))?;
        writeln!(
            f,
            "Starvation                : {}",
            if flags.starvation { "YES" } else { "MINIMIZED" }
        )?;
        writeln!(f, "Data Inconsistency        : {}", yes_no(flags.data_inconsistency))?;
        write!(f, "{}", RULE)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

fn csv_header() -> &'static str {
    "regime,trial,expected,counter,lost_updates,overwrites,underflows,context_switches,swap_events,swap_overhead_secs,starvation_events,deadlock,wall_clock_secs,cpu_time_secs,throughput,push_wait_p99_us"
}

fn csv_row(s: &MetricsSnapshot) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{:.6},{},{},{:.6},{:.6},{:.2},{}",
        s.regime,
        s.trial,
        s.expected_total(),
        s.counter_value,
        s.lost_updates(),
        s.faults.overwrites,
        s.faults.underflows,
        s.context_switches,
        s.swap_events,
        s.swap_overhead_secs(),
        s.starvation_events,
        s.deadlock.as_str(),
        s.wall_clock.as_secs_f64(),
        s.cpu_time_secs,
        s.throughput(),
        s.push_wait.p99_us
    )
}

/// Format throughput without meaningless decimals
/// Examples: 1,234,567 ops/s, 987,654 ops/s
pub fn format_throughput(throughput: f64) -> String {
    let value = throughput as u64;
    format_count(value)
}

/// Format large numbers with thousands separators
/// Examples: 1,234,567 or 987,654
pub fn format_count(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::DeadlockObservation;
    use crate::metrics::snapshot::tests::sample_snapshot;

    #[test]
    fn test_output_format() {
        let reporter = MetricsReporter::new(OutputFormat::Text);
        assert_eq!(reporter.format(), OutputFormat::Text);
    }

    #[test]
    fn test_text_report_sections() {
        let mut snap = sample_snapshot(Regime::Unsynchronized, 80);
        snap.faults.overwrites = 7;
        snap.deadlock = DeadlockObservation::Stuck;
        let text = MetricsReporter::new(OutputFormat::Text).render(&snap);

        for section in [
            "CONCURRENCY FAILURE REPORT",
            "[ DATA INTEGRITY MATRIX ]",
            "[ PRODUCER-CONSUMER MATRIX ]",
            "[ SWAPPING MATRIX ]",
            "[ SCHEDULING & STARVATION ]",
            "[ PERFORMANCE METRICS ]",
            "[ PROBLEMS ]",
        ] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("Lost Updates (Race)       : 20"));
        assert!(text.contains("Buffer Overwrites         : 7"));
        assert!(text.contains("Race Condition            : YES"));
        assert!(text.contains("Critical Section          : Violated"));
        assert!(text.contains("Deadlock                  : YES"));
    }

    #[test]
    fn test_text_report_starvation_progress() {
        let mut snap = sample_snapshot(Regime::Unsynchronized, 100);
        snap.starvation_witness = true;
        snap.starvation_target = 5;
        snap.starvation_events = 1;
        let text = MetricsReporter::new(OutputFormat::Text).render(&snap);
        assert!(text.contains("Starvation Events         : 1/5 (witness still running)"));

        snap.starvation_events = 5;
        let text = MetricsReporter::new(OutputFormat::Text).render(&snap);
        assert!(text.contains("Starvation Events         : 5/5\n"));

        let text = MetricsReporter::new(OutputFormat::Text)
            .render(&sample_snapshot(Regime::Synchronized, 100));
        assert!(text.contains("Starvation Events         : 0\n"));
    }

    #[test]
    fn test_text_report_resolved() {
        let snap = sample_snapshot(Regime::Synchronized, 100);
        let text = MetricsReporter::new(OutputFormat::Text).render(&snap);

        assert!(text.contains("CONCURRENCY SOLUTION REPORT"));
        assert!(text.contains("Race Condition            : NO"));
        assert!(text.contains("Critical Section          : Protected"));
        assert!(text.contains("Producer-Consumer         : RESOLVED"));
        assert!(text.contains("Starvation                : MINIMIZED"));
        assert!(text.contains("Data Inconsistency        : NO"));
    }

    #[test]
    fn test_json_render_parses() {
        let snap = sample_snapshot(Regime::Synchronized, 100);
        let text = MetricsReporter::new(OutputFormat::Json).render(&snap);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["integrity"]["counter"], 100);
        assert_eq!(value["buffer"]["overwrites"], 0);
    }

    #[test]
    fn test_csv_render_columns_match() {
        let snap = sample_snapshot(Regime::Synchronized, 100);
        let text = MetricsReporter::new(OutputFormat::Csv).render(&snap);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].split(',').count(),
            lines[1].split(',').count()
        );
        assert!(lines[1].starts_with("synchronized,1,100,100,0,"));
    }

    #[test]
    fn test_batch_summary() {
        let mut a = sample_snapshot(Regime::Unsynchronized, 100);
        let mut b = sample_snapshot(Regime::Unsynchronized, 70);
        a.faults.underflows = 3;
        b.faults.overwrites = 9;
        b.trial = 2;

        let batch = BatchSummary::from_snapshots(&[a.clone(), b.clone()]);
        assert_eq!(batch.trials, 2);
        assert_eq!(batch.min_counter, 70);
        assert_eq!(batch.max_counter, 100);
        assert_eq!(batch.trials_with_lost_updates, 1);
        assert_eq!(batch.trials_with_faults, 2);
        assert_eq!(batch.max_overwrites, 9);
        assert_eq!(batch.max_underflows, 3);

        let text = MetricsReporter::new(OutputFormat::Text).render_batch(&[a, b]);
        assert!(text.contains("Trials With Lost Updates  : 1/2"));
        assert!(MetricsReporter::new(OutputFormat::Text)
            .render_batch(&[])
            .is_empty());
    }

    #[test]
    fn test_comparison_table() {
        let unsync = sample_snapshot(Regime::Unsynchronized, 90);
        let sync = sample_snapshot(Regime::Synchronized, 100);
        let text = MetricsReporter::new(OutputFormat::Text).render_comparison(&unsync, &sync);
        assert!(text.contains("[ REGIME COMPARISON ]"));
        assert!(text.contains("unsynchronized"));
        assert!(text.lines().any(|l| l.starts_with("Lost Updates") && l.contains("10")));
    }

    #[test]
    fn test_write_json_file() {
        let path = std::env::temp_dir().join(format!(
            "sync-hazard-report-{}.json",
            std::process::id()
        ));
        let snap = sample_snapshot(Regime::Synchronized, 100);
        MetricsReporter::new(OutputFormat::Text)
            .write_json_file(&path, &[snap])
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["runs"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(123), "123");
        assert_eq!(format_count(1234), "1,234");
        assert_eq!(format_count(600000), "600,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(format_throughput(937821.7051), "937,821");
        assert_eq!(format_throughput(123.456), "123");
    }
}
