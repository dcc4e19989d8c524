//! Throughput figures for performance-mode runs.

use std::fmt;

use log::warn;

use crate::script::ResultRecord;

/// Throughput statistics over the records that carried device timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputStats {
    pub median_inferences_per_second: f64,
    pub min_inferences_per_second: f64,
    pub max_inferences_per_second: f64,
    pub mean_latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub timed_records: usize,
    pub untimed_records: usize,
    pub throughput: Option<ThroughputStats>,
}

/// Computes throughput from each record's inference count and device time.
pub fn summarize_performance(records: &[ResultRecord]) -> PerformanceSummary {
    let mut rates = Vec::new();
    let mut latencies_ms = Vec::new();
    let mut untimed_records = 0usize;

    for record in records {
        let inferences = record.request.sample_count;
        match record.infer.elapsed_us {
            Some(elapsed_us) if elapsed_us > 0 && inferences > 0 => {
                let seconds = elapsed_us as f64 / 1_000_000.0;
                rates.push(inferences as f64 / seconds);
                latencies_ms.push(elapsed_us as f64 / 1000.0 / inferences as f64);
            }
            _ => {
                warn!("No device timing for '{}', skipping it", record.file);
                untimed_records += 1;
            }
        }
    }

    let throughput = if rates.is_empty() {
        None
    } else {
        rates.sort_by(|a, b| a.total_cmp(b));
        let middle = rates.len() / 2;
        let median = if rates.len() % 2 == 0 {
            (rates[middle - 1] + rates[middle]) / 2.0
        } else {
            rates[middle]
        };

        Some(ThroughputStats {
            median_inferences_per_second: median,
            min_inferences_per_second: rates[0],
            max_inferences_per_second: rates[rates.len() - 1],
            mean_latency_ms: latencies_ms.iter().sum::<f64>() / latencies_ms.len() as f64,
        })
    };

    PerformanceSummary {
        timed_records: rates.len(),
        untimed_records,
        throughput,
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "Performance Results")?;
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(
            f,
            "   Timed records: {} (untimed: {})",
            self.timed_records, self.untimed_records
        )?;

        match &self.throughput {
            Some(stats) => {
                writeln!(
                    f,
                    "   Median throughput: {:.3} inf./sec.",
                    stats.median_inferences_per_second
                )?;
                writeln!(
                    f,
                    "   Range: {:.3} .. {:.3} inf./sec.",
                    stats.min_inferences_per_second, stats.max_inferences_per_second
                )?;
                write!(f, "   Mean latency: {:.3} ms", stats.mean_latency_ms)
            }
            None => write!(f, "   No timing information reported by the device"),
        }
    }
}
