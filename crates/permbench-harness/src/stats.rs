//! Latency statistics over measured samples.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Summary of successful request latencies, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
    /// Successful requests per second of wall-clock time.
    pub throughput: f64,
}

impl LatencyStats {
    /// Summarizes `samples` collected over `elapsed` of wall-clock time.
    pub fn from_samples(samples: &[Duration], elapsed: Duration) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut micros: Vec<u64> = samples.iter().map(|d| d.as_micros() as u64).collect();
        micros.sort_unstable();

        let count = micros.len();
        let total: u64 = micros.iter().sum();
        let throughput = if elapsed.is_zero() {
            0.0
        } else {
            count as f64 / elapsed.as_secs_f64()
        };

        Self {
            count,
            mean_us: total as f64 / count as f64,
            p50_us: percentile(&micros, 50),
            p95_us: percentile(&micros, 95),
            p99_us: percentile(&micros, 99),
            max_us: micros[count - 1],
            throughput,
        }
    }
}

/// Nearest-rank percentile of a sorted, non-empty slice: the smallest
/// sample with at least `p` percent of the samples at or below it.
fn percentile(sorted: &[u64], p: usize) -> u64 {
    let rank = (sorted.len() * p).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}
