//! Benchmark report: one record per engine per scenario.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Scenario;
use crate::engine::EngineKind;
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::CorpusSummary;
use crate::loader::LoadStats;
use crate::stats::LatencyStats;

/// Results of one engine on one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRecord {
    pub engine: EngineKind,
    pub scenario: Scenario,
    pub warmup_rounds: u32,
    pub measured_rounds: u32,
    /// Measured rounds that ran to completion before the deadline.
    pub completed_rounds: u32,
    pub concurrency: usize,
    pub latency: LatencyStats,
    /// Failed requests; excluded from `latency`.
    pub errors: usize,
    /// Cross-check disagreements between engines.
    pub mismatches: usize,
    pub deadline_exceeded: bool,
    /// Relationship changes applied (mutation scenario).
    pub mutations: usize,
    /// Tuples or rows written plus deleted by those changes.
    pub rows_written: usize,
    /// Candidate pairs re-derived by those changes.
    pub pairs_evaluated: usize,
}

impl EngineRecord {
    /// Rows written per applied change.
    pub fn write_amplification(&self) -> f64 {
        if self.mutations == 0 {
            0.0
        } else {
            self.rows_written as f64 / self.mutations as f64
        }
    }
}

/// Load results for both stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub tuple_store: LoadStats,
    pub flat_acl: LoadStats,
}

/// Complete benchmark output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_at: DateTime<Utc>,
    pub corpus: CorpusSummary,
    pub load: LoadSummary,
    pub records: Vec<EngineRecord>,
}

impl BenchmarkReport {
    pub fn new(corpus: CorpusSummary, load: LoadSummary, records: Vec<EngineRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            corpus,
            load,
            records,
        }
    }

    pub fn record(&self, engine: EngineKind, scenario: Scenario) -> Option<&EngineRecord> {
        self.records
            .iter()
            .find(|r| r.engine == engine && r.scenario == scenario)
    }

    /// Pairs the engines disagreed on. Every engine record of a scenario
    /// carries that scenario's cross-check count, so each scenario counts once.
    pub fn mismatches(&self) -> usize {
        let mut per_scenario: HashMap<Scenario, usize> = HashMap::new();
        for record in &self.records {
            let count = per_scenario.entry(record.scenario).or_default();
            *count = (*count).max(record.mismatches);
        }
        per_scenario.values().sum()
    }

    /// Writes the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> HarnessResult<()> {
        let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| HarnessError::io(path, e))?;
        info!(path = %path.display(), records = self.records.len(), "report written");
        Ok(())
    }

    /// Logs one summary line per record.
    pub fn log_summary(&self) {
        for record in &self.records {
            info!(
                engine = %record.engine,
                scenario = %record.scenario,
                count = record.latency.count,
                mean_us = record.latency.mean_us,
                p50_us = record.latency.p50_us,
                p95_us = record.latency.p95_us,
                p99_us = record.latency.p99_us,
                max_us = record.latency.max_us,
                throughput = record.latency.throughput,
                errors = record.errors,
                mismatches = record.mismatches,
                deadline_exceeded = record.deadline_exceeded,
                write_amplification = record.write_amplification(),
                "benchmark result"
            );
        }
    }
}
