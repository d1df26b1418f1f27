//! permbench-harness: fixture corpus and benchmark runner
//!
//! This crate contains everything between the stores and the command line:
//! - Configuration management
//! - Seeded fixture corpus generation and batch loading
//! - Request corpus and engine adapters
//! - Benchmark runner, latency statistics and the JSON report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              permbench-harness               │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  fixtures.rs - Corpus generator             │
//! │  loader.rs   - Batch load into both stores  │
//! │  requests.rs - Seeded request corpus        │
//! │  engine.rs   - Tuple / flat ACL engines     │
//! │  retry.rs    - Backoff for mutations        │
//! │  runner.rs   - Rounds, workers, deadlines   │
//! │  stats.rs    - Latency percentiles          │
//! │  report.rs   - Benchmark report             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod loader;
pub mod report;
pub mod requests;
pub mod retry;
pub mod runner;
pub mod stats;

// Re-exports for convenience
pub use config::{AppConfig, ConfigLoadError, Scenario};
pub use engine::{AccessEngine, EngineKind, FlatAclEngine, MutationCost, TupleEngine};
pub use error::{HarnessError, HarnessResult};
pub use fixtures::{Corpus, CorpusSummary};
pub use report::{BenchmarkReport, EngineRecord};
pub use runner::{run_benchmark, BenchmarkRunner};
