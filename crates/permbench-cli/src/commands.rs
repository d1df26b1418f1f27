//! `generate` and `bench` command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use permbench_harness::config::AppConfig;
use permbench_harness::fixtures::Corpus;
use permbench_harness::{run_benchmark, BenchmarkReport};

/// Loads the configuration from `path`, or from the environment alone.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

/// Generates a corpus and writes it to `out` (or the configured path).
pub fn generate(config: &AppConfig, out: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let path = out.unwrap_or_else(|| PathBuf::from(&config.output.corpus_path));
    let corpus = Corpus::generate(&config.corpus).context("generating corpus")?;
    corpus.save(&path)?;

    let summary = corpus.summary();
    info!(
        path = %path.display(),
        departments = summary.departments,
        users = summary.users,
        customers = summary.customers,
        documents = summary.documents,
        tree_depth = summary.tree_depth,
        tuples = summary.tuples,
        rows = summary.rows,
        "corpus written"
    );
    Ok(path)
}

/// Benchmarks both engines on the corpus at `corpus_path`, generating it
/// first when the file does not exist. Writes the JSON report to `output`.
pub async fn bench(
    config: &AppConfig,
    corpus_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<BenchmarkReport> {
    let corpus_path = corpus_path.unwrap_or_else(|| PathBuf::from(&config.output.corpus_path));
    let report_path = output.unwrap_or_else(|| PathBuf::from(&config.output.report_path));

    let corpus = if corpus_path.exists() {
        Corpus::load(&corpus_path)
            .with_context(|| format!("reading corpus {}", corpus_path.display()))?
    } else {
        info!(path = %corpus_path.display(), "corpus not found, generating");
        let corpus = Corpus::generate(&config.corpus).context("generating corpus")?;
        corpus.save(&corpus_path)?;
        corpus
    };
    if corpus.settings != config.corpus {
        warn!(
            path = %corpus_path.display(),
            "corpus was generated with different settings than the current configuration"
        );
    }

    let report = run_benchmark(config, Arc::new(corpus))
        .await
        .context("running benchmark")?;
    report.log_summary();
    report.write_json(&report_path)?;

    let mismatches = report.mismatches();
    if mismatches > 0 {
        warn!(mismatches, "engines disagreed on sampled checks");
    }
    Ok(report)
}
