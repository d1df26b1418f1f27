//! Benchmark runner.
//!
//! Every engine gets the same request corpus. For each scenario and engine:
//! warm-up rounds run first and are discarded, then measured rounds run
//! `concurrency` workers that pull requests from a shared cursor. Each engine
//! run has its own deadline; once it passes, no new requests are dispatched,
//! in-flight ones finish and the partial results are reported.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::config::{AppConfig, BenchmarkSettings, Scenario};
use crate::engine::{AccessEngine, FlatAclEngine, TupleEngine};
use crate::error::HarnessResult;
use crate::fixtures::Corpus;
use crate::loader::load_all;
use crate::report::{BenchmarkReport, EngineRecord, LoadSummary};
use crate::requests::RequestCorpus;
use crate::retry::RetryPolicy;
use crate::stats::LatencyStats;

/// Samples and counters gathered by workers.
#[derive(Debug, Default)]
struct Tally {
    samples: Vec<Duration>,
    errors: usize,
    mutations: usize,
    rows_written: usize,
    pairs_evaluated: usize,
    deadline_hit: bool,
}

impl Tally {
    fn merge(&mut self, other: Tally) {
        self.samples.extend(other.samples);
        self.errors += other.errors;
        self.mutations += other.mutations;
        self.rows_written += other.rows_written;
        self.pairs_evaluated += other.pairs_evaluated;
        self.deadline_hit |= other.deadline_hit;
    }
}

/// Drives every scenario against every engine.
pub struct BenchmarkRunner {
    settings: BenchmarkSettings,
    requests: Arc<RequestCorpus>,
    engines: Vec<Arc<dyn AccessEngine>>,
    retry: RetryPolicy,
}

impl BenchmarkRunner {
    pub fn new(
        settings: BenchmarkSettings,
        requests: RequestCorpus,
        engines: Vec<Arc<dyn AccessEngine>>,
    ) -> Self {
        let retry = RetryPolicy::from(&settings.retry);
        Self {
            settings,
            requests: Arc::new(requests),
            engines,
            retry,
        }
    }

    /// Runs the configured scenarios in order.
    pub async fn run(&self) -> Vec<EngineRecord> {
        let mut records = Vec::new();
        for scenario in &self.settings.scenarios {
            let mismatches = match scenario {
                Scenario::Check => self.cross_check().await,
                Scenario::Mutation => 0,
            };
            for engine in &self.engines {
                let mut record = self.run_engine(Arc::clone(engine), *scenario).await;
                record.mismatches = mismatches;
                records.push(record);
            }
        }
        records
    }

    /// Compares every engine's answer on the first `cross_check_samples`
    /// checks. Requests any engine fails on are skipped.
    pub async fn cross_check(&self) -> usize {
        let mut mismatches = 0;
        let sample = self
            .requests
            .checks
            .iter()
            .take(self.settings.cross_check_samples);

        'pairs: for pair in sample {
            let mut answers = Vec::with_capacity(self.engines.len());
            for engine in &self.engines {
                match engine.check(pair.user, pair.document).await {
                    Ok(allowed) => answers.push((engine.kind(), allowed)),
                    Err(_) => continue 'pairs,
                }
            }
            if answers.windows(2).any(|w| w[0].1 != w[1].1) {
                mismatches += 1;
                warn!(
                    user = pair.user,
                    document = pair.document,
                    answers = ?answers,
                    "engines disagree"
                );
            }
        }

        info!(
            sampled = self.settings.cross_check_samples.min(self.requests.checks.len()),
            mismatches,
            "cross-check finished"
        );
        mismatches
    }

    async fn run_engine(&self, engine: Arc<dyn AccessEngine>, scenario: Scenario) -> EngineRecord {
        let deadline = Instant::now() + self.settings.deadline();
        let mut deadline_exceeded = false;

        for _ in 0..self.settings.warmup_rounds {
            if self.run_round(&engine, scenario, deadline).await.deadline_hit {
                deadline_exceeded = true;
                break;
            }
        }

        let mut measured = Tally::default();
        let mut elapsed = Duration::ZERO;
        let mut completed_rounds = 0;
        if !deadline_exceeded {
            for _ in 0..self.settings.measured_rounds {
                let start = Instant::now();
                let tally = self.run_round(&engine, scenario, deadline).await;
                elapsed += start.elapsed();
                let hit = tally.deadline_hit;
                measured.merge(tally);
                if hit {
                    deadline_exceeded = true;
                    break;
                }
                completed_rounds += 1;
            }
        }

        if deadline_exceeded {
            warn!(
                engine = %engine.kind(),
                scenario = %scenario,
                completed_rounds,
                "deadline exceeded, reporting partial results"
            );
        }

        let record = EngineRecord {
            engine: engine.kind(),
            scenario,
            warmup_rounds: self.settings.warmup_rounds,
            measured_rounds: self.settings.measured_rounds,
            completed_rounds,
            concurrency: self.settings.concurrency,
            latency: LatencyStats::from_samples(&measured.samples, elapsed),
            errors: measured.errors,
            mismatches: 0,
            deadline_exceeded,
            mutations: measured.mutations,
            rows_written: measured.rows_written,
            pairs_evaluated: measured.pairs_evaluated,
        };
        info!(
            engine = %record.engine,
            scenario = %scenario,
            requests = record.latency.count,
            errors = record.errors,
            "engine run finished"
        );
        record
    }

    async fn run_round(
        &self,
        engine: &Arc<dyn AccessEngine>,
        scenario: Scenario,
        deadline: Instant,
    ) -> Tally {
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(self.settings.concurrency);
        for _ in 0..self.settings.concurrency.max(1) {
            handles.push(tokio::spawn(worker(
                Arc::clone(engine),
                Arc::clone(&self.requests),
                scenario,
                Arc::clone(&cursor),
                deadline,
                self.retry,
            )));
        }

        let mut tally = Tally::default();
        for joined in join_all(handles).await {
            match joined {
                Ok(worker_tally) => tally.merge(worker_tally),
                Err(err) => error!(error = %err, "benchmark worker failed"),
            }
        }
        tally
    }
}

/// Loads both engines from `corpus`, runs every configured scenario and
/// assembles the report.
pub async fn run_benchmark(config: &AppConfig, corpus: Arc<Corpus>) -> HarnessResult<BenchmarkReport> {
    let loaded = load_all(Arc::clone(&corpus)).await?;
    let requests = RequestCorpus::build(&corpus.graph, &config.benchmark);

    let engines: Vec<Arc<dyn AccessEngine>> = vec![
        Arc::new(TupleEngine::new(
            loaded.tuples,
            corpus.graph.clone(),
            config.resolver_config(corpus.graph.max_depth()),
        )),
        Arc::new(FlatAclEngine::new(loaded.acl)),
    ];

    info!(
        checks = requests.checks.len(),
        mutations = requests.mutations.len(),
        concurrency = config.benchmark.concurrency,
        "starting benchmark"
    );
    let records = BenchmarkRunner::new(config.benchmark.clone(), requests, engines)
        .run()
        .await;

    Ok(BenchmarkReport::new(
        corpus.summary(),
        LoadSummary {
            tuple_store: loaded.tuple_stats,
            flat_acl: loaded.acl_stats,
        },
        records,
    ))
}

async fn worker(
    engine: Arc<dyn AccessEngine>,
    requests: Arc<RequestCorpus>,
    scenario: Scenario,
    cursor: Arc<AtomicUsize>,
    deadline: Instant,
    retry: RetryPolicy,
) -> Tally {
    let mut tally = Tally::default();
    let total = match scenario {
        Scenario::Check => requests.checks.len(),
        Scenario::Mutation => requests.mutations.len(),
    };

    loop {
        let index = cursor.fetch_add(1, Ordering::Relaxed);
        if index >= total {
            break;
        }
        if Instant::now() >= deadline {
            tally.deadline_hit = true;
            break;
        }

        match scenario {
            Scenario::Check => {
                let pair = requests.checks[index];
                let start = Instant::now();
                match engine.check(pair.user, pair.document).await {
                    Ok(_) => tally.samples.push(start.elapsed()),
                    Err(err) => {
                        tally.errors += 1;
                        error!(
                            engine = %engine.kind(),
                            user = pair.user,
                            document = pair.document,
                            error = %err,
                            "check failed"
                        );
                    }
                }
            }
            Scenario::Mutation => {
                let pair = requests.mutations[index];
                for change in [pair.add(), pair.remove()] {
                    let start = Instant::now();
                    match retry.run("apply", || engine.apply(change)).await {
                        Ok(cost) => {
                            tally.samples.push(start.elapsed());
                            tally.mutations += 1;
                            tally.rows_written += cost.rows_written;
                            tally.pairs_evaluated += cost.pairs_evaluated;
                        }
                        Err(err) => {
                            tally.errors += 1;
                            error!(
                                engine = %engine.kind(),
                                change = ?change,
                                error = %err,
                                "mutation failed"
                            );
                        }
                    }
                }
            }
        }
    }
    tally
}
