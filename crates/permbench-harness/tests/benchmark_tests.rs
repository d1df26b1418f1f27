//! End-to-end tests: generate a corpus, load both engines and benchmark them.

use std::sync::Arc;

use permbench_domain::model::{OrgGraph, Owner};
use permbench_harness::config::{AppConfig, CorpusSettings, Scenario};
use permbench_harness::engine::{AccessEngine, EngineKind, FlatAclEngine, TupleEngine};
use permbench_harness::fixtures::Corpus;
use permbench_harness::loader::load_all;
use permbench_harness::requests::RequestCorpus;
use permbench_harness::{run_benchmark, BenchmarkRunner};
use permbench_storage::AclStore;

fn small_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.corpus = CorpusSettings {
        users: 80,
        departments: 16,
        customers: 30,
        documents: 200,
        max_depth: 4,
        max_department_size: 8,
        max_followers: 6,
        customer_owned_ratio: 0.5,
        batch_size: 64,
        seed: 42,
    };
    config.benchmark.requests = 500;
    config.benchmark.mutations = 20;
    config.benchmark.cross_check_samples = 500;
    config.benchmark.warmup_rounds = 1;
    config.benchmark.measured_rounds = 2;
    config.benchmark.concurrency = 4;
    config.validate().unwrap();
    config
}

fn engines(
    corpus: &Corpus,
    config: &AppConfig,
    loaded: permbench_harness::loader::LoadedStores,
) -> Vec<Arc<dyn AccessEngine>> {
    vec![
        Arc::new(TupleEngine::new(
            loaded.tuples,
            corpus.graph.clone(),
            config.resolver_config(corpus.graph.max_depth()),
        )),
        Arc::new(FlatAclEngine::new(loaded.acl)),
    ]
}

async fn assert_agree_with(graph: &OrgGraph, engines: &[Arc<dyn AccessEngine>]) {
    let users: Vec<_> = graph.users().collect();
    let documents: Vec<_> = graph.documents().map(|(id, _)| id).collect();
    for &user in &users {
        for &document in &documents {
            let expected = graph.can_view(user, document);
            for engine in engines {
                assert_eq!(
                    engine.check(user, document).await.unwrap(),
                    expected,
                    "{} disagrees on user {user} document {document}",
                    engine.kind()
                );
            }
        }
    }
}

#[tokio::test]
async fn test_engines_agree_on_every_pair_of_generated_corpus() {
    let config = small_config();
    let corpus = Arc::new(Corpus::generate(&config.corpus).unwrap());
    let loaded = load_all(Arc::clone(&corpus)).await.unwrap();
    let engines = engines(&corpus, &config, loaded);

    assert_agree_with(&corpus.graph, &engines).await;
}

#[tokio::test]
async fn test_full_benchmark_reports_every_engine_and_scenario() {
    let config = small_config();
    let corpus = Arc::new(Corpus::generate(&config.corpus).unwrap());

    let report = run_benchmark(&config, Arc::clone(&corpus)).await.unwrap();

    assert_eq!(report.records.len(), 4);
    assert_eq!(report.mismatches(), 0);
    assert_eq!(report.corpus, corpus.summary());
    assert_eq!(report.load.flat_acl.items, corpus.summary().rows);

    for record in &report.records {
        assert_eq!(record.errors, 0, "{} {}", record.engine, record.scenario);
        assert!(!record.deadline_exceeded);
        assert_eq!(record.completed_rounds, 2);
    }

    let tuple_checks = report
        .record(EngineKind::TupleGraph, Scenario::Check)
        .unwrap();
    assert_eq!(tuple_checks.latency.count, 1_000);

    let tuple_writes = report
        .record(EngineKind::TupleGraph, Scenario::Mutation)
        .unwrap();
    let flat_writes = report
        .record(EngineKind::FlatAcl, Scenario::Mutation)
        .unwrap();
    assert_eq!(tuple_writes.mutations, flat_writes.mutations);
    // One membership tuple per change for the tuple store.
    assert!((tuple_writes.write_amplification() - 1.0).abs() < f64::EPSILON);
    assert!(flat_writes.pairs_evaluated >= flat_writes.rows_written);
}

#[tokio::test]
async fn test_mutation_scenario_leaves_engines_consistent() {
    let mut config = small_config();
    config.benchmark.scenarios = vec![Scenario::Mutation];
    let corpus = Arc::new(Corpus::generate(&config.corpus).unwrap());
    let loaded = load_all(Arc::clone(&corpus)).await.unwrap();
    let acl = Arc::clone(&loaded.acl);
    let engines = engines(&corpus, &config, loaded);
    let requests = RequestCorpus::build(&corpus.graph, &config.benchmark);

    let records = BenchmarkRunner::new(config.benchmark.clone(), requests, engines.clone())
        .run()
        .await;

    assert!(records.iter().all(|r| r.errors == 0));
    // Every round adds then removes each membership, so the graph is unchanged.
    assert!(acl.verify().await.unwrap().is_empty());
    assert_eq!(acl.row_count().await.unwrap(), corpus.summary().rows);
    assert_agree_with(&corpus.graph, &engines).await;
}

#[tokio::test]
async fn test_two_sequential_runs_are_consistent() {
    let mut config = small_config();
    config.benchmark.concurrency = 1;
    config.benchmark.scenarios = vec![Scenario::Check];
    let corpus = Arc::new(Corpus::generate(&config.corpus).unwrap());

    let first = run_benchmark(&config, Arc::clone(&corpus)).await.unwrap();
    let second = run_benchmark(&config, Arc::clone(&corpus)).await.unwrap();

    assert_eq!(first.mismatches(), 0);
    assert_eq!(second.mismatches(), 0);
    for (a, b) in first.records.iter().zip(&second.records) {
        assert_eq!(a.engine, b.engine);
        assert_eq!(a.latency.count, b.latency.count);
        let ratio = a.latency.throughput / b.latency.throughput;
        assert!(
            (0.1..=10.0).contains(&ratio),
            "{} throughput moved by {ratio:.2}x between runs",
            a.engine
        );
    }
}

#[tokio::test]
async fn test_saved_corpus_benchmarks_like_the_original() {
    let config = small_config();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("corpus.json");
    Corpus::generate(&config.corpus).unwrap().save(&path).unwrap();

    let corpus = Arc::new(Corpus::load(&path).unwrap());
    let loaded = load_all(Arc::clone(&corpus)).await.unwrap();
    let engines = engines(&corpus, &config, loaded);

    assert_agree_with(&corpus.graph, &engines).await;
}

/// A single chain of `levels` departments with every user in the deepest one
/// and every document owned by the root.
fn deep_chain_corpus(levels: u32) -> Corpus {
    let mut graph = OrgGraph::new(levels);
    graph.add_department(1, None).unwrap();
    for id in 2..=u64::from(levels) {
        graph.add_department(id, Some(id - 1)).unwrap();
    }
    for user in 1..=10 {
        graph.add_user(user);
        graph.add_member(u64::from(levels), user).unwrap();
    }
    for document in 1..=20 {
        graph.add_document(document, Owner::Department(1)).unwrap();
    }

    let settings = CorpusSettings {
        users: 10,
        departments: u64::from(levels),
        customers: 0,
        documents: 20,
        max_depth: levels,
        ..CorpusSettings::default()
    };
    Corpus {
        settings,
        generated_at: chrono::Utc::now(),
        graph,
    }
}

#[tokio::test]
async fn test_corpus_deeper_than_configured_resolves_every_member() {
    let mut config = small_config();
    config.benchmark.scenarios = vec![Scenario::Check];
    let corpus = Arc::new(deep_chain_corpus(12));
    assert!(corpus.graph.tree_depth() > config.corpus.max_depth);

    let loaded = load_all(Arc::clone(&corpus)).await.unwrap();
    let engines = engines(&corpus, &config, loaded);
    assert!(engines[0].check(1, 1).await.unwrap());
    assert_agree_with(&corpus.graph, &engines).await;

    let report = run_benchmark(&config, corpus).await.unwrap();
    assert_eq!(report.mismatches(), 0);
}
