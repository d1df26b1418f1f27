//! Benchmark for check operations.
//!
//! Run with: cargo bench -p permbench-domain
//!
//! Measures `document#viewer` checks over a linear department chain, with
//! the member placed at increasing distance from the owning department.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

use permbench_domain::error::DomainResult;
use permbench_domain::model::{
    ObjectRef, OrgGraph, Owner, Relation, Subject, UserId, UsersetRef,
};
use permbench_domain::resolver::{CheckRequest, GraphResolver, ResolverConfig, TupleReader};

/// Fast in-memory tuple reader for benchmarks.
struct BenchTupleReader {
    direct: HashSet<(UsersetRef, UserId)>,
    indirect: HashMap<UsersetRef, Vec<UsersetRef>>,
}

impl BenchTupleReader {
    fn from_graph(graph: &OrgGraph) -> Self {
        let mut direct = HashSet::new();
        let mut indirect: HashMap<UsersetRef, Vec<UsersetRef>> = HashMap::new();
        for tuple in graph.tuples() {
            let node = UsersetRef::new(tuple.object, tuple.relation);
            match tuple.subject {
                Subject::User { id } => {
                    direct.insert((node, id));
                }
                Subject::Userset(userset) => indirect.entry(node).or_default().push(userset),
            }
        }
        Self { direct, indirect }
    }
}

#[async_trait]
impl TupleReader for BenchTupleReader {
    async fn has_direct(
        &self,
        object: ObjectRef,
        relation: Relation,
        user: UserId,
    ) -> DomainResult<bool> {
        Ok(self
            .direct
            .contains(&(UsersetRef::new(object, relation), user)))
    }

    async fn read_usersets(
        &self,
        object: ObjectRef,
        relation: Relation,
    ) -> DomainResult<Vec<UsersetRef>> {
        Ok(self
            .indirect
            .get(&UsersetRef::new(object, relation))
            .cloned()
            .unwrap_or_default())
    }
}

/// Chain of `levels` departments; user `d` is a member of department `d`.
fn chain_graph(levels: u64) -> OrgGraph {
    let mut graph = OrgGraph::new(levels as u32);
    for d in 1..=levels {
        let parent = (d > 1).then(|| d - 1);
        graph
            .add_department(d, parent)
            .expect("chain fits the depth bound");
        graph.add_user(d);
        graph.add_member(d, d).expect("department exists");
    }
    graph
        .add_document(1, Owner::Department(1))
        .expect("owner exists");
    graph
}

fn check_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let levels = 8;
    let graph = chain_graph(levels);
    let resolver = GraphResolver::with_config(
        Arc::new(BenchTupleReader::from_graph(&graph)),
        ResolverConfig::default().with_max_depth(ResolverConfig::depth_for_hierarchy(levels as u32)),
    );

    let mut group = c.benchmark_group("viewer_check_by_member_depth");
    for user in [1u64, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(user), &user, |b, &user| {
            b.to_async(&rt).iter(|| async {
                let result = resolver
                    .check(&CheckRequest::viewer(1, black_box(user)))
                    .await
                    .expect("check succeeds");
                black_box(result.allowed)
            })
        });
    }
    group.finish();

    c.bench_function("viewer_check_denied", |b| {
        b.to_async(&rt).iter(|| async {
            let result = resolver
                .check(&CheckRequest::viewer(1, black_box(999)))
                .await
                .expect("check succeeds");
            black_box(result.allowed)
        })
    });
}

criterion_group!(benches, check_benchmark);
criterion_main!(benches);
