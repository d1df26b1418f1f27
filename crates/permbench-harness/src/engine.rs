//! The two engines under benchmark, behind one interface.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use permbench_domain::model::{DocumentId, OrgGraph, RelationTuple, UserId};
use permbench_domain::resolver::{CheckRequest, GraphResolver, ResolverConfig, TupleReader};
use permbench_storage::{AclStore, EntityChange, StorageResult, TupleStore};

/// Which engine produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Relationship tuples resolved by graph traversal.
    TupleGraph,
    /// Pre-expanded (user, document) rows.
    FlatAcl,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::TupleGraph => "tuple_graph",
            EngineKind::FlatAcl => "flat_acl",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store work caused by one relationship change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationCost {
    /// Tuples or rows written plus deleted.
    pub rows_written: usize,
    /// Candidate pairs re-derived (flattened ACL only).
    pub pairs_evaluated: usize,
}

/// An engine the harness can drive.
#[async_trait]
pub trait AccessEngine: Send + Sync + 'static {
    fn kind(&self) -> EngineKind;

    /// Whether `user` may view `document`. Denial is `Ok(false)`.
    async fn check(&self, user: UserId, document: DocumentId) -> StorageResult<bool>;

    /// Applies a relationship change, returning what it cost the store.
    async fn apply(&self, change: EntityChange) -> StorageResult<MutationCost>;
}

/// Tuple store plus graph resolver.
///
/// The engine keeps its own copy of the organization graph so it can tell
/// which hierarchy or ownership tuple a change replaces.
pub struct TupleEngine<S> {
    store: Arc<S>,
    resolver: GraphResolver<S>,
    mirror: Mutex<OrgGraph>,
}

impl<S> TupleEngine<S>
where
    S: TupleStore + TupleReader + 'static,
{
    pub fn new(store: Arc<S>, graph: OrgGraph, config: ResolverConfig) -> Self {
        Self {
            resolver: GraphResolver::with_config(Arc::clone(&store), config),
            store,
            mirror: Mutex::new(graph),
        }
    }
}

#[async_trait]
impl<S> AccessEngine for TupleEngine<S>
where
    S: TupleStore + TupleReader + 'static,
{
    fn kind(&self) -> EngineKind {
        EngineKind::TupleGraph
    }

    async fn check(&self, user: UserId, document: DocumentId) -> StorageResult<bool> {
        let result = self
            .resolver
            .check(&CheckRequest::viewer(document, user))
            .await?;
        Ok(result.allowed)
    }

    async fn apply(&self, change: EntityChange) -> StorageResult<MutationCost> {
        let mut mirror = self.mirror.lock().await;
        let (writes, deletes) = change.tuple_delta(&mirror);
        let undo = change.undo(&mirror);
        change.apply_to(&mut mirror)?;

        let cost = match self.write_delta(&deletes, writes).await {
            Ok(cost) => cost,
            Err(err) => {
                // A retry recomputes its delta from the mirror, so the mirror
                // must not run ahead of the store.
                if let Some(undo) = undo {
                    if let Err(undo_err) = undo.apply_to(&mut mirror) {
                        warn!(?change, error = %undo_err, "could not roll back graph mirror");
                    }
                }
                return Err(err);
            }
        };
        if cost.rows_written == 0 {
            warn!(?change, "relationship change wrote no tuples");
        }
        Ok(cost)
    }
}

impl<S> TupleEngine<S>
where
    S: TupleStore + TupleReader + 'static,
{
    async fn write_delta(
        &self,
        deletes: &[RelationTuple],
        writes: Vec<RelationTuple>,
    ) -> StorageResult<MutationCost> {
        let mut cost = MutationCost::default();
        for tuple in deletes {
            if self.store.delete(tuple).await? {
                cost.rows_written += 1;
            }
        }
        for tuple in writes {
            if self.store.write(tuple).await? {
                cost.rows_written += 1;
            }
        }
        Ok(cost)
    }
}

/// Flattened ACL repository.
pub struct FlatAclEngine<A> {
    store: Arc<A>,
}

impl<A: AclStore> FlatAclEngine<A> {
    pub fn new(store: Arc<A>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<A: AclStore> AccessEngine for FlatAclEngine<A> {
    fn kind(&self) -> EngineKind {
        EngineKind::FlatAcl
    }

    async fn check(&self, user: UserId, document: DocumentId) -> StorageResult<bool> {
        self.store.check(user, document).await
    }

    async fn apply(&self, change: EntityChange) -> StorageResult<MutationCost> {
        let outcome = self.store.expand(change).await?;
        Ok(MutationCost {
            rows_written: outcome.rows_touched(),
            pairs_evaluated: outcome.pairs_evaluated,
        })
    }
}
