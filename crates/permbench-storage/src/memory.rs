//! In-memory relationship tuple store.
//!
//! Tuples are indexed by their `(object, relation)` node:
//!
//! - direct user subjects in a `HashSet<UserId>` for O(1) membership tests;
//! - userset subjects in a `BTreeSet<UsersetRef>` so traversal order is stable.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use permbench_domain::error::DomainResult;
use permbench_domain::model::{ObjectRef, Relation, RelationTuple, Subject, UserId, UsersetRef};
use permbench_domain::resolver::TupleReader;

use crate::error::StorageResult;
use crate::traits::TupleStore;

/// In-memory implementation of [`TupleStore`].
///
/// # Performance Characteristics
///
/// - **Write / delete tuple**: O(1) average (one shard lock)
/// - **Direct lookup**: O(1) average
/// - **Userset read**: O(k log k) for k usersets on the node
///
/// Uses DashMap for concurrent access without a global lock.
#[derive(Debug, Default)]
pub struct MemoryTupleStore {
    direct: DashMap<UsersetRef, HashSet<UserId>>,
    indirect: DashMap<UsersetRef, BTreeSet<UsersetRef>>,
    count: AtomicUsize,
}

impl MemoryTupleStore {
    /// Creates a new in-memory tuple store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory tuple store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn insert(&self, tuple: RelationTuple) -> bool {
        let node = UsersetRef::new(tuple.object, tuple.relation);
        let inserted = match tuple.subject {
            Subject::User { id } => self.direct.entry(node).or_default().insert(id),
            Subject::Userset(userset) => self.indirect.entry(node).or_default().insert(userset),
        };
        if inserted {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
        inserted
    }

    fn remove(&self, tuple: &RelationTuple) -> bool {
        let node = UsersetRef::new(tuple.object, tuple.relation);
        let removed = match &tuple.subject {
            Subject::User { id } => self
                .direct
                .get_mut(&node)
                .map_or(false, |mut users| users.remove(id)),
            Subject::Userset(userset) => self
                .indirect
                .get_mut(&node)
                .map_or(false, |mut usersets| usersets.remove(userset)),
        };
        if removed {
            self.count.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Returns true if exactly this tuple is stored.
    pub fn contains(&self, tuple: &RelationTuple) -> bool {
        let node = UsersetRef::new(tuple.object, tuple.relation);
        match &tuple.subject {
            Subject::User { id } => self
                .direct
                .get(&node)
                .map_or(false, |users| users.contains(id)),
            Subject::Userset(userset) => self
                .indirect
                .get(&node)
                .map_or(false, |usersets| usersets.contains(userset)),
        }
    }
}

#[async_trait]
impl TupleStore for MemoryTupleStore {
    #[instrument(skip(self, tuple), fields(tuple = %tuple))]
    async fn write(&self, tuple: RelationTuple) -> StorageResult<bool> {
        tuple.validate()?;
        Ok(self.insert(tuple))
    }

    #[instrument(skip(self, tuple), fields(tuple = %tuple))]
    async fn delete(&self, tuple: &RelationTuple) -> StorageResult<bool> {
        tuple.validate()?;
        Ok(self.remove(tuple))
    }

    #[instrument(skip(self, tuples), fields(batch_size = tuples.len()))]
    async fn write_batch(&self, tuples: Vec<RelationTuple>) -> StorageResult<usize> {
        for tuple in &tuples {
            tuple.validate()?;
        }
        let written = tuples.into_iter().filter(|t| self.insert(*t)).count();
        debug!(written, "tuple batch applied");
        Ok(written)
    }

    async fn tuple_count(&self) -> StorageResult<usize> {
        Ok(self.count.load(Ordering::Relaxed))
    }
}

#[async_trait]
impl TupleReader for MemoryTupleStore {
    async fn has_direct(
        &self,
        object: ObjectRef,
        relation: Relation,
        user: UserId,
    ) -> DomainResult<bool> {
        Ok(self
            .direct
            .get(&UsersetRef::new(object, relation))
            .map_or(false, |users| users.contains(&user)))
    }

    async fn read_usersets(
        &self,
        object: ObjectRef,
        relation: Relation,
    ) -> DomainResult<Vec<UsersetRef>> {
        Ok(self
            .indirect
            .get(&UsersetRef::new(object, relation))
            .map(|usersets| usersets.iter().copied().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permbench_domain::model::ObjectType;
    use permbench_domain::resolver::{CheckRequest, GraphResolver};

    #[tokio::test]
    async fn test_memory_store_can_be_created() {
        let store = MemoryTupleStore::new();
        assert_eq!(store.tuple_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_is_idempotent() {
        let store = MemoryTupleStore::new();
        let tuple = RelationTuple::department_member(1, 10);

        assert!(store.write(tuple).await.unwrap());
        assert!(!store.write(tuple).await.unwrap());
        assert_eq!(store.tuple_count().await.unwrap(), 1);
        assert!(store.contains(&tuple));
    }

    #[tokio::test]
    async fn test_delete_absent_tuple_is_noop() {
        let store = MemoryTupleStore::new();
        let tuple = RelationTuple::customer_follower(3, 10);

        assert!(!store.delete(&tuple).await.unwrap());
        store.write(tuple).await.unwrap();
        assert!(store.delete(&tuple).await.unwrap());
        assert!(!store.delete(&tuple).await.unwrap());
        assert_eq!(store.tuple_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_rejects_undefined_relation() {
        let store = MemoryTupleStore::new();
        let tuple = RelationTuple::new(
            ObjectRef::new(ObjectType::Customer, 1),
            Relation::Member,
            Subject::user(1),
        );

        let err = store.write(tuple).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.tuple_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_batch_applies_nothing_when_any_tuple_is_invalid() {
        let store = MemoryTupleStore::new();
        let invalid = RelationTuple::new(
            ObjectRef::document(1),
            Relation::Owner,
            Subject::user(1),
        );
        let batch = vec![
            RelationTuple::department_member(1, 1),
            invalid,
            RelationTuple::department_owner(1, 1),
        ];

        assert!(store.write_batch(batch).await.is_err());
        assert_eq!(store.tuple_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_batch_counts_new_tuples_only() {
        let store = MemoryTupleStore::new();
        store
            .write(RelationTuple::department_member(1, 1))
            .await
            .unwrap();

        let written = store
            .write_batch(vec![
                RelationTuple::department_member(1, 1),
                RelationTuple::department_member(1, 2),
                RelationTuple::child_department(1, 2),
            ])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.tuple_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_store_serves_resolver() {
        let store = MemoryTupleStore::new_shared();
        store
            .write_batch(vec![
                RelationTuple::child_department(1, 2),
                RelationTuple::department_member(2, 100),
                RelationTuple::department_owner(7, 1),
            ])
            .await
            .unwrap();

        let resolver = GraphResolver::new(Arc::clone(&store));
        assert!(
            resolver
                .check(&CheckRequest::viewer(7, 100))
                .await
                .unwrap()
                .allowed
        );

        store
            .delete(&RelationTuple::department_member(2, 100))
            .await
            .unwrap();
        assert!(
            !resolver
                .check(&CheckRequest::viewer(7, 100))
                .await
                .unwrap()
                .allowed
        );
    }
}
