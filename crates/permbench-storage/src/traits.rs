//! Storage trait definitions for both engines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use permbench_domain::error::DomainResult;
use permbench_domain::model::{
    CustomerId, DepartmentId, DocumentId, OrgGraph, Owner, RelationTuple, UserId,
};

use crate::error::{ConsistencyAnomaly, StorageResult};

/// Relationship tuple storage.
///
/// Implementations must be thread-safe (Send + Sync). Every write is
/// validated against the relation schema before it is applied.
#[async_trait]
pub trait TupleStore: Send + Sync + 'static {
    /// Writes one tuple. Returns false if it was already stored.
    async fn write(&self, tuple: RelationTuple) -> StorageResult<bool>;

    /// Deletes one tuple. Returns false (not an error) if it was absent.
    async fn delete(&self, tuple: &RelationTuple) -> StorageResult<bool>;

    /// Writes a batch. The whole batch is validated before any tuple is
    /// applied. Returns the number of newly stored tuples.
    async fn write_batch(&self, tuples: Vec<RelationTuple>) -> StorageResult<usize>;

    /// Number of stored tuples.
    async fn tuple_count(&self) -> StorageResult<usize>;
}

/// A relationship change the flattened ACL must re-expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityChange {
    AddMember {
        department: DepartmentId,
        user: UserId,
    },
    RemoveMember {
        department: DepartmentId,
        user: UserId,
    },
    AddFollower {
        customer: CustomerId,
        user: UserId,
    },
    RemoveFollower {
        customer: CustomerId,
        user: UserId,
    },
    Reparent {
        department: DepartmentId,
        new_parent: Option<DepartmentId>,
    },
    SetDocumentOwner {
        document: DocumentId,
        owner: Owner,
    },
}

impl EntityChange {
    /// Applies the change to `graph`. Nothing is modified when it fails.
    pub fn apply_to(&self, graph: &mut OrgGraph) -> DomainResult<()> {
        match *self {
            EntityChange::AddMember { department, user } => {
                graph.add_member(department, user)?;
            }
            EntityChange::RemoveMember { department, user } => {
                graph.remove_member(department, user)?;
            }
            EntityChange::AddFollower { customer, user } => {
                graph.add_follower(customer, user)?;
            }
            EntityChange::RemoveFollower { customer, user } => {
                graph.remove_follower(customer, user)?;
            }
            EntityChange::Reparent {
                department,
                new_parent,
            } => {
                graph.reparent(department, new_parent)?;
            }
            EntityChange::SetDocumentOwner { document, owner } => {
                graph.set_document_owner(document, owner)?;
            }
        }
        Ok(())
    }

    /// The tuple writes and deletes the same change costs the tuple store.
    ///
    /// `Reparent` and `SetDocumentOwner` need the current graph to know which
    /// tuple they replace.
    pub fn tuple_delta(&self, graph: &OrgGraph) -> (Vec<RelationTuple>, Vec<RelationTuple>) {
        match *self {
            EntityChange::AddMember { department, user } => {
                (vec![RelationTuple::department_member(department, user)], vec![])
            }
            EntityChange::RemoveMember { department, user } => {
                (vec![], vec![RelationTuple::department_member(department, user)])
            }
            EntityChange::AddFollower { customer, user } => {
                (vec![RelationTuple::customer_follower(customer, user)], vec![])
            }
            EntityChange::RemoveFollower { customer, user } => {
                (vec![], vec![RelationTuple::customer_follower(customer, user)])
            }
            EntityChange::Reparent {
                department,
                new_parent,
            } => {
                let current = graph.department(department).and_then(|d| d.parent);
                if current == new_parent {
                    return (vec![], vec![]);
                }
                let old = current.map(|parent| RelationTuple::child_department(parent, department));
                let new =
                    new_parent.map(|parent| RelationTuple::child_department(parent, department));
                (new.into_iter().collect(), old.into_iter().collect())
            }
            EntityChange::SetDocumentOwner { document, owner } => {
                let current = graph.document_owner(document);
                if current == Some(owner) {
                    return (vec![], vec![]);
                }
                let old = current.map(|previous| previous.tuple(document));
                (vec![owner.tuple(document)], old.into_iter().collect())
            }
        }
    }

    /// The change that puts `graph` back the way it is now once `self` has
    /// been applied to it. `None` when applying `self` changes nothing.
    pub fn undo(&self, graph: &OrgGraph) -> Option<EntityChange> {
        match *self {
            EntityChange::AddMember { department, user } => {
                let added = !graph.is_member(department, user);
                added.then_some(EntityChange::RemoveMember { department, user })
            }
            EntityChange::RemoveMember { department, user } => {
                let removed = graph.is_member(department, user);
                removed.then_some(EntityChange::AddMember { department, user })
            }
            EntityChange::AddFollower { customer, user } => {
                let added = !graph.is_follower(customer, user);
                added.then_some(EntityChange::RemoveFollower { customer, user })
            }
            EntityChange::RemoveFollower { customer, user } => {
                let removed = graph.is_follower(customer, user);
                removed.then_some(EntityChange::AddFollower { customer, user })
            }
            EntityChange::Reparent {
                department,
                new_parent,
            } => {
                let current = graph.department(department)?.parent;
                (current != new_parent).then_some(EntityChange::Reparent {
                    department,
                    new_parent: current,
                })
            }
            EntityChange::SetDocumentOwner { document, owner } => {
                let current = graph.document_owner(document)?;
                (current != owner).then_some(EntityChange::SetDocumentOwner {
                    document,
                    owner: current,
                })
            }
        }
    }
}

/// Rows touched by one expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionOutcome {
    /// (user, document) pairs re-derived.
    pub pairs_evaluated: usize,
    pub rows_added: usize,
    pub rows_removed: usize,
}

impl ExpansionOutcome {
    /// Rows written or deleted.
    pub fn rows_touched(&self) -> usize {
        self.rows_added + self.rows_removed
    }
}

/// Pre-expanded (user, document) row storage.
#[async_trait]
pub trait AclStore: Send + Sync + 'static {
    /// Adds an explicit row. Returns false if the row already existed.
    async fn grant(&self, user: UserId, document: DocumentId) -> StorageResult<bool>;

    /// Removes an explicit grant. The row survives while the hierarchy still
    /// grants the pair. Returns true if the row was removed.
    async fn revoke(&self, user: UserId, document: DocumentId) -> StorageResult<bool>;

    /// Applies `change` and re-derives every affected row atomically.
    async fn expand(&self, change: EntityChange) -> StorageResult<ExpansionOutcome>;

    /// Row existence lookup.
    async fn check(&self, user: UserId, document: DocumentId) -> StorageResult<bool>;

    /// Number of stored rows.
    async fn row_count(&self) -> StorageResult<usize>;

    /// Full scan comparing stored rows with what the hierarchy derives.
    async fn verify(&self) -> StorageResult<Vec<ConsistencyAnomaly>>;
}
