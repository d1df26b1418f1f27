//! Types for the graph resolver.

use crate::model::{DocumentId, ObjectRef, Relation, UserId, UsersetRef};

/// Request for a permission check: does `user` satisfy `relation` on `object`?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckRequest {
    pub object: ObjectRef,
    pub relation: Relation,
    pub user: UserId,
}

impl CheckRequest {
    pub fn new(object: ObjectRef, relation: Relation, user: UserId) -> Self {
        Self {
            object,
            relation,
            user,
        }
    }

    /// `document:<document>#viewer@user:<user>`
    pub fn viewer(document: DocumentId, user: UserId) -> Self {
        Self::new(ObjectRef::document(document), Relation::Viewer, user)
    }

    pub(crate) fn node(&self) -> UsersetRef {
        UsersetRef::new(self.object, self.relation)
    }
}

/// Counters collected while resolving one check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Nodes entered (including memo hits and cut paths).
    pub dispatches: u64,
    /// Nodes answered from the request memo table.
    pub memo_hits: u64,
    /// Paths ended because the node was already on the current path.
    pub cycles_cut: u64,
    /// Paths ended by the depth limit.
    pub depth_limited: u64,
}

/// Result of a permission check.
#[derive(Debug, Clone, Copy)]
pub struct CheckResult {
    /// Whether the check is allowed.
    pub allowed: bool,
    pub stats: ResolutionStats,
}
