//! Traits for storage operations needed by the resolver.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{ObjectRef, Relation, UserId, UsersetRef};

/// Trait for tuple storage operations needed by the resolver.
#[async_trait]
pub trait TupleReader: Send + Sync {
    /// Returns true if `object#relation@user:<user>` is stored.
    async fn has_direct(
        &self,
        object: ObjectRef,
        relation: Relation,
        user: UserId,
    ) -> DomainResult<bool>;

    /// Reads the userset subjects stored on `object#relation`.
    async fn read_usersets(
        &self,
        object: ObjectRef,
        relation: Relation,
    ) -> DomainResult<Vec<UsersetRef>>;
}
