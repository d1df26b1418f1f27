//! The fixed relation schema of the organization model.
//!
//! Equivalent OpenFGA-style model:
//!
//! ```text
//! type user
//! type department
//!   relations
//!     define member: [user, department#member]
//! type customer
//!   relations
//!     define follower: [user]
//! type document
//!   relations
//!     define owner: [department#member, customer#follower]
//!     define viewer: [user] or owner
//! ```
//!
//! Department hierarchy is expressed with `department:P#member@department:C#member`
//! tuples, so `member` of a department includes the members of every
//! descendant.

use super::types::{ObjectType, Relation};

/// A relation rewrite rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// Tuples stored on the relation itself (direct subjects and usersets).
    Direct,
    /// Another relation on the same object.
    Computed(Relation),
    /// Any child grants access.
    Union(&'static [Rewrite]),
}

/// A subject kind a relation accepts in its direct tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    User,
    Userset(ObjectType, Relation),
}

/// Definition of a relation on an object type.
#[derive(Debug, Clone, Copy)]
pub struct RelationDefinition {
    pub object_type: ObjectType,
    pub relation: Relation,
    pub rewrite: Rewrite,
    pub allowed_subjects: &'static [SubjectKind],
}

static DEFINITIONS: [RelationDefinition; 4] = [
    RelationDefinition {
        object_type: ObjectType::Department,
        relation: Relation::Member,
        rewrite: Rewrite::Direct,
        allowed_subjects: &[
            SubjectKind::User,
            SubjectKind::Userset(ObjectType::Department, Relation::Member),
        ],
    },
    RelationDefinition {
        object_type: ObjectType::Customer,
        relation: Relation::Follower,
        rewrite: Rewrite::Direct,
        allowed_subjects: &[SubjectKind::User],
    },
    RelationDefinition {
        object_type: ObjectType::Document,
        relation: Relation::Owner,
        rewrite: Rewrite::Direct,
        allowed_subjects: &[
            SubjectKind::Userset(ObjectType::Department, Relation::Member),
            SubjectKind::Userset(ObjectType::Customer, Relation::Follower),
        ],
    },
    RelationDefinition {
        object_type: ObjectType::Document,
        relation: Relation::Viewer,
        rewrite: Rewrite::Union(&[Rewrite::Direct, Rewrite::Computed(Relation::Owner)]),
        allowed_subjects: &[SubjectKind::User],
    },
];

/// Looks up the definition of `relation` on `object_type`.
pub fn relation_definition(
    object_type: ObjectType,
    relation: Relation,
) -> Option<&'static RelationDefinition> {
    DEFINITIONS
        .iter()
        .find(|d| d.object_type == object_type && d.relation == relation)
}

/// All relation definitions.
pub fn definitions() -> &'static [RelationDefinition] {
    &DEFINITIONS
}
