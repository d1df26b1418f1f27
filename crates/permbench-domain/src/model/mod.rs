//! Organization authorization model.
//!
//! This module contains:
//! - Core type definitions (ObjectType, Relation, Subject, RelationTuple, AclRow)
//! - The fixed relation schema and its rewrite rules
//! - The organization graph arena shared by both engines

mod org;
mod schema;
mod types;
#[cfg(test)]
mod types_proptest;

pub use org::{Department, OrgGraph, Owner};
pub use schema::{definitions, relation_definition, RelationDefinition, Rewrite, SubjectKind};
pub use types::*;
