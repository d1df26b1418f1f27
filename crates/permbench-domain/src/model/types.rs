//! Core type definitions for the organization authorization model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

use super::schema::{relation_definition, SubjectKind};

/// Stable integer identifier shared by every entity kind.
pub type EntityId = u64;
pub type UserId = EntityId;
pub type DepartmentId = EntityId;
pub type CustomerId = EntityId;
pub type DocumentId = EntityId;

/// The closed set of object types in the organization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    User,
    Department,
    Customer,
    Document,
}

impl ObjectType {
    pub const ALL: [ObjectType; 4] = [
        ObjectType::User,
        ObjectType::Department,
        ObjectType::Customer,
        ObjectType::Document,
    ];

    /// Returns the type name as used in tuple notation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::User => "user",
            ObjectType::Department => "department",
            ObjectType::Customer => "customer",
            ObjectType::Document => "document",
        }
    }

    /// Relations defined on this type.
    pub fn relations(&self) -> &'static [Relation] {
        match self {
            ObjectType::User => &[],
            ObjectType::Department => &[Relation::Member],
            ObjectType::Customer => &[Relation::Follower],
            ObjectType::Document => &[Relation::Owner, Relation::Viewer],
        }
    }

    /// Returns true if `relation` is defined on this type.
    pub fn defines(&self, relation: Relation) -> bool {
        self.relations().contains(&relation)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = DomainError;

    fn from_str(value: &str) -> DomainResult<Self> {
        ObjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| DomainError::InvalidObjectFormat {
                value: value.to_string(),
            })
    }
}

/// The closed set of relations in the organization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Member,
    Follower,
    Owner,
    Viewer,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Member,
        Relation::Follower,
        Relation::Owner,
        Relation::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Member => "member",
            Relation::Follower => "follower",
            Relation::Owner => "owner",
            Relation::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = DomainError;

    fn from_str(value: &str) -> DomainResult<Self> {
        Relation::ALL
            .into_iter()
            .find(|r| r.as_str() == value)
            .ok_or_else(|| DomainError::InvalidRelationFormat {
                value: value.to_string(),
            })
    }
}

/// An object reference (e.g., `document:42`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_type: ObjectType,
    pub id: EntityId,
}

impl ObjectRef {
    pub fn new(object_type: ObjectType, id: EntityId) -> Self {
        Self { object_type, id }
    }

    pub fn user(id: UserId) -> Self {
        Self::new(ObjectType::User, id)
    }

    pub fn department(id: DepartmentId) -> Self {
        Self::new(ObjectType::Department, id)
    }

    pub fn customer(id: CustomerId) -> Self {
        Self::new(ObjectType::Customer, id)
    }

    pub fn document(id: DocumentId) -> Self {
        Self::new(ObjectType::Document, id)
    }

    /// Parses an object from "type:id" format.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidObjectFormat {
            value: value.to_string(),
        };
        let (object_type, id) = value.split_once(':').ok_or_else(invalid)?;
        let object_type = object_type.parse::<ObjectType>().map_err(|_| invalid())?;
        let id = id.parse::<EntityId>().map_err(|_| invalid())?;
        Ok(Self::new(object_type, id))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.id)
    }
}

/// A userset pointer: every subject satisfying `relation` on `object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsersetRef {
    pub object: ObjectRef,
    pub relation: Relation,
}

impl UsersetRef {
    pub fn new(object: ObjectRef, relation: Relation) -> Self {
        Self { object, relation }
    }

    pub fn department_members(department: DepartmentId) -> Self {
        Self::new(ObjectRef::department(department), Relation::Member)
    }

    pub fn customer_followers(customer: CustomerId) -> Self {
        Self::new(ObjectRef::customer(customer), Relation::Follower)
    }

    /// Parses a userset from "type:id#relation" format.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let (object, relation) =
            value
                .split_once('#')
                .ok_or_else(|| DomainError::InvalidSubjectFormat {
                    value: value.to_string(),
                })?;
        Ok(Self::new(ObjectRef::parse(object)?, relation.parse()?))
    }
}

impl fmt::Display for UsersetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.object, self.relation)
    }
}

/// The subject of a relationship tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    /// A concrete user.
    User { id: UserId },
    /// An indirection to another relation's subjects.
    Userset(UsersetRef),
}

impl Subject {
    pub fn user(id: UserId) -> Self {
        Subject::User { id }
    }

    /// Parses "user:<id>" or "type:id#relation".
    pub fn parse(value: &str) -> DomainResult<Self> {
        if value.contains('#') {
            return UsersetRef::parse(value).map(Subject::Userset);
        }
        let object = ObjectRef::parse(value).map_err(|_| DomainError::InvalidSubjectFormat {
            value: value.to_string(),
        })?;
        if object.object_type != ObjectType::User {
            return Err(DomainError::InvalidSubjectFormat {
                value: value.to_string(),
            });
        }
        Ok(Subject::user(object.id))
    }

    fn kind(&self) -> SubjectKind {
        match self {
            Subject::User { .. } => SubjectKind::User,
            Subject::Userset(userset) => {
                SubjectKind::Userset(userset.object.object_type, userset.relation)
            }
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User { id } => write!(f, "{}", ObjectRef::user(*id)),
            Subject::Userset(userset) => userset.fmt(f),
        }
    }
}

/// A relationship tuple `object#relation@subject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationTuple {
    pub object: ObjectRef,
    pub relation: Relation,
    pub subject: Subject,
}

impl RelationTuple {
    pub fn new(object: ObjectRef, relation: Relation, subject: Subject) -> Self {
        Self {
            object,
            relation,
            subject,
        }
    }

    /// `department:D#member@user:U`
    pub fn department_member(department: DepartmentId, user: UserId) -> Self {
        Self::new(
            ObjectRef::department(department),
            Relation::Member,
            Subject::user(user),
        )
    }

    /// `department:P#member@department:C#member`, the parent link of the
    /// hierarchy: members of the child are members of the parent.
    pub fn child_department(parent: DepartmentId, child: DepartmentId) -> Self {
        Self::new(
            ObjectRef::department(parent),
            Relation::Member,
            Subject::Userset(UsersetRef::department_members(child)),
        )
    }

    /// `customer:C#follower@user:U`
    pub fn customer_follower(customer: CustomerId, user: UserId) -> Self {
        Self::new(
            ObjectRef::customer(customer),
            Relation::Follower,
            Subject::user(user),
        )
    }

    /// `document:X#owner@department:D#member`
    pub fn department_owner(document: DocumentId, department: DepartmentId) -> Self {
        Self::new(
            ObjectRef::document(document),
            Relation::Owner,
            Subject::Userset(UsersetRef::department_members(department)),
        )
    }

    /// `document:X#owner@customer:C#follower`
    pub fn customer_owner(document: DocumentId, customer: CustomerId) -> Self {
        Self::new(
            ObjectRef::document(document),
            Relation::Owner,
            Subject::Userset(UsersetRef::customer_followers(customer)),
        )
    }

    /// `document:X#viewer@user:U`
    pub fn document_viewer(document: DocumentId, user: UserId) -> Self {
        Self::new(
            ObjectRef::document(document),
            Relation::Viewer,
            Subject::user(user),
        )
    }

    /// Validates the tuple against the relation schema.
    ///
    /// Rejects relations not defined on the object type, userset subjects
    /// pointing at undefined relations, and subject kinds the relation does
    /// not accept.
    pub fn validate(&self) -> DomainResult<()> {
        let definition = relation_definition(self.object.object_type, self.relation).ok_or_else(
            || DomainError::RelationNotFound {
                type_name: self.object.object_type.to_string(),
                relation: self.relation.to_string(),
            },
        )?;

        if let Subject::Userset(userset) = &self.subject {
            if !userset.object.object_type.defines(userset.relation) {
                return Err(DomainError::RelationNotFound {
                    type_name: userset.object.object_type.to_string(),
                    relation: userset.relation.to_string(),
                });
            }
        }

        if !definition.allowed_subjects.contains(&self.subject.kind()) {
            return Err(DomainError::SubjectNotAllowed {
                object_type: self.object.object_type.to_string(),
                relation: self.relation.to_string(),
                subject: self.subject.to_string(),
            });
        }

        Ok(())
    }

    /// Parses "type:id#relation@subject".
    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidObjectFormat {
            value: value.to_string(),
        };
        let (left, subject) = value.split_once('@').ok_or_else(invalid)?;
        let (object, relation) = left.split_once('#').ok_or_else(invalid)?;
        Ok(Self::new(
            ObjectRef::parse(object)?,
            relation.parse()?,
            Subject::parse(subject)?,
        ))
    }
}

impl fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.subject)
    }
}

/// A flattened ACL row: `user` may view `document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AclRow {
    pub user: UserId,
    pub document: DocumentId,
}

impl AclRow {
    pub fn new(user: UserId, document: DocumentId) -> Self {
        Self { user, document }
    }
}

impl fmt::Display for AclRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(user:{}, document:{})", self.user, self.document)
    }
}
