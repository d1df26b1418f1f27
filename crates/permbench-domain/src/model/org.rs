//! Organization graph arena.
//!
//! Departments, users, customers and documents are addressed by stable
//! integer ids. Departments keep a parent-id back-reference and a cached
//! depth (roots are depth 1); child lists are derived indices. The graph is
//! the normalized source the fixture generator emits and the flattened ACL
//! repository re-expands from.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

use super::types::{
    AclRow, CustomerId, DepartmentId, DocumentId, RelationTuple, UserId, UsersetRef,
};

/// The owner of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    Department(DepartmentId),
    Customer(CustomerId),
}

impl Owner {
    /// The userset that carries the owner's implicit viewer right.
    pub fn userset(&self) -> UsersetRef {
        match self {
            Owner::Department(id) => UsersetRef::department_members(*id),
            Owner::Customer(id) => UsersetRef::customer_followers(*id),
        }
    }

    /// The `document#owner` tuple for `document`.
    pub fn tuple(&self, document: DocumentId) -> RelationTuple {
        match self {
            Owner::Department(id) => RelationTuple::department_owner(document, *id),
            Owner::Customer(id) => RelationTuple::customer_owner(document, *id),
        }
    }
}

/// A department record in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub parent: Option<DepartmentId>,
    /// Depth in the tree, 1 for roots.
    pub depth: u32,
}

/// Serialized form of [`OrgGraph`]: primary facts only, indices rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrgSnapshot {
    max_depth: u32,
    departments: Vec<(DepartmentId, Option<DepartmentId>)>,
    users: Vec<UserId>,
    customers: Vec<CustomerId>,
    memberships: Vec<(DepartmentId, UserId)>,
    follows: Vec<(CustomerId, UserId)>,
    documents: Vec<(DocumentId, Owner)>,
}

/// In-memory organization graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "OrgSnapshot", into = "OrgSnapshot")]
pub struct OrgGraph {
    max_depth: u32,
    departments: BTreeMap<DepartmentId, Department>,
    children: HashMap<DepartmentId, BTreeSet<DepartmentId>>,
    users: BTreeSet<UserId>,
    customers: BTreeSet<CustomerId>,
    members: HashMap<DepartmentId, BTreeSet<UserId>>,
    memberships: HashMap<UserId, BTreeSet<DepartmentId>>,
    followers: HashMap<CustomerId, BTreeSet<UserId>>,
    follows: HashMap<UserId, BTreeSet<CustomerId>>,
    documents: BTreeMap<DocumentId, Owner>,
    owned: HashMap<Owner, BTreeSet<DocumentId>>,
}

impl OrgGraph {
    /// Creates an empty graph whose department trees may not exceed `max_depth` levels.
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth: max_depth.max(1),
            departments: BTreeMap::new(),
            children: HashMap::new(),
            users: BTreeSet::new(),
            customers: BTreeSet::new(),
            members: HashMap::new(),
            memberships: HashMap::new(),
            followers: HashMap::new(),
            follows: HashMap::new(),
            documents: BTreeMap::new(),
            owned: HashMap::new(),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Adds a department under `parent` (or as a root).
    pub fn add_department(
        &mut self,
        id: DepartmentId,
        parent: Option<DepartmentId>,
    ) -> DomainResult<&Department> {
        if self.departments.contains_key(&id) {
            return Err(DomainError::EntityAlreadyExists {
                kind: "department",
                id,
            });
        }
        let depth = match parent {
            Some(parent_id) => self.require_department(parent_id)?.depth + 1,
            None => 1,
        };
        if depth > self.max_depth {
            return Err(DomainError::InvalidHierarchy {
                message: format!(
                    "department {id} would sit at depth {depth}, max is {}",
                    self.max_depth
                ),
            });
        }
        if let Some(parent_id) = parent {
            self.children.entry(parent_id).or_default().insert(id);
        }
        Ok(self.departments.entry(id).or_insert(Department { id, parent, depth }))
    }

    pub fn add_user(&mut self, id: UserId) -> bool {
        self.users.insert(id)
    }

    pub fn add_customer(&mut self, id: CustomerId) -> bool {
        self.customers.insert(id)
    }

    /// Adds a document with its owner. Ownership is exclusive and required.
    pub fn add_document(&mut self, id: DocumentId, owner: Owner) -> DomainResult<()> {
        if self.documents.contains_key(&id) {
            return Err(DomainError::EntityAlreadyExists {
                kind: "document",
                id,
            });
        }
        self.require_owner(owner)?;
        self.documents.insert(id, owner);
        self.owned.entry(owner).or_default().insert(id);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Adds `user` to `department`. Returns false if already a member.
    pub fn add_member(&mut self, department: DepartmentId, user: UserId) -> DomainResult<bool> {
        self.require_department(department)?;
        self.require_user(user)?;
        self.memberships.entry(user).or_default().insert(department);
        Ok(self.members.entry(department).or_default().insert(user))
    }

    /// Removes `user` from `department`. Returns false if not a member.
    pub fn remove_member(&mut self, department: DepartmentId, user: UserId) -> DomainResult<bool> {
        self.require_department(department)?;
        self.require_user(user)?;
        if let Some(departments) = self.memberships.get_mut(&user) {
            departments.remove(&department);
        }
        Ok(self
            .members
            .get_mut(&department)
            .map_or(false, |members| members.remove(&user)))
    }

    /// Makes `user` a follower of `customer`. Returns false if already following.
    pub fn add_follower(&mut self, customer: CustomerId, user: UserId) -> DomainResult<bool> {
        self.require_customer(customer)?;
        self.require_user(user)?;
        self.follows.entry(user).or_default().insert(customer);
        Ok(self.followers.entry(customer).or_default().insert(user))
    }

    /// Removes `user` from the followers of `customer`.
    pub fn remove_follower(&mut self, customer: CustomerId, user: UserId) -> DomainResult<bool> {
        self.require_customer(customer)?;
        self.require_user(user)?;
        if let Some(customers) = self.follows.get_mut(&user) {
            customers.remove(&customer);
        }
        Ok(self
            .followers
            .get_mut(&customer)
            .map_or(false, |followers| followers.remove(&user)))
    }

    /// Moves `department` (with its subtree) under `new_parent`.
    ///
    /// Rejects moves that would create a cycle or push any descendant past
    /// the depth bound. Returns the previous parent.
    pub fn reparent(
        &mut self,
        department: DepartmentId,
        new_parent: Option<DepartmentId>,
    ) -> DomainResult<Option<DepartmentId>> {
        let current = *self.require_department(department)?;
        let new_depth = match new_parent {
            Some(parent_id) => {
                let parent = *self.require_department(parent_id)?;
                if self.ancestors_or_self(parent_id).contains(&department) {
                    return Err(DomainError::InvalidHierarchy {
                        message: format!(
                            "moving department {department} under {parent_id} creates a cycle"
                        ),
                    });
                }
                parent.depth + 1
            }
            None => 1,
        };

        let subtree = self.subtree(department);
        let deepest = subtree
            .iter()
            .filter_map(|id| self.departments.get(id))
            .map(|d| d.depth)
            .max()
            .unwrap_or(current.depth);
        let height = deepest - current.depth;
        if new_depth + height > self.max_depth {
            return Err(DomainError::InvalidHierarchy {
                message: format!(
                    "moving department {department} would reach depth {}, max is {}",
                    new_depth + height,
                    self.max_depth
                ),
            });
        }

        if let Some(old_parent) = current.parent {
            if let Some(siblings) = self.children.get_mut(&old_parent) {
                siblings.remove(&department);
            }
        }
        if let Some(parent_id) = new_parent {
            self.children.entry(parent_id).or_default().insert(department);
        }
        for id in &subtree {
            if let Some(record) = self.departments.get_mut(id) {
                record.depth = record.depth + new_depth - current.depth;
            }
        }
        if let Some(record) = self.departments.get_mut(&department) {
            record.parent = new_parent;
        }
        Ok(current.parent)
    }

    /// Transfers `document` to `owner`. Returns the previous owner.
    pub fn set_document_owner(&mut self, document: DocumentId, owner: Owner) -> DomainResult<Owner> {
        self.require_owner(owner)?;
        let previous = *self
            .documents
            .get(&document)
            .ok_or(DomainError::EntityNotFound {
                kind: "document",
                id: document,
            })?;
        if let Some(docs) = self.owned.get_mut(&previous) {
            docs.remove(&document);
        }
        self.owned.entry(owner).or_default().insert(document);
        self.documents.insert(document, owner);
        Ok(previous)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn department(&self, id: DepartmentId) -> Option<&Department> {
        self.departments.get(&id)
    }

    /// Depth of a department (1 for roots).
    pub fn depth_of(&self, id: DepartmentId) -> Option<u32> {
        self.departments.get(&id).map(|d| d.depth)
    }

    pub fn departments(&self) -> impl Iterator<Item = &Department> + '_ {
        self.departments.values()
    }

    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.iter().copied()
    }

    pub fn customers(&self) -> impl Iterator<Item = CustomerId> + '_ {
        self.customers.iter().copied()
    }

    pub fn documents(&self) -> impl Iterator<Item = (DocumentId, Owner)> + '_ {
        self.documents.iter().map(|(id, owner)| (*id, *owner))
    }

    pub fn has_user(&self, id: UserId) -> bool {
        self.users.contains(&id)
    }

    pub fn has_document(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }

    pub fn document_owner(&self, id: DocumentId) -> Option<Owner> {
        self.documents.get(&id).copied()
    }

    pub fn department_count(&self) -> usize {
        self.departments.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Deepest level currently used by any department.
    pub fn tree_depth(&self) -> u32 {
        self.departments.values().map(|d| d.depth).max().unwrap_or(0)
    }

    /// Direct children of a department.
    pub fn children_of(&self, id: DepartmentId) -> impl Iterator<Item = DepartmentId> + '_ {
        self.children.get(&id).into_iter().flatten().copied()
    }

    /// Direct members of a department (not including descendants).
    pub fn members_of(&self, id: DepartmentId) -> impl Iterator<Item = UserId> + '_ {
        self.members.get(&id).into_iter().flatten().copied()
    }

    /// Departments `user` is a direct member of.
    pub fn departments_of(&self, user: UserId) -> impl Iterator<Item = DepartmentId> + '_ {
        self.memberships.get(&user).into_iter().flatten().copied()
    }

    pub fn is_member(&self, department: DepartmentId, user: UserId) -> bool {
        self.members
            .get(&department)
            .map_or(false, |members| members.contains(&user))
    }

    pub fn followers_of(&self, customer: CustomerId) -> impl Iterator<Item = UserId> + '_ {
        self.followers.get(&customer).into_iter().flatten().copied()
    }

    pub fn is_follower(&self, customer: CustomerId, user: UserId) -> bool {
        self.followers
            .get(&customer)
            .map_or(false, |followers| followers.contains(&user))
    }

    /// `id` followed by its ancestors up to the root.
    ///
    /// The walk is bounded by the configured depth, so a corrupted parent
    /// chain cannot loop.
    pub fn ancestors_or_self(&self, id: DepartmentId) -> Vec<DepartmentId> {
        let mut chain = Vec::new();
        let mut cursor = self.departments.get(&id);
        while let Some(department) = cursor {
            chain.push(department.id);
            if chain.len() > self.max_depth as usize {
                break;
            }
            cursor = department.parent.and_then(|p| self.departments.get(&p));
        }
        chain
    }

    /// `id` and all of its descendants, breadth first.
    pub fn subtree(&self, id: DepartmentId) -> Vec<DepartmentId> {
        if !self.departments.contains_key(&id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            out.push(next);
            queue.extend(self.children_of(next));
        }
        out
    }

    /// Every user the owner's viewer right reaches: members of the
    /// department's whole subtree, or the customer's followers.
    pub fn covered_users(&self, owner: Owner) -> BTreeSet<UserId> {
        match owner {
            Owner::Department(id) => self
                .subtree(id)
                .into_iter()
                .flat_map(|d| self.members_of(d))
                .collect(),
            Owner::Customer(id) => self.followers_of(id).collect(),
        }
    }

    pub fn documents_owned_by(&self, owner: Owner) -> impl Iterator<Item = DocumentId> + '_ {
        self.owned.get(&owner).into_iter().flatten().copied()
    }

    /// Documents owned by `department` or any of its ancestors, i.e. the
    /// documents a new member of `department` gains.
    pub fn documents_inherited_by(&self, department: DepartmentId) -> BTreeSet<DocumentId> {
        self.ancestors_or_self(department)
            .into_iter()
            .flat_map(|d| self.documents_owned_by(Owner::Department(d)))
            .collect()
    }

    /// Reference evaluator for `document#viewer` derived from ownership.
    ///
    /// Explicit viewer grants are not part of the graph.
    pub fn can_view(&self, user: UserId, document: DocumentId) -> bool {
        match self.documents.get(&document) {
            Some(Owner::Department(owner)) => self
                .departments_of(user)
                .any(|d| self.ancestors_or_self(d).contains(owner)),
            Some(Owner::Customer(owner)) => self.is_follower(*owner, user),
            None => false,
        }
    }

    /// All documents `user` can view through ownership.
    pub fn visible_documents(&self, user: UserId) -> BTreeSet<DocumentId> {
        let mut visible: BTreeSet<DocumentId> = self
            .departments_of(user)
            .flat_map(|d| self.documents_inherited_by(d))
            .collect();
        if let Some(customers) = self.follows.get(&user) {
            for customer in customers {
                visible.extend(self.documents_owned_by(Owner::Customer(*customer)));
            }
        }
        visible
    }

    /// The tuple-store form of the graph.
    pub fn tuples(&self) -> impl Iterator<Item = RelationTuple> + '_ {
        let hierarchy = self
            .departments
            .values()
            .filter_map(|d| d.parent.map(|p| RelationTuple::child_department(p, d.id)));
        let members = self.members.iter().flat_map(|(department, users)| {
            users
                .iter()
                .map(move |user| RelationTuple::department_member(*department, *user))
        });
        let followers = self.followers.iter().flat_map(|(customer, users)| {
            users
                .iter()
                .map(move |user| RelationTuple::customer_follower(*customer, *user))
        });
        let owners = self
            .documents
            .iter()
            .map(|(document, owner)| owner.tuple(*document));
        hierarchy.chain(members).chain(followers).chain(owners)
    }

    /// The flattened form of the graph: one row per (user, document) pair
    /// reachable through ownership.
    pub fn acl_rows(&self) -> impl Iterator<Item = AclRow> + '_ {
        let mut covered: HashMap<Owner, Vec<UserId>> = HashMap::new();
        self.documents.iter().flat_map(move |(document, owner)| {
            let users = covered
                .entry(*owner)
                .or_insert_with(|| self.covered_users(*owner).into_iter().collect())
                .clone();
            let document = *document;
            users.into_iter().map(move |user| AclRow::new(user, document))
        })
    }

    // ---------------------------------------------------------------------
    // Validation helpers
    // ---------------------------------------------------------------------

    fn require_department(&self, id: DepartmentId) -> DomainResult<&Department> {
        self.departments.get(&id).ok_or(DomainError::EntityNotFound {
            kind: "department",
            id,
        })
    }

    fn require_user(&self, id: UserId) -> DomainResult<()> {
        if self.users.contains(&id) {
            Ok(())
        } else {
            Err(DomainError::EntityNotFound { kind: "user", id })
        }
    }

    fn require_customer(&self, id: CustomerId) -> DomainResult<()> {
        if self.customers.contains(&id) {
            Ok(())
        } else {
            Err(DomainError::EntityNotFound {
                kind: "customer",
                id,
            })
        }
    }

    fn require_owner(&self, owner: Owner) -> DomainResult<()> {
        match owner {
            Owner::Department(id) => self.require_department(id).map(|_| ()),
            Owner::Customer(id) => self.require_customer(id),
        }
    }
}

impl From<OrgGraph> for OrgSnapshot {
    fn from(graph: OrgGraph) -> Self {
        let mut memberships: Vec<(DepartmentId, UserId)> = graph
            .members
            .iter()
            .flat_map(|(d, users)| users.iter().map(move |u| (*d, *u)))
            .collect();
        memberships.sort_unstable();
        let mut follows: Vec<(CustomerId, UserId)> = graph
            .followers
            .iter()
            .flat_map(|(c, users)| users.iter().map(move |u| (*c, *u)))
            .collect();
        follows.sort_unstable();

        // Parents always precede children so the snapshot reloads in order.
        let mut departments: Vec<&Department> = graph.departments.values().collect();
        departments.sort_by_key(|d| (d.depth, d.id));

        Self {
            max_depth: graph.max_depth,
            departments: departments.into_iter().map(|d| (d.id, d.parent)).collect(),
            users: graph.users.iter().copied().collect(),
            customers: graph.customers.iter().copied().collect(),
            memberships,
            follows,
            documents: graph.documents.iter().map(|(d, o)| (*d, *o)).collect(),
        }
    }
}

impl TryFrom<OrgSnapshot> for OrgGraph {
    type Error = DomainError;

    fn try_from(snapshot: OrgSnapshot) -> DomainResult<Self> {
        let mut graph = OrgGraph::new(snapshot.max_depth);
        for (id, parent) in snapshot.departments {
            graph.add_department(id, parent)?;
        }
        for user in snapshot.users {
            graph.add_user(user);
        }
        for customer in snapshot.customers {
            graph.add_customer(customer);
        }
        for (department, user) in snapshot.memberships {
            graph.add_member(department, user)?;
        }
        for (customer, user) in snapshot.follows {
            graph.add_follower(customer, user)?;
        }
        for (document, owner) in snapshot.documents {
            graph.add_document(document, owner)?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root(1) -> eng(2) -> backend(3); root(1) -> sales(4)
    fn sample_graph() -> OrgGraph {
        let mut graph = OrgGraph::new(4);
        graph.add_department(1, None).unwrap();
        graph.add_department(2, Some(1)).unwrap();
        graph.add_department(3, Some(2)).unwrap();
        graph.add_department(4, Some(1)).unwrap();
        for user in 10..14 {
            graph.add_user(user);
        }
        graph.add_member(3, 10).unwrap();
        graph.add_member(2, 11).unwrap();
        graph.add_member(4, 12).unwrap();
        graph.add_customer(100);
        graph.add_follower(100, 13).unwrap();
        graph.add_document(1000, Owner::Department(1)).unwrap();
        graph.add_document(1001, Owner::Department(2)).unwrap();
        graph.add_document(1002, Owner::Customer(100)).unwrap();
        graph
    }

    #[test]
    fn test_depth_is_tracked_and_bounded() {
        let mut graph = OrgGraph::new(2);
        graph.add_department(1, None).unwrap();
        assert_eq!(graph.add_department(2, Some(1)).unwrap().depth, 2);
        let err = graph.add_department(3, Some(2)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidHierarchy { .. }));
        assert_eq!(graph.tree_depth(), 2);
        assert_eq!(graph.depth_of(1), Some(1));
        assert_eq!(graph.depth_of(3), None);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut graph = OrgGraph::new(3);
        assert!(matches!(
            graph.add_department(2, Some(1)),
            Err(DomainError::EntityNotFound { kind: "department", .. })
        ));
    }

    #[test]
    fn test_descendant_members_see_ancestor_documents() {
        let graph = sample_graph();
        // backend member sees root- and eng-owned documents
        assert!(graph.can_view(10, 1000));
        assert!(graph.can_view(10, 1001));
        // sales member sees root documents but not eng documents
        assert!(graph.can_view(12, 1000));
        assert!(!graph.can_view(12, 1001));
        // follower sees customer document only
        assert!(graph.can_view(13, 1002));
        assert!(!graph.can_view(13, 1000));
    }

    #[test]
    fn test_covered_users_spans_subtree() {
        let graph = sample_graph();
        let covered = graph.covered_users(Owner::Department(1));
        assert_eq!(covered, BTreeSet::from([10, 11, 12]));
        let covered = graph.covered_users(Owner::Department(2));
        assert_eq!(covered, BTreeSet::from([10, 11]));
    }

    #[test]
    fn test_acl_rows_match_can_view() {
        let graph = sample_graph();
        let rows: BTreeSet<AclRow> = graph.acl_rows().collect();
        for user in graph.users() {
            for (document, _) in graph.documents() {
                assert_eq!(
                    rows.contains(&AclRow::new(user, document)),
                    graph.can_view(user, document),
                    "user {user} document {document}"
                );
            }
        }
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut graph = sample_graph();
        let err = graph.reparent(1, Some(3)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidHierarchy { .. }));
        assert_eq!(graph.department(1).unwrap().parent, None);
    }

    #[test]
    fn test_reparent_rejects_depth_overflow() {
        let mut graph = sample_graph();
        // eng subtree has height 1; under sales it bottoms out exactly at depth 4
        assert!(graph.reparent(2, Some(4)).is_ok());
        assert_eq!(graph.department(3).unwrap().depth, 4);
        // moving sales (now containing eng/backend) under backend is a cycle
        assert!(graph.reparent(4, Some(3)).is_err());

        let mut shallow = OrgGraph::new(3);
        shallow.add_department(1, None).unwrap();
        shallow.add_department(2, Some(1)).unwrap();
        shallow.add_department(3, Some(2)).unwrap();
        shallow.add_department(4, None).unwrap();
        shallow.add_department(5, Some(4)).unwrap();
        let err = shallow.reparent(4, Some(2)).unwrap_err();
        assert!(err.to_string().contains("max is 3"));
    }

    #[test]
    fn test_reparent_moves_visibility() {
        let mut graph = sample_graph();
        assert!(!graph.can_view(12, 1001));
        graph.reparent(4, Some(2)).unwrap();
        assert!(graph.can_view(12, 1001));
        assert_eq!(graph.ancestors_or_self(4), vec![4, 2, 1]);
    }

    #[test]
    fn test_tuples_describe_hierarchy_with_usersets() {
        let graph = sample_graph();
        let tuples: BTreeSet<RelationTuple> = graph.tuples().collect();
        assert!(tuples.contains(&RelationTuple::child_department(1, 2)));
        assert!(tuples.contains(&RelationTuple::child_department(2, 3)));
        assert!(tuples.contains(&RelationTuple::department_member(3, 10)));
        assert!(tuples.contains(&RelationTuple::customer_owner(1002, 100)));
        // 3 parent links + 3 members + 1 follower + 3 owners
        assert_eq!(tuples.len(), 10);
        assert!(tuples.iter().all(|t| t.validate().is_ok()));
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_graph() {
        let graph = sample_graph();
        let json = serde_json::to_string(&graph).unwrap();
        let loaded: OrgGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.department_count(), graph.department_count());
        let before: BTreeSet<AclRow> = graph.acl_rows().collect();
        let after: BTreeSet<AclRow> = loaded.acl_rows().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_set_document_owner_moves_index() {
        let mut graph = sample_graph();
        let previous = graph.set_document_owner(1002, Owner::Department(4)).unwrap();
        assert_eq!(previous, Owner::Customer(100));
        assert_eq!(graph.documents_owned_by(Owner::Customer(100)).count(), 0);
        assert!(graph.can_view(12, 1002));
        assert!(graph
            .set_document_owner(1002, Owner::Customer(999))
            .is_err());
    }
}
