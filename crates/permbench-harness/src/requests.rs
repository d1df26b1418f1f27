//! Fixed, seeded request corpus shared by both engines.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use permbench_domain::model::{DepartmentId, DocumentId, OrgGraph, UserId};
use permbench_storage::EntityChange;

use crate::config::BenchmarkSettings;

/// One `document#viewer` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckPair {
    pub user: UserId,
    pub document: DocumentId,
}

/// A membership that is added and then removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipPair {
    pub department: DepartmentId,
    pub user: UserId,
}

impl MembershipPair {
    pub fn add(&self) -> EntityChange {
        EntityChange::AddMember {
            department: self.department,
            user: self.user,
        }
    }

    pub fn remove(&self) -> EntityChange {
        EntityChange::RemoveMember {
            department: self.department,
            user: self.user,
        }
    }
}

/// Requests issued, identically and in the same order, to every engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCorpus {
    pub checks: Vec<CheckPair>,
    pub mutations: Vec<MembershipPair>,
}

const PICK_ATTEMPTS: usize = 16;

impl RequestCorpus {
    /// Builds the request corpus for `graph`.
    ///
    /// About `allowed_ratio` of the checks come from pairs the hierarchy
    /// grants; the rest are uniform over users × documents. Mutation pairs
    /// name users that are not yet members of the department.
    pub fn build(graph: &OrgGraph, settings: &BenchmarkSettings) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let users: Vec<UserId> = graph.users().collect();
        let documents: Vec<DocumentId> = graph.documents().map(|(id, _)| id).collect();
        let departments: Vec<DepartmentId> = graph.departments().map(|d| d.id).collect();

        let checks = if users.is_empty() || documents.is_empty() {
            Vec::new()
        } else {
            let mut visible: HashMap<UserId, Vec<DocumentId>> = HashMap::new();
            (0..settings.requests)
                .map(|_| {
                    let user = users[rng.gen_range(0..users.len())];
                    if rng.gen_bool(settings.allowed_ratio) {
                        let granted = visible
                            .entry(user)
                            .or_insert_with(|| graph.visible_documents(user).into_iter().collect());
                        if let Some(document) = granted.choose(&mut rng) {
                            return CheckPair {
                                user,
                                document: *document,
                            };
                        }
                    }
                    CheckPair {
                        user,
                        document: documents[rng.gen_range(0..documents.len())],
                    }
                })
                .collect()
        };

        let mut mutations = Vec::new();
        if !users.is_empty() && !departments.is_empty() {
            let mut seen = HashSet::new();
            for _ in 0..settings.mutations {
                let picked = (0..PICK_ATTEMPTS).find_map(|_| {
                    let pair = MembershipPair {
                        department: departments[rng.gen_range(0..departments.len())],
                        user: users[rng.gen_range(0..users.len())],
                    };
                    (!graph.is_member(pair.department, pair.user) && !seen.contains(&pair))
                        .then_some(pair)
                });
                if let Some(pair) = picked {
                    seen.insert(pair);
                    mutations.push(pair);
                }
            }
        }

        debug!(
            checks = checks.len(),
            mutations = mutations.len(),
            "request corpus built"
        );
        Self { checks, mutations }
    }
}
