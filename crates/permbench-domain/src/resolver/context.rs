//! Internal traversal state for the graph resolver.

use std::collections::{HashMap, HashSet};

use crate::model::UsersetRef;

use super::types::ResolutionStats;

/// A settled node answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Memo {
    Allowed,
    /// Denied for any remaining depth.
    Denied,
    /// Denied when at most this many hops remain. The subtree hit a cut
    /// (depth limit, cycle, or another bounded entry), so more headroom may
    /// reach a member.
    DeniedWithin(u32),
}

/// Per-request traversal state.
///
/// A node is a userset `(object_type, object_id, relation)`. Evaluation is
/// sequential, so `in_progress` is exactly the current path from the root.
///
/// Every rewrite is a union, so the first `true` ends the whole check. A
/// denied node therefore stays denied for the rest of the request, as long
/// as it is not revisited with more remaining depth than it was settled with.
#[derive(Debug, Default)]
pub(crate) struct TraversalContext {
    pub(crate) in_progress: HashSet<UsersetRef>,
    pub(crate) memo: HashMap<UsersetRef, Memo>,
    pub(crate) stats: ResolutionStats,
    /// Cuts plus bounded memo hits seen so far.
    bounded: u64,
}

impl TraversalContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer for `node` when `remaining` hops are left, if already settled.
    pub(crate) fn lookup(&mut self, node: &UsersetRef, remaining: u32) -> Option<bool> {
        let answer = match *self.memo.get(node)? {
            Memo::Allowed => true,
            Memo::Denied => false,
            Memo::DeniedWithin(budget) if remaining <= budget => {
                self.bounded += 1;
                false
            }
            Memo::DeniedWithin(_) => return None,
        };
        self.stats.memo_hits += 1;
        Some(answer)
    }

    pub(crate) fn cut_cycle(&mut self) {
        self.stats.cycles_cut += 1;
        self.bounded += 1;
    }

    pub(crate) fn cut_depth(&mut self) {
        self.stats.depth_limited += 1;
        self.bounded += 1;
    }

    /// Marker to pass back to [`settle`](Self::settle) once `node` resolves.
    pub(crate) fn checkpoint(&self) -> u64 {
        self.bounded
    }

    /// Records the answer for `node`, resolved with `remaining` hops left.
    pub(crate) fn settle(
        &mut self,
        node: UsersetRef,
        allowed: bool,
        remaining: u32,
        checkpoint: u64,
    ) {
        let memo = if allowed {
            Memo::Allowed
        } else if self.bounded == checkpoint {
            Memo::Denied
        } else {
            Memo::DeniedWithin(remaining)
        };
        self.memo.insert(node, memo);
    }
}
