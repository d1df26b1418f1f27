//! Graph resolver for permission checks.
//!
//! The resolver performs async graph traversal over relationship tuples to
//! determine if a user satisfies a relation on an object.
//!
//! # Architecture Decisions
//!
//! - **Closed schema**: relations and their rewrite rules are a fixed enum
//!   (see [`crate::model::Rewrite`]); the resolver matches on them directly.
//!
//! - **Sequential unions**: union branches are evaluated in declaration order
//!   and short-circuit on the first `true`, so the cheapest branch (direct
//!   tuples) is always tried first.
//!
//! - **Cycle Detection**: a per-request set of in-progress
//!   `(object_type, object_id, relation)` nodes. Re-entering a node that is
//!   still being resolved ends that path with `false`.
//!
//! - **Memoization**: a per-request memo table records settled nodes. A
//!   denial that depended on a cut path (cycle or depth limit) is tagged with
//!   the remaining depth it was resolved under and reused only when no more
//!   depth is left, so shared subgraphs are resolved once per depth budget.
//!
//! - **Depth Limiting**: default max depth of 25. Exhausting it ends the path
//!   with `false` and is logged.
//!
//! - **Timeout Handling**: configurable timeout (default 30s) for the whole check.

mod config;
mod context;
mod graph_resolver;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::ResolverConfig;
pub use graph_resolver::GraphResolver;
pub use traits::TupleReader;
pub use types::{CheckRequest, CheckResult, ResolutionStats};
