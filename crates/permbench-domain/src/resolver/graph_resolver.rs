//! Graph resolver for permission checks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{relation_definition, Rewrite, UserId, UsersetRef};

use super::config::ResolverConfig;
use super::context::TraversalContext;
use super::traits::TupleReader;
use super::types::{CheckRequest, CheckResult};

/// Type alias for boxed future to handle async recursion.
type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Graph resolver for permission checks.
///
/// Evaluates the relation's rewrite rule for the requested object:
///
/// 1. direct tuples `(object, relation, user)` answer immediately;
/// 2. userset tuples on `(object, relation)` are followed recursively;
/// 3. unions try each branch in order and stop at the first `true`.
///
/// Unknown objects, relations and users resolve to `false`; only storage
/// failures and the overall timeout are errors.
pub struct GraphResolver<T> {
    tuple_reader: Arc<T>,
    config: ResolverConfig,
}

impl<T> GraphResolver<T>
where
    T: TupleReader + 'static,
{
    /// Creates a new graph resolver.
    pub fn new(tuple_reader: Arc<T>) -> Self {
        Self {
            tuple_reader,
            config: ResolverConfig::default(),
        }
    }

    /// Creates a new graph resolver with custom configuration.
    pub fn with_config(tuple_reader: Arc<T>, config: ResolverConfig) -> Self {
        Self {
            tuple_reader,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Performs a permission check.
    pub async fn check(&self, request: &CheckRequest) -> DomainResult<CheckResult> {
        let mut ctx = TraversalContext::new();
        let check_future = self.resolve_check(request.node(), request.user, 0, &mut ctx);

        let allowed = match timeout(self.config.timeout, check_future).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(DomainError::Timeout {
                    duration_ms: self.config.timeout.as_millis() as u64,
                })
            }
        };

        debug!(
            object = %request.object,
            relation = %request.relation,
            user = request.user,
            allowed,
            dispatches = ctx.stats.dispatches,
            memo_hits = ctx.stats.memo_hits,
            cycles_cut = ctx.stats.cycles_cut,
            "check resolved"
        );

        Ok(CheckResult {
            allowed,
            stats: ctx.stats,
        })
    }

    /// Resolves one node `(object, relation)` for `user` (boxed for recursion).
    fn resolve_check<'a>(
        &'a self,
        node: UsersetRef,
        user: UserId,
        depth: u32,
        ctx: &'a mut TraversalContext,
    ) -> BoxFuture<'a, DomainResult<bool>> {
        Box::pin(async move {
            ctx.stats.dispatches += 1;

            let remaining = self.config.max_depth.saturating_sub(depth);
            if let Some(allowed) = ctx.lookup(&node, remaining) {
                return Ok(allowed);
            }

            if ctx.in_progress.contains(&node) {
                ctx.cut_cycle();
                return Ok(false);
            }

            if remaining == 0 {
                ctx.cut_depth();
                warn!(
                    node = %node,
                    max_depth = self.config.max_depth,
                    "depth limit reached, treating path as denied"
                );
                return Ok(false);
            }

            let Some(definition) = relation_definition(node.object.object_type, node.relation)
            else {
                return Ok(false);
            };

            let checkpoint = ctx.checkpoint();
            ctx.in_progress.insert(node);
            let result = self
                .resolve_rewrite(node, definition.rewrite, user, depth, ctx)
                .await;
            ctx.in_progress.remove(&node);

            let allowed = result?;
            ctx.settle(node, allowed, remaining, checkpoint);
            Ok(allowed)
        })
    }

    /// Resolves a rewrite rule on `node` (boxed for recursion).
    fn resolve_rewrite<'a>(
        &'a self,
        node: UsersetRef,
        rewrite: Rewrite,
        user: UserId,
        depth: u32,
        ctx: &'a mut TraversalContext,
    ) -> BoxFuture<'a, DomainResult<bool>> {
        Box::pin(async move {
            match rewrite {
                Rewrite::Direct => self.resolve_direct(node, user, depth, ctx).await,

                Rewrite::Computed(relation) => {
                    let computed = UsersetRef::new(node.object, relation);
                    self.resolve_check(computed, user, depth + 1, ctx).await
                }

                Rewrite::Union(children) => {
                    for child in children {
                        if self
                            .resolve_rewrite(node, *child, user, depth, &mut *ctx)
                            .await?
                        {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            }
        })
    }

    /// Resolves the tuples stored on `node`: the direct user first, then
    /// every userset indirection.
    async fn resolve_direct(
        &self,
        node: UsersetRef,
        user: UserId,
        depth: u32,
        ctx: &mut TraversalContext,
    ) -> DomainResult<bool> {
        if self
            .tuple_reader
            .has_direct(node.object, node.relation, user)
            .await?
        {
            return Ok(true);
        }

        let usersets = self
            .tuple_reader
            .read_usersets(node.object, node.relation)
            .await?;

        for userset in usersets {
            if self
                .resolve_check(userset, user, depth + 1, &mut *ctx)
                .await?
            {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
