//! Configuration for the graph resolver.

use std::time::Duration;

/// Configuration for the graph resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum depth for graph traversal (matches OpenFGA default of 25).
    ///
    /// Must exceed the deepest department tree plus the document hops
    /// (`viewer` -> `owner` -> department chain), otherwise deep members are
    /// reported as denied.
    pub max_depth: u32,
    /// Timeout for check operations.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 25,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with the specified max depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Creates a new configuration with the specified timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Smallest depth that resolves every path in a tree of `department_levels`.
    ///
    /// `document#viewer` -> `document#owner` -> owning department, then one
    /// hop per level below it.
    pub fn depth_for_hierarchy(department_levels: u32) -> u32 {
        department_levels + 3
    }
}
