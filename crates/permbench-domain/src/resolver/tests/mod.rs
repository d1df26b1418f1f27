//! Tests for the graph resolver module.
//!
//! Organized by functionality:
//! - Direct tuple resolution
//! - Userset indirection through the department hierarchy
//! - Customer-owned documents
//! - Safety features (cycle detection, depth limiting, timeouts)
//! - Storage errors
