//! permbench-domain: Core authorization domain logic
//!
//! This crate contains the core authorization logic including:
//! - Relationship tuple model and the fixed relation schema
//! - Organization graph arena (departments, users, customers, documents)
//! - Graph resolver for permission checks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              permbench-domain                │
//! ├─────────────────────────────────────────────┤
//! │  model/      - Tuples, schema & org graph   │
//! │  resolver/   - Graph resolution engine      │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
