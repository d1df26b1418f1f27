//! permbench-storage: storage for both permission engines
//!
//! This crate provides:
//! - TupleStore trait and an in-memory relationship tuple store that also
//!   serves the graph resolver
//! - AclStore trait and an in-memory flattened ACL repository with
//!   transactional re-expansion
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               permbench-storage                 │
//! ├─────────────────────────────────────────────────┤
//! │  traits.rs   - TupleStore / AclStore traits     │
//! │  memory.rs   - In-memory tuple store            │
//! │  flat_acl.rs - In-memory flattened ACL          │
//! │  error.rs    - StorageError                     │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod flat_acl;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{AnomalyKind, ConsistencyAnomaly, StorageError, StorageResult};
pub use flat_acl::MemoryAclStore;
pub use memory::MemoryTupleStore;
pub use traits::{AclStore, EntityChange, ExpansionOutcome, TupleStore};
