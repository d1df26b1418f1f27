//! permbench-cli: command line surface
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                permbench-cli                 │
//! ├─────────────────────────────────────────────┤
//! │  main.rs        - clap parser, runtime      │
//! │  commands.rs    - generate / bench          │
//! │  observability/ - tracing subscriber setup  │
//! └─────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod observability;
