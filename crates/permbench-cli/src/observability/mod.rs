//! Observability setup for the permbench binary.

mod logging;

pub use logging::{init_logging, json_subscriber, parse_log_level, LoggingConfig};
