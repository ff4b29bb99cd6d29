//! Structured logging setup for SideBot.
//!
//! Console output for operators, plus optional rolling NDJSON files.

pub mod logger;

pub use logger::{init_logger, LogGuard};
