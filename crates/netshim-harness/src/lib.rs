//! Tooling around netshim.
//!
//! This crate provides:
//! - Configuration from the environment and command-line overrides
//! - Structured JSONL logging of every wrapped call
//! - JSON/plain report views of resolution results
//! - The command implementations behind the `netshim` binary

#![forbid(unsafe_code)]

pub mod commands;
pub mod config;
pub mod report;
pub mod structured_log;

pub use commands::{HarnessError, ResolveRequest};
pub use config::{HarnessConfig, LogSink, OutputFormat};
pub use report::{AddrInfoView, ResolveReport};
pub use structured_log::{LogEmitter, LogEntry, LogIssue, LogLevel};
