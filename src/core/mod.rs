//! Core module - Request shaping and result processing
//!
//! Filter and format expressions, the tabular result pipeline and the
//! workflow lifecycle helpers shared by the command handlers.

/// `--filter key=value` sets
pub mod filters;

/// `--format column[=value]` directives
pub mod format;

/// Typed column tables
pub mod frame;

/// Workflow statuses, start options and the follow poller
pub mod workflow;
