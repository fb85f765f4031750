//! Storage layer for reana-client
//!
//! The client keeps no state on disk. Configuration comes from the process
//! environment and is frozen into an immutable snapshot at startup.

pub mod config;
