//! Utils module - Shared utilities and helpers
//!
//! This module provides utility functions and helpers that are used across
//! multiple layers of the application architecture.

/// Configuration and input validation
pub mod validation;

/// Unit formatting and identifier helpers
pub mod text;

/// Log level selection and subscriber installation
pub mod logging;
