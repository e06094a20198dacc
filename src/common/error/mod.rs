//! Unified error types for officekit.
//!
//! This module provides a unified error type that encompasses errors from the
//! binary schema and the package layer, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result, StatusCode};
