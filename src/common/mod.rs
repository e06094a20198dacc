//! Common types and utilities shared across document kinds.

// Submodule declarations
pub mod binary;
pub mod error;

// Re-exports for convenience
pub use error::{Error, Result, StatusCode};
