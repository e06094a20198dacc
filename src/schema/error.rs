/// Error types for binary schema access
use thiserror::Error;

use super::field::FieldKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),

    #[error("Field at slot {slot} is out of range: {reason}")]
    FieldOutOfRange { slot: u16, reason: String },

    #[error("Type mismatch at slot {slot}: expected {expected}, found {found}")]
    TypeMismatch {
        slot: u16,
        expected: FieldKind,
        found: String,
    },
}

impl SchemaError {
    pub(crate) fn out_of_range(slot: u16, reason: impl Into<String>) -> Self {
        SchemaError::FieldOutOfRange {
            slot,
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(slot: u16, expected: FieldKind, found: impl Into<String>) -> Self {
        SchemaError::TypeMismatch {
            slot,
            expected,
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
