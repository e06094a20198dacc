//! Unified error type for officekit.
//!
//! Layer-specific errors (binary schema, OPC package) convert into this type
//! so every public operation returns the same `Result`.
use thiserror::Error;

/// Main error type for officekit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error, including failed saves
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input bytes are structurally invalid
    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),

    /// Input bytes are not the requested document kind
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A schema field points outside its buffer or the schema
    #[error("Field at slot {slot} is out of range: {reason}")]
    FieldOutOfRange { slot: u16, reason: String },

    /// A schema field holds a different type than requested
    #[error("Type mismatch at slot {slot}: expected {expected}, found {found}")]
    TypeMismatch {
        slot: u16,
        expected: String,
        found: String,
    },

    /// A sheet with this name already exists
    #[error("Sheet name already exists: {0}")]
    DuplicateName(String),

    /// Sheet or part not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation would leave the document invalid
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl Error {
    /// Status code reported across the C boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::FileNotFound,
            Error::Io(_) => StatusCode::IoError,
            Error::MalformedBuffer(_)
            | Error::FieldOutOfRange { .. }
            | Error::TypeMismatch { .. } => StatusCode::FlatBufferError,
            Error::UnsupportedFormat(_)
            | Error::DuplicateName(_)
            | Error::NotFound(_)
            | Error::InvalidOperation(_) => StatusCode::InvalidArgument,
        }
    }
}

/// Result codes of the C-callable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum StatusCode {
    UnknownError = -1,
    Success = 0,
    InvalidArgument = 1,
    FlatBufferError = 2,
    FileNotFound = 3,
    IoError = 4,
}

/// Result type for officekit operations.
pub type Result<T> = std::result::Result<T, Error>;
