//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::ooxml::opc::error::OpcError;
use crate::schema::SchemaError;

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::MalformedBuffer(s) => Error::MalformedBuffer(s),
            SchemaError::FieldOutOfRange { slot, reason } => Error::FieldOutOfRange { slot, reason },
            SchemaError::TypeMismatch {
                slot,
                expected,
                found,
            } => Error::TypeMismatch {
                slot,
                expected: expected.to_string(),
                found,
            },
        }
    }
}

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::IoError(e) => Error::Io(e),
            OpcError::UnsupportedContainer(s) => Error::UnsupportedFormat(s),
            OpcError::PartNotFound(s) => {
                Error::MalformedBuffer(format!("required part missing: {}", s))
            },
            OpcError::WriteError(s) => Error::Io(std::io::Error::other(s)),
            OpcError::ZipError(_)
            | OpcError::XmlError(_)
            | OpcError::QuickXmlError(_)
            | OpcError::Utf8Error(_)
            | OpcError::InvalidPackUri(_) => Error::MalformedBuffer(err.to_string()),
        }
    }
}
