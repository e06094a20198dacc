//! Word (.docx) documents.
//!
//! Body content is carried through unchanged; the document model covers core
//! properties and the theme.

pub mod package;

pub use package::Word;
