//! officekit - mutable Word, PowerPoint and Excel documents
//!
//! This library creates, edits and saves Office Open XML packages through a
//! small document model:
//!
//! - **Property records**: theme palette, core properties, Excel
//!   properties and cell style settings, each backed by a
//!   forward-compatible binary table with published field offsets (`VT_*`)
//! - **Documents**: [`Word`], [`PowerPoint`] and [`Excel`], created empty,
//!   opened from a file or decoded from bytes, and saved atomically
//! - **Sheet registry**: ordered, uniquely named sheets whose identity
//!   survives renames
//! - **Pass-through**: package parts the model does not interpret are
//!   written back as they were read
//!
//! # Example - Editing a workbook
//!
//! ```no_run
//! use officekit::{Document, Excel};
//!
//! # fn main() -> Result<(), officekit::Error> {
//! let mut book = Excel::open("budget.xlsx")?;
//! book.add_sheet("Q2")?;
//! book.rename_sheet("Q1", "Q1 (final)")?;
//! book.core_properties_mut().set_creator("Finance")?;
//! book.save_as("budget.xlsx")?;
//!
//! for name in book.list_sheet_names() {
//!     println!("Sheet: {}", name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Property records
//!
//! ```
//! use officekit::models::{CoreProperties, PropertyModel};
//!
//! # fn main() -> Result<(), officekit::Error> {
//! let mut props = CoreProperties::new();
//! props.set_title("Annual report")?;
//! let bytes = props.to_bytes()?;
//!
//! let decoded = CoreProperties::from_bytes(bytes)?;
//! assert_eq!(decoded.title()?, "Annual report");
//! assert_eq!(decoded.subject()?, "");
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Documents are `Send` but not synchronized. Callers sharing one document
//! between threads wrap it, for instance with [`shared`].

use std::sync::Arc;

use parking_lot::Mutex;

/// Error type, status codes and binary helpers
pub mod common;

/// Document lifecycle shared by all document kinds
pub mod document;

/// Typed property records
pub mod models;

/// Office Open XML packages and the document kinds built on them
pub mod ooxml;

/// Binary table codec underlying the property records
pub mod schema;

pub use common::{Error, Result, StatusCode};
pub use document::{Document, DocumentKind, OfficeDocument};
pub use models::{
    CoreProperties, ExcelProperties, StyleSetting, ThemeColor, ThemePalette, ThemeSlot,
};
pub use ooxml::docx::Word;
pub use ooxml::opc::{Compression, OoxmlGateway, PackageGateway};
pub use ooxml::pptx::PowerPoint;
pub use ooxml::xlsx::{Excel, Sheet, SheetId, SheetState};

/// A document shared between threads.
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap a document for sharing between threads.
pub fn shared<T>(document: T) -> Shared<T> {
    Arc::new(Mutex::new(document))
}
