//! Binary schema codec.
//!
//! Property records are stored as small offset-addressed tables. Every field
//! is identified by a *slot*, the stable `VT_*` offset published for the
//! record, and carries a one-byte kind tag so readers can reject a field whose
//! stored type disagrees with what they expect.
//!
//! # Wire layout
//!
//! All integers are little-endian.
//!
//! ```text
//! header     magic "OXTB" | version u16 | flags u16 | root u32
//! directory  count u16 | reserved u16 | count x entry
//! entry      slot u16 | kind u8 | reserved u8 | data_offset u32 | data_len u32
//! data       payloads in ascending slot order
//! ```
//!
//! Decoding checks only the header and that the directory fits inside the
//! buffer. Each field is bounds-checked when it is read, so a damaged field
//! never prevents reading the others.
//!
//! Slots are append-only: once a slot has been published for a record it is
//! never reused for a different field. Readers skip slots they do not know and
//! absent slots resolve to the record's documented default.
//!
//! # Example
//!
//! ```
//! use officekit::schema::{BinaryTable, TableBuilder};
//!
//! let mut builder = TableBuilder::new();
//! builder.set(4, &"Quarterly report".to_string())?;
//! builder.set(6, &true)?;
//! let bytes = builder.finish()?;
//!
//! let table = BinaryTable::decode(bytes)?;
//! assert_eq!(table.get::<String>(4)?.as_deref(), Some("Quarterly report"));
//! assert_eq!(table.get::<bool>(6)?, Some(true));
//! assert_eq!(table.get::<bool>(8)?, None);
//! # Ok::<(), officekit::schema::SchemaError>(())
//! ```

pub mod builder;
pub mod error;
pub mod field;
pub mod table;

pub use builder::TableBuilder;
pub use error::{Result, SchemaError};
pub use field::{FieldKind, FieldType, RawField};
pub use table::BinaryTable;

/// Magic bytes at the start of every encoded table.
pub const MAGIC: [u8; 4] = *b"OXTB";

/// Format version written by this crate.
pub const FORMAT_VERSION: u16 = 1;

/// Size of the fixed header.
pub const HEADER_LEN: usize = 12;

/// Size of the directory header (count + reserved).
pub const DIRECTORY_HEADER_LEN: usize = 4;

/// Size of one directory entry.
pub const ENTRY_LEN: usize = 12;
