//! Excel (.xlsx) workbooks.
//!
//! The workbook keeps its sheets in a [`SheetRegistry`]: an ordered set of
//! uniquely named [`Sheet`]s with identities that survive renames.

pub mod excel;
pub mod registry;
pub mod sheet;

pub use excel::Excel;
pub use registry::{SheetRegistry, validate_sheet_name};
pub use sheet::{Sheet, SheetId, SheetState};
