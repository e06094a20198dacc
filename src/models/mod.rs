//! Typed property records over the binary schema.
//!
//! Each record publishes its field offsets as `VT_*` constants. Reads of an
//! unset field return the record's default; writes are batched until the
//! record is encoded with [`PropertyModel::to_bytes`].

pub mod core_properties;
pub mod excel_properties;
pub mod style_setting;
pub mod table;
pub mod theme;

pub use core_properties::CoreProperties;
pub use excel_properties::ExcelProperties;
pub use style_setting::{
    BorderLine, BorderSide, BorderStyle, HorizontalAlignment, StyleSetting, VerticalAlignment,
};
pub use table::{FieldSpec, PropertyModel, PropertyTable, Schema};
pub use theme::{ThemeColor, ThemePalette, ThemeSlot};
