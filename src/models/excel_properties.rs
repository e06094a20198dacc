//! Spreadsheet properties record.

use bytes::Bytes;

use super::table::{FieldSpec, PropertyModel, PropertyTable, Schema};
use crate::schema::{FieldKind, Result};

/// Workbook (or per-sheet override) settings.
///
/// `settings` is application-defined and passed through unmodified.
#[derive(Debug, Clone)]
pub struct ExcelProperties {
    table: PropertyTable,
}

impl ExcelProperties {
    pub const VT_IS_IN_MEMORY: u16 = 4;
    pub const VT_IS_EDITABLE: u16 = 6;
    pub const VT_SETTINGS: u16 = 8;

    pub fn new() -> Self {
        Self::empty()
    }

    /// Defaults to `false`.
    pub fn is_in_memory(&self) -> Result<bool> {
        Ok(self.get_field(Self::VT_IS_IN_MEMORY)?.unwrap_or(false))
    }

    pub fn set_in_memory(&mut self, in_memory: bool) -> Result<()> {
        self.set_field(Self::VT_IS_IN_MEMORY, in_memory)
    }

    /// Defaults to `true`.
    pub fn is_editable(&self) -> Result<bool> {
        Ok(self.get_field(Self::VT_IS_EDITABLE)?.unwrap_or(true))
    }

    pub fn set_editable(&mut self, editable: bool) -> Result<()> {
        self.set_field(Self::VT_IS_EDITABLE, editable)
    }

    /// Opaque settings blob; empty when unset.
    pub fn settings(&self) -> Result<Bytes> {
        Ok(self.get_field(Self::VT_SETTINGS)?.unwrap_or_default())
    }

    pub fn set_settings(&mut self, settings: impl Into<Bytes>) -> Result<()> {
        self.set_field(Self::VT_SETTINGS, settings.into())
    }
}

impl Default for ExcelProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyModel for ExcelProperties {
    const SCHEMA: &'static Schema = &Schema {
        name: "ExcelPropertiesModel",
        fields: &[
            FieldSpec {
                slot: ExcelProperties::VT_IS_IN_MEMORY,
                name: "is_in_memory",
                kind: FieldKind::Bool,
            },
            FieldSpec {
                slot: ExcelProperties::VT_IS_EDITABLE,
                name: "is_editable",
                kind: FieldKind::Bool,
            },
            FieldSpec {
                slot: ExcelProperties::VT_SETTINGS,
                name: "settings",
                kind: FieldKind::Bytes,
            },
        ],
    };

    fn from_table(table: PropertyTable) -> Self {
        Self { table }
    }

    fn table(&self) -> &PropertyTable {
        &self.table
    }

    fn table_mut(&mut self) -> &mut PropertyTable {
        &mut self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let props = ExcelProperties::new();
        assert!(props.is_editable().unwrap());
        assert!(!props.is_in_memory().unwrap());
        assert!(props.settings().unwrap().is_empty());
    }

    #[test]
    fn test_settings_blob_is_untouched() {
        let blob: Vec<u8> = (0..=255).collect();
        let mut props = ExcelProperties::new();
        props.set_settings(blob.clone()).unwrap();
        props.set_editable(false).unwrap();

        let reopened = ExcelProperties::from_bytes(props.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.settings().unwrap().as_ref(), blob.as_slice());
        assert!(!reopened.is_editable().unwrap());
        assert!(!reopened.is_in_memory().unwrap());
    }

    #[test]
    fn test_malformed_buffer_is_rejected() {
        assert!(ExcelProperties::from_bytes(vec![0u8; 3]).is_err());
    }
}
