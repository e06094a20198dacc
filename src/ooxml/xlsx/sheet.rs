use serde::{Deserialize, Serialize};

use crate::models::ExcelProperties;
use crate::ooxml::opc::PackURI;

/// Stable identity of a sheet within its workbook.
///
/// Unlike the name, it survives renames, and it is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub(crate) usize);

impl SheetId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Visibility of a sheet tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetState {
    #[default]
    Visible,
    /// Hidden, can be unhidden from the application
    Hidden,
    /// Hidden, can only be unhidden programmatically
    VeryHidden,
}

impl SheetState {
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "visible" => Some(SheetState::Visible),
            "hidden" => Some(SheetState::Hidden),
            "veryHidden" => Some(SheetState::VeryHidden),
            _ => None,
        }
    }

    pub fn as_xml(self) -> &'static str {
        match self {
            SheetState::Visible => "visible",
            SheetState::Hidden => "hidden",
            SheetState::VeryHidden => "veryHidden",
        }
    }

    pub fn is_visible(self) -> bool {
        self == SheetState::Visible
    }
}

/// Where a sheet read from a package came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetSource {
    /// Name the package knows the sheet by
    pub name: String,
    pub sheet_id: u32,
    pub r_id: String,
    pub partname: PackURI,
}

/// One sheet of a workbook.
///
/// Obtained from the workbook; its name and visibility change only through
/// the workbook so the registry invariants hold.
#[derive(Debug, Clone)]
pub struct Sheet {
    id: SheetId,
    name: String,
    state: SheetState,
    properties: Option<ExcelProperties>,
    source: Option<SheetSource>,
}

impl Sheet {
    pub(crate) fn new(id: SheetId, name: String) -> Self {
        Self {
            id,
            name,
            state: SheetState::Visible,
            properties: None,
            source: None,
        }
    }

    pub(crate) fn loaded(
        id: SheetId,
        name: String,
        state: SheetState,
        properties: Option<ExcelProperties>,
        source: SheetSource,
    ) -> Self {
        Self {
            id,
            name,
            state,
            properties,
            source: Some(source),
        }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SheetState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    /// The sheet's own properties, if it overrides the workbook's.
    pub fn properties(&self) -> Option<&ExcelProperties> {
        self.properties.as_ref()
    }

    /// The sheet's own properties, creating an empty override if needed.
    pub fn properties_mut(&mut self) -> &mut ExcelProperties {
        self.properties.get_or_insert_with(ExcelProperties::new)
    }

    /// Drop the override so the workbook's properties apply again.
    pub fn clear_properties(&mut self) -> Option<ExcelProperties> {
        self.properties.take()
    }

    /// Properties in effect: the override, else `workbook`.
    pub fn properties_or<'a>(&'a self, workbook: &'a ExcelProperties) -> &'a ExcelProperties {
        self.properties.as_ref().unwrap_or(workbook)
    }

    /// Whether the sheet was read from a package rather than added since.
    pub fn is_saved(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }

    pub(crate) fn source(&self) -> Option<&SheetSource> {
        self.source.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_xml_names() {
        for state in [SheetState::Visible, SheetState::Hidden, SheetState::VeryHidden] {
            assert_eq!(SheetState::from_xml(state.as_xml()), Some(state));
        }
        assert_eq!(SheetState::from_xml("Hidden"), None);
    }

    #[test]
    fn test_properties_override() {
        let mut workbook = ExcelProperties::new();
        workbook.set_editable(false).unwrap();
        let mut sheet = Sheet::new(SheetId(0), "Data".to_string());

        assert!(!sheet.properties_or(&workbook).is_editable().unwrap());
        sheet.properties_mut().set_in_memory(true).unwrap();
        // The override is a whole record: unset fields take record defaults.
        assert!(sheet.properties_or(&workbook).is_editable().unwrap());
        assert!(sheet.properties_or(&workbook).is_in_memory().unwrap());

        assert!(sheet.clear_properties().is_some());
        assert!(sheet.properties().is_none());
    }
}
