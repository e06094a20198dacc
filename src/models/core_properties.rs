//! Core document properties record.

use super::table::{FieldSpec, PropertyModel, PropertyTable, Schema};
use crate::schema::{FieldKind, Result};

/// Title, subject, description, tags, category and creator.
///
/// Every field is optional; unset fields read as empty.
#[derive(Debug, Clone)]
pub struct CoreProperties {
    table: PropertyTable,
}

impl CoreProperties {
    pub const VT_TITLE: u16 = 4;
    pub const VT_SUBJECT: u16 = 6;
    pub const VT_DESCRIPTION: u16 = 8;
    pub const VT_TAGS: u16 = 10;
    pub const VT_CATEGORY: u16 = 12;
    pub const VT_CREATOR: u16 = 14;

    pub fn new() -> Self {
        Self::empty()
    }

    pub fn title(&self) -> Result<String> {
        self.text(Self::VT_TITLE)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.set_field(Self::VT_TITLE, title.into())
    }

    pub fn subject(&self) -> Result<String> {
        self.text(Self::VT_SUBJECT)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<()> {
        self.set_field(Self::VT_SUBJECT, subject.into())
    }

    pub fn description(&self) -> Result<String> {
        self.text(Self::VT_DESCRIPTION)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.set_field(Self::VT_DESCRIPTION, description.into())
    }

    /// Tags in the order they were set.
    pub fn tags(&self) -> Result<Vec<String>> {
        Ok(self.get_field(Self::VT_TAGS)?.unwrap_or_default())
    }

    pub fn set_tags<I, S>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.set_field(Self::VT_TAGS, tags)
    }

    pub fn category(&self) -> Result<String> {
        self.text(Self::VT_CATEGORY)
    }

    pub fn set_category(&mut self, category: impl Into<String>) -> Result<()> {
        self.set_field(Self::VT_CATEGORY, category.into())
    }

    pub fn creator(&self) -> Result<String> {
        self.text(Self::VT_CREATOR)
    }

    pub fn set_creator(&mut self, creator: impl Into<String>) -> Result<()> {
        self.set_field(Self::VT_CREATOR, creator.into())
    }

    fn text(&self, slot: u16) -> Result<String> {
        Ok(self.get_field(slot)?.unwrap_or_default())
    }
}

impl Default for CoreProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyModel for CoreProperties {
    const SCHEMA: &'static Schema = &Schema {
        name: "CorePropertiesModel",
        fields: &[
            FieldSpec {
                slot: CoreProperties::VT_TITLE,
                name: "title",
                kind: FieldKind::String,
            },
            FieldSpec {
                slot: CoreProperties::VT_SUBJECT,
                name: "subject",
                kind: FieldKind::String,
            },
            FieldSpec {
                slot: CoreProperties::VT_DESCRIPTION,
                name: "description",
                kind: FieldKind::String,
            },
            FieldSpec {
                slot: CoreProperties::VT_TAGS,
                name: "tags",
                kind: FieldKind::StringList,
            },
            FieldSpec {
                slot: CoreProperties::VT_CATEGORY,
                name: "category",
                kind: FieldKind::String,
            },
            FieldSpec {
                slot: CoreProperties::VT_CREATOR,
                name: "creator",
                kind: FieldKind::String,
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
    use crate::schema::SchemaError;

    #[test]
    fn test_unset_fields_read_empty() {
        let props = CoreProperties::new();
        assert_eq!(props.title().unwrap(), "");
        assert_eq!(props.creator().unwrap(), "");
        assert!(props.tags().unwrap().is_empty());
    }

    #[test]
    fn test_setters_survive_encoding() {
        let mut props = CoreProperties::new();
        props.set_title("Budget 2026").unwrap();
        props.set_subject("Finance").unwrap();
        props.set_description("Draft numbers").unwrap();
        props.set_tags(["q1", "forecast"]).unwrap();
        props.set_category("Reports").unwrap();
        props.set_creator("Finance Team").unwrap();

        let reopened = CoreProperties::from_bytes(props.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.title().unwrap(), "Budget 2026");
        assert_eq!(reopened.subject().unwrap(), "Finance");
        assert_eq!(reopened.description().unwrap(), "Draft numbers");
        assert_eq!(reopened.tags().unwrap(), vec!["q1", "forecast"]);
        assert_eq!(reopened.category().unwrap(), "Reports");
        assert_eq!(reopened.creator().unwrap(), "Finance Team");
    }

    #[test]
    fn test_generic_field_access_checks_types() {
        let mut props = CoreProperties::new();
        assert!(matches!(
            props.set_field(CoreProperties::VT_TAGS, "not a list".to_string()),
            Err(SchemaError::TypeMismatch { slot: 10, .. })
        ));
        assert!(matches!(
            props.get_field::<String>(CoreProperties::VT_TAGS),
            Err(SchemaError::TypeMismatch { .. })
        ));
        assert!(matches!(
            props.set_field(16, "no such field".to_string()),
            Err(SchemaError::FieldOutOfRange { slot: 16, .. })
        ));
    }

    #[test]
    fn test_identical_content_encodes_identically() {
        let mut a = CoreProperties::new();
        a.set_creator("x").unwrap();
        a.set_title("y").unwrap();

        let mut b = CoreProperties::new();
        b.set_title("y").unwrap();
        b.set_creator("x").unwrap();

        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
        assert_eq!(a.to_bytes().unwrap(), a.to_bytes().unwrap());
    }
}
