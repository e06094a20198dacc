//! Document kinds and how they are recognized.

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::ooxml::opc::constants::content_type as ct;

/// Which Office application a package belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Word,
    PowerPoint,
    Excel,
}

/// Main-part content types, including templates and macro-enabled variants.
static MAIN_CONTENT_TYPES: phf::Map<&'static str, DocumentKind> = phf_map! {
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml" => DocumentKind::Word,
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml" => DocumentKind::Word,
    "application/vnd.ms-word.document.macroEnabled.main+xml" => DocumentKind::Word,
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml" => DocumentKind::Excel,
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml" => DocumentKind::Excel,
    "application/vnd.ms-excel.sheet.macroEnabled.main+xml" => DocumentKind::Excel,
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml" => DocumentKind::PowerPoint,
    "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml" => DocumentKind::PowerPoint,
    "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml" => DocumentKind::PowerPoint,
};

impl DocumentKind {
    /// Kind whose main part has content type `content_type`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        MAIN_CONTENT_TYPES.get(content_type).copied()
    }

    /// Content type of the main part of a new document.
    pub fn main_content_type(self) -> &'static str {
        match self {
            DocumentKind::Word => ct::WML_DOCUMENT_MAIN,
            DocumentKind::PowerPoint => ct::PML_PRESENTATION_MAIN,
            DocumentKind::Excel => ct::SML_SHEET_MAIN,
        }
    }

    /// Where a theme part is added when the document has none.
    pub(crate) fn default_theme_partname(self) -> &'static str {
        match self {
            DocumentKind::Word => "/word/theme/theme1.xml",
            DocumentKind::PowerPoint => "/ppt/theme/theme1.xml",
            DocumentKind::Excel => "/xl/theme/theme1.xml",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DocumentKind::Word => "Word",
            DocumentKind::PowerPoint => "PowerPoint",
            DocumentKind::Excel => "Excel",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_content_types_are_recognized() {
        for kind in [DocumentKind::Word, DocumentKind::PowerPoint, DocumentKind::Excel] {
            assert_eq!(DocumentKind::from_content_type(kind.main_content_type()), Some(kind));
        }
    }

    #[test]
    fn test_variants() {
        assert_eq!(
            DocumentKind::from_content_type(ct::SML_SHEET_MACRO),
            Some(DocumentKind::Excel)
        );
        assert_eq!(
            DocumentKind::from_content_type(ct::PML_TEMPLATE_MAIN),
            Some(DocumentKind::PowerPoint)
        );
        assert_eq!(DocumentKind::from_content_type(ct::SML_WORKSHEET), None);
        assert_eq!(DocumentKind::from_content_type(ct::XML), None);
    }

    #[test]
    fn test_serde_name() {
        assert_eq!(serde_json::to_string(&DocumentKind::PowerPoint).unwrap(), r#""powerpoint""#);
    }
}
