//! Minimal valid packages for new documents.
//!
//! Part content lives under `resources/` and is compiled in.

use crate::common::Result;
use crate::document::DocumentKind;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::{OpcPackage, PackURI, Part};

macro_rules! resource {
    ($path:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/", $path))
    };
}

pub const THEME_XML: &str = resource!("theme/theme1.xml");

pub const WORD_DOCUMENT_XML: &str = resource!("word/document.xml");
pub const WORD_STYLES_XML: &str = resource!("word/styles.xml");

pub const WORKBOOK_XML: &str = resource!("xl/workbook.xml");
pub const WORKSHEET_XML: &str = resource!("xl/worksheets/sheet.xml");
pub const SPREADSHEET_STYLES_XML: &str = resource!("xl/styles.xml");

pub const PRESENTATION_XML: &str = resource!("ppt/presentation.xml");
pub const SLIDE_MASTER_XML: &str = resource!("ppt/slideMasters/slideMaster1.xml");
pub const SLIDE_LAYOUT_XML: &str = resource!("ppt/slideLayouts/slideLayout1.xml");

/// Build the package of an empty document of `kind`.
///
/// Core properties are not included; the document writes them on save.
pub fn new_package(kind: DocumentKind) -> Result<OpcPackage> {
    let mut pkg = OpcPackage::new();
    match kind {
        DocumentKind::Word => {
            let document = uri("/word/document.xml")?;
            let styles = uri("/word/styles.xml")?;
            let mut main = Part::new(document.clone(), ct::WML_DOCUMENT_MAIN, WORD_DOCUMENT_XML);
            main.rels_mut().get_or_add(rt::STYLES, &styles);
            pkg.add_part(main);
            pkg.add_part(Part::new(styles, ct::WML_STYLES, WORD_STYLES_XML));
            pkg.relate_to(&document, rt::OFFICE_DOCUMENT);
        },
        DocumentKind::Excel => {
            let workbook = uri("/xl/workbook.xml")?;
            let sheet = uri("/xl/worksheets/sheet1.xml")?;
            let styles = uri("/xl/styles.xml")?;
            let mut main = Part::new(workbook.clone(), ct::SML_SHEET_MAIN, WORKBOOK_XML);
            // rId1 is referenced by the template's <sheet> element.
            main.rels_mut()
                .add_relationship("rId1", rt::WORKSHEET, sheet.relative_ref(workbook.base_uri()), false);
            main.rels_mut().get_or_add(rt::STYLES, &styles);
            pkg.add_part(main);
            pkg.add_part(Part::new(sheet, ct::SML_WORKSHEET, WORKSHEET_XML));
            pkg.add_part(Part::new(styles, ct::SML_STYLES, SPREADSHEET_STYLES_XML));
            pkg.relate_to(&workbook, rt::OFFICE_DOCUMENT);
        },
        DocumentKind::PowerPoint => {
            let presentation = uri("/ppt/presentation.xml")?;
            let master = uri("/ppt/slideMasters/slideMaster1.xml")?;
            let layout = uri("/ppt/slideLayouts/slideLayout1.xml")?;
            let theme = uri("/ppt/theme/theme1.xml")?;

            // rId1 in presentation.xml and the slide master is fixed by the templates.
            let mut main = Part::new(presentation.clone(), ct::PML_PRESENTATION_MAIN, PRESENTATION_XML);
            main.rels_mut().add_relationship(
                "rId1",
                rt::SLIDE_MASTER,
                master.relative_ref(presentation.base_uri()),
                false,
            );
            main.rels_mut().get_or_add(rt::THEME, &theme);

            let mut master_part = Part::new(master.clone(), ct::PML_SLIDE_MASTER, SLIDE_MASTER_XML);
            master_part.rels_mut().add_relationship(
                "rId1",
                rt::SLIDE_LAYOUT,
                layout.relative_ref(master.base_uri()),
                false,
            );
            master_part.rels_mut().get_or_add(rt::THEME, &theme);

            let mut layout_part = Part::new(layout, ct::PML_SLIDE_LAYOUT, SLIDE_LAYOUT_XML);
            layout_part.rels_mut().get_or_add(rt::SLIDE_MASTER, &master);

            pkg.add_part(main);
            pkg.add_part(master_part);
            pkg.add_part(layout_part);
            pkg.add_part(Part::new(theme, ct::OFC_THEME, THEME_XML));
            pkg.relate_to(&presentation, rt::OFFICE_DOCUMENT);
        },
    }
    Ok(pkg)
}

fn uri(partname: &str) -> Result<PackURI> {
    PackURI::new(partname).map_err(|e| OpcError::InvalidPackUri(e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_part_matches_kind() {
        for kind in [DocumentKind::Word, DocumentKind::Excel, DocumentKind::PowerPoint] {
            let pkg = new_package(kind).unwrap();
            let main = pkg.main_document_part().unwrap();
            assert_eq!(DocumentKind::from_content_type(main.content_type()), Some(kind));
        }
    }

    #[test]
    fn test_presentation_theme_reachable_from_master() {
        let pkg = new_package(DocumentKind::PowerPoint).unwrap();
        let master = PackURI::new("/ppt/slideMasters/slideMaster1.xml").unwrap();
        let theme = pkg.related_partname(&master, rt::THEME).unwrap().unwrap();
        assert!(pkg.contains_part(&theme));
    }

    #[test]
    fn test_every_relationship_target_exists() {
        for kind in [DocumentKind::Word, DocumentKind::Excel, DocumentKind::PowerPoint] {
            let pkg = new_package(kind).unwrap();
            for part in pkg.iter_parts() {
                for rel in part.rels().iter() {
                    let target = part.rels().target_partname(rel).unwrap();
                    assert!(pkg.contains_part(&target), "{} -> {}", part.partname(), target);
                }
            }
        }
    }
}
