use crate::common::{Error, Result};
use crate::document::{Document, DocumentKind, OfficeDocument};
use crate::ooxml::opc::constants::content_type as ct;

/// A PowerPoint presentation.
#[derive(Debug, Clone)]
pub struct PowerPoint {
    office: OfficeDocument,
}

impl PowerPoint {
    /// Number of slide parts in the package.
    pub fn slide_count(&self) -> usize {
        self.parts_of_type(ct::PML_SLIDE)
    }

    pub fn slide_master_count(&self) -> usize {
        self.parts_of_type(ct::PML_SLIDE_MASTER)
    }

    fn parts_of_type(&self, content_type: &str) -> usize {
        self.office
            .package()
            .iter_parts()
            .filter(|part| part.content_type() == content_type)
            .count()
    }
}

impl Document for PowerPoint {
    const KIND: DocumentKind = DocumentKind::PowerPoint;

    fn office(&self) -> &OfficeDocument {
        &self.office
    }

    fn office_mut(&mut self) -> &mut OfficeDocument {
        &mut self.office
    }

    fn from_office(office: OfficeDocument) -> Result<Self> {
        if office.kind() != Self::KIND {
            return Err(Error::UnsupportedFormat(format!(
                "expected a PowerPoint presentation, found {}",
                office.kind()
            )));
        }
        Ok(Self { office })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Word;
    use crate::models::{ThemeColor, ThemeSlot};
    use crate::ooxml::opc::constants::relationship_type as rt;
    use crate::ooxml::opc::{OoxmlGateway, PackURI, PackageGateway};

    #[test]
    fn test_new_presentation() {
        let deck = PowerPoint::new().unwrap();
        assert_eq!(deck.slide_count(), 0);
        assert_eq!(deck.slide_master_count(), 1);
        let palette = deck.theme().expect("template has a theme");
        assert_eq!(
            palette.color(ThemeSlot::Accent6).unwrap(),
            ThemeSlot::Accent6.default_color()
        );
    }

    #[test]
    fn test_theme_written_to_master_theme() {
        let mut deck = PowerPoint::new().unwrap();
        deck.theme_mut()
            .set_color(ThemeSlot::Accent1, ThemeColor::rgb(0xC0, 0x00, 0x00))
            .unwrap();
        deck.core_properties_mut().set_category("Sales").unwrap();

        let package = deck.to_package().unwrap();
        let master = package
            .related_partname(deck.office().main_partname(), rt::SLIDE_MASTER)
            .unwrap()
            .unwrap();
        let theme = package.related_partname(&master, rt::THEME).unwrap().unwrap();
        let xml = package.part(&theme).unwrap().xml_str().unwrap();
        assert!(xml.contains(r#"<a:srgbClr val="C00000"/>"#));
        // No second theme part is added.
        assert_eq!(
            package
                .iter_parts()
                .filter(|p| p.content_type() == ct::OFC_THEME)
                .count(),
            1
        );

        let reopened = PowerPoint::from_bytes(&deck.to_bytes().unwrap()).unwrap();
        assert_eq!(
            reopened.theme().unwrap().color(ThemeSlot::Accent1).unwrap(),
            ThemeColor::rgb(0xC0, 0x00, 0x00)
        );
        assert_eq!(reopened.core_properties().category().unwrap(), "Sales");
    }

    #[test]
    fn test_untouched_theme_survives_save() {
        let mut package = PowerPoint::new().unwrap().to_package().unwrap();
        let theme = PackURI::new("/ppt/theme/theme1.xml").unwrap();
        let part = package.part_mut(&theme).unwrap();
        let xml = part.xml_str().unwrap().replace(
            r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1>"#,
            r#"<a:accent1><a:hslClr hue="0" sat="100%" lum="50%"/></a:accent1>"#,
        );
        part.set_blob(xml);
        let original = package.part(&theme).unwrap().blob().clone();

        let mut bytes = Vec::new();
        OoxmlGateway::default()
            .encode_package(&package, &mut bytes)
            .unwrap();
        let mut deck = PowerPoint::from_bytes(&bytes).unwrap();

        let saved = deck.to_package().unwrap();
        assert_eq!(saved.part(&theme).unwrap().blob(), &original);

        // Editing another slot leaves the non-RGB slot and sysClr alone.
        deck.theme_mut()
            .set_color(ThemeSlot::Accent3, ThemeColor::rgb(1, 2, 3))
            .unwrap();
        let saved = deck.to_package().unwrap();
        let xml = saved.part(&theme).unwrap().xml_str().unwrap().to_string();
        assert!(xml.contains(r#"<a:accent1><a:hslClr hue="0" sat="100%" lum="50%"/></a:accent1>"#));
        assert!(xml.contains(r#"<a:sysClr val="windowText" lastClr="000000"/>"#));
        assert!(xml.contains(r#"<a:accent3><a:srgbClr val="010203"/></a:accent3>"#));
    }

    #[test]
    fn test_document_bytes_are_not_a_presentation() {
        let bytes = Word::new().unwrap().to_bytes().unwrap();
        assert!(matches!(
            PowerPoint::from_bytes(&bytes),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
