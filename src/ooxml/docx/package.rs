use crate::common::{Error, Result};
use crate::document::{Document, DocumentKind, OfficeDocument};
use crate::ooxml::parts::malformed;

/// A Word document.
///
/// # Examples
///
/// ```rust,no_run
/// use officekit::{Document, Word};
///
/// let doc = Word::open("document.docx")?;
/// println!("{}", doc.core_properties().title()?);
/// # Ok::<(), officekit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Word {
    office: OfficeDocument,
}

impl Word {
    /// XML of the main document part, as read.
    pub fn document_xml(&self) -> Result<&str> {
        self.office
            .main_part()?
            .xml_str()
            .map_err(|e| malformed("document", e))
    }
}

impl Document for Word {
    const KIND: DocumentKind = DocumentKind::Word;

    fn office(&self) -> &OfficeDocument {
        &self.office
    }

    fn office_mut(&mut self) -> &mut OfficeDocument {
        &mut self.office
    }

    fn from_office(office: OfficeDocument) -> Result<Self> {
        if office.kind() != Self::KIND {
            return Err(Error::UnsupportedFormat(format!(
                "expected a Word document, found {}",
                office.kind()
            )));
        }
        Ok(Self { office })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ThemeColor, ThemeSlot};
    use crate::ooxml::opc::error::{OpcError, Result as OpcResult};
    use crate::ooxml::opc::{OoxmlGateway, OpcPackage, PackageGateway};
    use crate::{Excel, PowerPoint};
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn test_new_document_round_trip() {
        let mut doc = Word::new().unwrap();
        let props = doc.core_properties_mut();
        props.set_title("Minutes").unwrap();
        props.set_creator("J. Doe").unwrap();
        props.set_tags(["board", "2024"]).unwrap();

        let reopened = Word::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        let props = reopened.core_properties();
        assert_eq!(props.title().unwrap(), "Minutes");
        assert_eq!(props.creator().unwrap(), "J. Doe");
        assert_eq!(props.tags().unwrap(), vec!["board", "2024"]);
        assert_eq!(props.subject().unwrap(), "");
        assert_eq!(reopened.office().created(), doc.office().created());
        assert!(reopened.document_xml().unwrap().contains("<w:body>"));
    }

    #[test]
    fn test_tags_with_separators_round_trip() {
        let mut doc = Word::new().unwrap();
        doc.core_properties_mut()
            .set_tags(["a, b", "", " spaced "])
            .unwrap();

        let reopened = Word::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            reopened.core_properties().tags().unwrap(),
            vec!["a, b", "", " spaced "]
        );
        // Saving a reopened document keeps the record.
        let bytes = reopened.to_bytes().unwrap();
        let again = Word::from_bytes(&bytes).unwrap();
        assert_eq!(
            again.core_properties().tags().unwrap(),
            vec!["a, b", "", " spaced "]
        );
    }

    #[test]
    fn test_save_as_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minutes.docx");

        let mut doc = Word::create(Some(path.as_path()), None).unwrap();
        doc.core_properties_mut().set_subject("Agenda").unwrap();
        doc.theme_mut()
            .set_color(ThemeSlot::Hyperlink, ThemeColor::rgb(0, 0, 0xEE))
            .unwrap();
        doc.save_as(&path).unwrap();

        let reopened = Word::create(Some(path.as_path()), None).unwrap();
        assert_eq!(reopened.core_properties().subject().unwrap(), "Agenda");
        assert_eq!(
            reopened.theme().unwrap().color(ThemeSlot::Hyperlink).unwrap(),
            ThemeColor::rgb(0, 0, 0xEE)
        );
    }

    #[test]
    fn test_save_is_idempotent() {
        let mut doc = Word::new().unwrap();
        doc.core_properties_mut().set_description("draft").unwrap();
        let first = doc.to_bytes().unwrap();
        assert_eq!(doc.to_bytes().unwrap(), first);

        let reopened = Word::from_bytes(&first).unwrap();
        assert_eq!(reopened.to_bytes().unwrap(), first);
    }

    #[test]
    fn test_buffer_takes_precedence_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("on-disk.docx");
        let mut on_disk = Word::new().unwrap();
        on_disk.core_properties_mut().set_title("disk").unwrap();
        on_disk.save_as(&path).unwrap();

        let mut in_memory = Word::new().unwrap();
        in_memory.core_properties_mut().set_title("buffer").unwrap();
        let bytes = in_memory.to_bytes().unwrap();

        let doc = Word::create(Some(path.as_path()), Some(bytes.as_slice())).unwrap();
        assert_eq!(doc.core_properties().title().unwrap(), "buffer");
        // An empty buffer falls back to the file.
        let doc = Word::create(Some(path.as_path()), Some(&[][..])).unwrap();
        assert_eq!(doc.core_properties().title().unwrap(), "disk");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Word::open(dir.path().join("absent.docx")).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_wrong_kind_is_unsupported() {
        let workbook = Excel::new().unwrap().to_bytes().unwrap();
        assert!(matches!(Word::from_bytes(&workbook), Err(Error::UnsupportedFormat(_))));

        let deck = PowerPoint::new().unwrap().to_bytes().unwrap();
        assert!(matches!(Word::from_bytes(&deck), Err(Error::UnsupportedFormat(_))));

        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        assert!(matches!(Word::from_bytes(&ole), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupt_zip_is_malformed() {
        let mut bytes = Word::new().unwrap().to_bytes().unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(Word::from_bytes(&bytes), Err(Error::MalformedBuffer(_))));
    }

    /// Writes part of the package, then fails.
    struct FailingGateway;

    impl PackageGateway for FailingGateway {
        fn decode_package(&self, bytes: &[u8]) -> OpcResult<OpcPackage> {
            OoxmlGateway::default().decode_package(bytes)
        }

        fn encode_package(&self, _package: &OpcPackage, sink: &mut dyn Write) -> OpcResult<()> {
            sink.write_all(b"PK\x03\x04 partial")?;
            Err(OpcError::WriteError("disk full".to_string()))
        }
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept.docx");
        let mut doc = Word::new().unwrap();
        doc.core_properties_mut().set_title("v1").unwrap();
        doc.save_as(&path).unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut failing = Word::open_with(Arc::new(FailingGateway), &path).unwrap();
        failing.core_properties_mut().set_title("v2").unwrap();
        assert!(matches!(failing.save_as(&path), Err(Error::Io(_))));

        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(failing.core_properties().title().unwrap(), "v2");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
