//! Serializes an [`OpcPackage`] into ZIP bytes.

use std::collections::BTreeMap;

use quick_xml::escape::escape;

use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::{Compression, PhysPkgWriter};

/// Writes `[Content_Types].xml`, the package relationships, then every part
/// in part-name order, each followed by its own relationships.
///
/// The same package always produces the same bytes.
pub struct PackageWriter;

impl PackageWriter {
    pub fn to_bytes(package: &OpcPackage, compression: Compression) -> Result<Vec<u8>> {
        let mut phys_writer = PhysPkgWriter::new(compression);

        let content_types_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        let cti = ContentTypesItem::from_package(package);
        phys_writer.write(&content_types_uri, cti.to_xml().as_bytes())?;

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        phys_writer.write(&package_uri.rels_uri(), package.rels().to_xml().as_bytes())?;

        for part in package.iter_parts() {
            phys_writer.write(part.partname(), part.blob())?;
            if !part.rels().is_empty() {
                phys_writer.write(&part.partname().rels_uri(), part.rels().to_xml().as_bytes())?;
            }
        }

        phys_writer.finish()
    }
}

/// Default and Override entries for `[Content_Types].xml`.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    fn from_package(package: &OpcPackage) -> Self {
        let mut cti = Self::new();
        for part in package.iter_parts() {
            cti.add_content_type(part.partname(), part.content_type());
        }
        cti
    }

    /// Well-known extension/content-type pairs go into a Default entry,
    /// everything else gets an Override.
    fn add_content_type(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext().to_ascii_lowercase();
        if Self::is_default_content_type(&ext, content_type) {
            self.defaults.insert(ext, content_type.to_string());
        } else {
            self.overrides
                .insert(partname.to_string(), content_type.to_string());
        }
    }

    fn is_default_content_type(ext: &str, content_type: &str) -> bool {
        matches!(
            (ext, content_type),
            ("rels", ct::OPC_RELATIONSHIPS)
                | ("xml", ct::XML)
                | ("png", "image/png")
                | ("jpg", "image/jpeg")
                | ("jpeg", "image/jpeg")
                | ("gif", "image/gif")
                | ("emf", "image/x-emf")
                | ("wmf", "image/x-wmf")
        )
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES));

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext.as_str()),
                escape(content_type.as_str())
            ));
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(partname.as_str()),
                escape(content_type.as_str())
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;
    use crate::ooxml::opc::part::Part;
    use crate::ooxml::opc::pkgreader::PackageReader;

    fn sample_package() -> OpcPackage {
        let mut pkg = OpcPackage::new();
        let document = PackURI::new("/word/document.xml").unwrap();
        let mut part = Part::new(document.clone(), ct::WML_DOCUMENT_MAIN, &b"<w:document/>"[..]);
        let styles = PackURI::new("/word/styles.xml").unwrap();
        part.rels_mut().get_or_add(rt::STYLES, &styles);
        pkg.add_part(part);
        pkg.add_part(Part::new(styles, ct::WML_STYLES, &b"<w:styles/>"[..]));
        pkg.add_part(Part::new(
            PackURI::new("/media/logo.png").unwrap(),
            "image/png",
            &b"\x89PNG"[..],
        ));
        pkg.relate_to(&document, rt::OFFICE_DOCUMENT);
        pkg
    }

    #[test]
    fn test_content_types_xml() {
        let cti = ContentTypesItem::from_package(&sample_package());
        let xml = cti.to_xml();
        assert!(xml.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert!(xml.contains(r#"<Override PartName="/word/document.xml""#));
        assert!(xml.contains(r#"<Override PartName="/word/styles.xml""#));
    }

    #[test]
    fn test_write_then_read() {
        let pkg = sample_package();
        let bytes = PackageWriter::to_bytes(&pkg, Compression::Deflated).unwrap();
        let reread = PackageReader::read(&bytes).unwrap();
        assert_eq!(reread, pkg);
    }

    #[test]
    fn test_serialization_is_stable() {
        let pkg = sample_package();
        let first = PackageWriter::to_bytes(&pkg, Compression::Stored).unwrap();
        let reread = PackageReader::read(&first).unwrap();
        let second = PackageWriter::to_bytes(&reread, Compression::Stored).unwrap();
        assert_eq!(first, second);
    }
}
