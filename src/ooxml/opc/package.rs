//! In-memory model of an OPC package.

use std::collections::BTreeMap;

use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::rel::Relationships;

/// Every part of a package plus the package-level relationships.
///
/// Parts are kept in part-name order so a package serializes the same way
/// every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcPackage {
    rels: Relationships,
    parts: BTreeMap<PackURI, Part>,
}

impl OpcPackage {
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI),
            parts: BTreeMap::new(),
        }
    }

    pub fn from_parts(rels: Relationships, parts: impl IntoIterator<Item = Part>) -> Self {
        Self {
            rels,
            parts: parts
                .into_iter()
                .map(|part| (part.partname().clone(), part))
                .collect(),
        }
    }

    /// Package-level relationships (`/_rels/.rels`).
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    pub fn part(&self, partname: &PackURI) -> Option<&Part> {
        self.parts.get(partname)
    }

    pub fn part_mut(&mut self, partname: &PackURI) -> Option<&mut Part> {
        self.parts.get_mut(partname)
    }

    /// Add a part, replacing any part with the same name.
    pub fn add_part(&mut self, part: Part) -> Option<Part> {
        self.parts.insert(part.partname().clone(), part)
    }

    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Part> {
        self.parts.remove(partname)
    }

    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Relate the package to a part, returning the rId.
    pub fn relate_to(&mut self, partname: &PackURI, reltype: &str) -> String {
        self.rels.get_or_add(reltype, partname)
    }

    /// The part the package's `officeDocument` relationship points at.
    pub fn main_document_part(&self) -> Result<&Part> {
        let partname = self
            .rels
            .part_with_reltype(rt::OFFICE_DOCUMENT)?
            .ok_or_else(|| OpcError::PartNotFound("main document relationship".to_string()))?;
        self.parts
            .get(&partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Name of the part `source` relates to with `reltype`, if any.
    pub fn related_partname(&self, source: &PackURI, reltype: &str) -> Result<Option<PackURI>> {
        let rels = if source.as_str() == PACKAGE_URI {
            &self.rels
        } else {
            self.parts
                .get(source)
                .ok_or_else(|| OpcError::PartNotFound(source.to_string()))?
                .rels()
        };
        rels.part_with_reltype(reltype)
    }

    /// First unused part name for a template with a `%d` placeholder,
    /// e.g. `/xl/worksheets/sheet%d.xml`.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        (1..=u16::MAX as u32)
            .map(|n| template.replace("%d", &n.to_string()))
            .find_map(|candidate| {
                PackURI::new(candidate)
                    .ok()
                    .filter(|uri| !self.parts.contains_key(uri))
            })
            .ok_or_else(|| OpcError::InvalidPackUri(format!("no free part name for {}", template)))
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;

    fn workbook_package() -> OpcPackage {
        let mut pkg = OpcPackage::new();
        let workbook = PackURI::new("/xl/workbook.xml").unwrap();
        pkg.add_part(Part::new(workbook.clone(), ct::SML_SHEET_MAIN, &b"<workbook/>"[..]));
        pkg.relate_to(&workbook, rt::OFFICE_DOCUMENT);
        pkg
    }

    #[test]
    fn test_main_document_part() {
        let pkg = workbook_package();
        let main = pkg.main_document_part().unwrap();
        assert_eq!(main.content_type(), ct::SML_SHEET_MAIN);
        assert_eq!(main.partname().as_str(), "/xl/workbook.xml");
    }

    #[test]
    fn test_missing_main_part() {
        let pkg = OpcPackage::new();
        assert!(matches!(
            pkg.main_document_part(),
            Err(OpcError::PartNotFound(_))
        ));
    }

    #[test]
    fn test_next_partname() {
        let mut pkg = workbook_package();
        let first = pkg.next_partname("/xl/worksheets/sheet%d.xml").unwrap();
        assert_eq!(first.as_str(), "/xl/worksheets/sheet1.xml");
        pkg.add_part(Part::new(first, ct::SML_WORKSHEET, Vec::<u8>::new()));
        let second = pkg.next_partname("/xl/worksheets/sheet%d.xml").unwrap();
        assert_eq!(second.as_str(), "/xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_related_partname() {
        let pkg = workbook_package();
        let root = PackURI::new(PACKAGE_URI).unwrap();
        let main = pkg
            .related_partname(&root, rt::OFFICE_DOCUMENT)
            .unwrap()
            .unwrap();
        assert_eq!(main.as_str(), "/xl/workbook.xml");
        assert!(pkg.related_partname(&main, rt::THEME).unwrap().is_none());
    }
}
