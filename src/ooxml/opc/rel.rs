//! Relationships between parts of an OPC package.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;

const TARGET_MODE_EXTERNAL: &str = "External";

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference, relative to the source or an external URL
    target_ref: String,

    /// Whether the target lives outside the package
    is_external: bool,
}

impl Relationship {
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }
}

/// The relationships of one source part, keyed by rId.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationships {
    /// Directory of the source part, used to resolve targets
    base_uri: String,

    rels: BTreeMap<String, Relationship>,
}

impl Relationships {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: BTreeMap::new(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Insert a relationship under an explicit rId, replacing any previous one.
    pub fn add_relationship(
        &mut self,
        r_id: impl Into<String>,
        reltype: impl Into<String>,
        target_ref: impl Into<String>,
        is_external: bool,
    ) {
        let r_id = r_id.into();
        self.rels.insert(
            r_id.clone(),
            Relationship {
                r_id,
                reltype: reltype.into(),
                target_ref: target_ref.into(),
                is_external,
            },
        );
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Return the rId of an internal relationship of `reltype` to `target`,
    /// adding one with the next free rId if none exists.
    pub fn get_or_add(&mut self, reltype: &str, target: &PackURI) -> String {
        let target_ref = target.relative_ref(&self.base_uri);
        if let Some(rel) = self
            .rels
            .values()
            .find(|r| !r.is_external && r.reltype == reltype && r.target_ref == target_ref)
        {
            return rel.r_id.clone();
        }

        let r_id = self.next_r_id();
        self.add_relationship(r_id.clone(), reltype, target_ref, false);
        r_id
    }

    /// Lowest unused `rId<N>`, starting from 1.
    pub fn next_r_id(&self) -> String {
        (1..)
            .map(|n| format!("rId{}", n))
            .find(|candidate| !self.rels.contains_key(candidate))
            .unwrap_or_default()
    }

    /// First internal relationship of `reltype`, in rId order.
    pub fn first_with_reltype(&self, reltype: &str) -> Option<&Relationship> {
        self.rels
            .values()
            .find(|r| !r.is_external && r.reltype == reltype)
    }

    /// Resolve the target of an internal relationship to a part name.
    pub fn target_partname(&self, rel: &Relationship) -> Result<PackURI> {
        if rel.is_external {
            return Err(OpcError::InvalidPackUri(format!(
                "relationship {} points outside the package",
                rel.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &rel.target_ref).map_err(OpcError::InvalidPackUri)
    }

    /// Resolved target of the first internal relationship of `reltype`.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<Option<PackURI>> {
        self.first_with_reltype(reltype)
            .map(|rel| self.target_partname(rel))
            .transpose()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    pub fn len(&self) -> usize {
        self.rels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.remove(r_id)
    }

    /// Parse a `.rels` part.
    pub fn from_xml(base_uri: impl Into<String>, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target_ref = None;
                    let mut is_external = false;

                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                            b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                            b"Target" => target_ref = Some(attr.unescape_value()?.to_string()),
                            b"TargetMode" => {
                                is_external = attr.unescape_value()? == TARGET_MODE_EXTERNAL
                            },
                            _ => {},
                        }
                    }

                    match (r_id, reltype, target_ref) {
                        (Some(id), Some(rt), Some(tr)) => {
                            rels.add_relationship(id, rt, tr, is_external)
                        },
                        _ => {
                            tracing::warn!("skipping relationship with missing attributes");
                        },
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Serialize as a `.rels` part, ordered by rId.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.rels.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<Relationships xmlns="{}">"#,
            namespace::OPC_RELATIONSHIPS
        ));

        for rel in self.rels.values() {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(rel.r_id.as_str()),
                escape(rel.reltype.as_str()),
                escape(rel.target_ref.as_str())
            ));
            if rel.is_external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_r_id_fills_gaps() {
        let mut rels = Relationships::new("/xl");
        assert_eq!(rels.next_r_id(), "rId1");
        rels.add_relationship("rId1", "t", "a.xml", false);
        rels.add_relationship("rId3", "t", "c.xml", false);
        assert_eq!(rels.next_r_id(), "rId2");
    }

    #[test]
    fn test_get_or_add_reuses_existing() {
        let mut rels = Relationships::new("/xl");
        let target = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        let first = rels.get_or_add("worksheet", &target);
        let second = rels.get_or_add("worksheet", &target);
        assert_eq!(first, second);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels.get(&first).unwrap().target_ref(), "worksheets/sheet1.xml");
    }

    #[test]
    fn test_xml_round_trip() {
        let mut rels = Relationships::new("/word");
        rels.add_relationship("rId2", "styles", "styles.xml", false);
        rels.add_relationship("rId1", "hyperlink", "https://example.com/?a=1&b=2", true);

        let xml = rels.to_xml();
        assert!(xml.find("rId1").unwrap() < xml.find("rId2").unwrap());
        assert!(xml.contains("a=1&amp;b=2"));

        let parsed = Relationships::from_xml("/word", xml.as_bytes()).unwrap();
        assert_eq!(parsed, rels);
        assert!(parsed.get("rId1").unwrap().is_external());
    }

    #[test]
    fn test_part_with_reltype_resolves_target() {
        let mut rels = Relationships::new("/ppt/slideMasters");
        rels.add_relationship("rId1", "theme", "../theme/theme1.xml", false);
        let target = rels.part_with_reltype("theme").unwrap().unwrap();
        assert_eq!(target.as_str(), "/ppt/theme/theme1.xml");
        assert!(rels.part_with_reltype("missing").unwrap().is_none());
    }
}
