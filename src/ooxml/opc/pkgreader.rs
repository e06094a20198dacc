//! Turns the bytes of a serialized package into an [`OpcPackage`].

use std::collections::{BTreeMap, HashMap};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::rel::Relationships;

/// Content type lookup built from `[Content_Types].xml`.
///
/// Overrides win over extension defaults; extensions compare
/// case-insensitively.
#[derive(Debug, Default)]
struct ContentTypeMap {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let entry = match e.local_name().as_ref() {
                        b"Default" => Some((&b"Extension"[..], true)),
                        b"Override" => Some((&b"PartName"[..], false)),
                        _ => None,
                    };

                    if let Some((key_attr, is_default)) = entry {
                        let mut key = None;
                        let mut content_type = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == key_attr {
                                key = Some(attr.unescape_value()?.to_string());
                            } else if attr.key.as_ref() == b"ContentType" {
                                content_type = Some(attr.unescape_value()?.to_string());
                            }
                        }

                        if let (Some(key), Some(content_type)) = (key, content_type) {
                            if is_default {
                                map.defaults.insert(key.to_ascii_lowercase(), content_type);
                            } else {
                                map.overrides.insert(key, content_type);
                            }
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    fn get(&self, partname: &PackURI) -> Option<&str> {
        self.overrides
            .get(partname.as_str())
            .or_else(|| self.defaults.get(&partname.ext().to_ascii_lowercase()))
            .map(String::as_str)
    }
}

/// Reads a whole package into memory.
///
/// Every member becomes a part, reachable or not, so that a save writes
/// back everything that was read.
pub struct PackageReader;

impl PackageReader {
    pub fn read(data: &[u8]) -> Result<OpcPackage> {
        let mut phys = PhysPkgReader::new(data)?;
        let mut members = phys.read_all()?;

        let content_types_name = CONTENT_TYPES_URI.trim_start_matches('/');
        let content_types_xml = members
            .remove(content_types_name)
            .ok_or_else(|| OpcError::PartNotFound(content_types_name.to_string()))?;
        let content_types = ContentTypeMap::from_xml(&content_types_xml)?;

        let mut rels_by_member = BTreeMap::new();
        let mut blobs = Vec::with_capacity(members.len());
        for (name, data) in members {
            let partname = PackURI::from_membername(&name).map_err(OpcError::InvalidPackUri)?;
            if partname.is_rels() {
                rels_by_member.insert(name, data);
            } else {
                blobs.push((partname, data));
            }
        }

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let pkg_rels = Self::load_rels(&mut rels_by_member, &package_uri)?
            .ok_or_else(|| OpcError::PartNotFound("_rels/.rels".to_string()))?;

        let mut parts = Vec::with_capacity(blobs.len());
        for (partname, blob) in blobs {
            let rels = Self::load_rels(&mut rels_by_member, &partname)?
                .unwrap_or_else(|| Relationships::new(partname.base_uri()));
            let content_type = match content_types.get(&partname) {
                Some(content_type) => content_type.to_string(),
                None => {
                    tracing::warn!("no content type declared for {}", partname);
                    ct::OCTET_STREAM.to_string()
                },
            };
            parts.push(Part::load(partname, content_type, blob, rels));
        }

        if !rels_by_member.is_empty() {
            tracing::warn!(
                orphans = rels_by_member.len(),
                "dropping relationship parts without a source part"
            );
        }

        tracing::debug!(parts = parts.len(), "loaded package");
        Ok(OpcPackage::from_parts(pkg_rels, parts))
    }

    fn load_rels(
        rels_by_member: &mut BTreeMap<String, Vec<u8>>,
        source: &PackURI,
    ) -> Result<Option<Relationships>> {
        let rels_uri = source.rels_uri();
        rels_by_member
            .remove(rels_uri.membername())
            .map(|xml| Relationships::from_xml(source.base_uri(), &xml))
            .transpose()
    }
}
