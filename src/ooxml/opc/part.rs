//! Parts: the named, typed blobs an OPC package is made of.

use bytes::Bytes;

use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;

/// One part of a package together with its outgoing relationships.
///
/// The content is kept as loaded; parts this crate does not interpret are
/// written back byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    partname: PackURI,
    content_type: String,
    blob: Bytes,
    rels: Relationships,
}

impl Part {
    pub fn new(partname: PackURI, content_type: impl Into<String>, blob: impl Into<Bytes>) -> Self {
        let rels = Relationships::new(partname.base_uri());
        Self {
            partname,
            content_type: content_type.into(),
            blob: blob.into(),
            rels,
        }
    }

    /// A part loaded from a package, with the relationships read from its
    /// `.rels` part.
    pub fn load(
        partname: PackURI,
        content_type: impl Into<String>,
        blob: impl Into<Bytes>,
        rels: Relationships,
    ) -> Self {
        Self {
            partname,
            content_type: content_type.into(),
            blob: blob.into(),
            rels,
        }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn blob(&self) -> &Bytes {
        &self.blob
    }

    pub fn set_blob(&mut self, blob: impl Into<Bytes>) {
        self.blob = blob.into();
    }

    /// The content as UTF-8 text, for XML parts.
    pub fn xml_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.blob)
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_resolve_from_part_directory() {
        let mut part = Part::new(
            PackURI::new("/xl/workbook.xml").unwrap(),
            "application/xml",
            &b"<workbook/>"[..],
        );
        let sheet = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        let r_id = part.rels_mut().get_or_add("worksheet", &sheet);

        let rel = part.rels().get(&r_id).unwrap();
        assert_eq!(rel.target_ref(), "worksheets/sheet1.xml");
        assert_eq!(part.rels().target_partname(rel).unwrap(), sheet);
        assert_eq!(part.xml_str().unwrap(), "<workbook/>");
    }
}
