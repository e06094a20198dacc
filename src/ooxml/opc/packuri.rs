/// Part names inside an OPC package.
///
/// A part name always starts with a forward slash and uses forward slashes
/// as separators. The ZIP member name is the same string without the
/// leading slash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/xl/workbook.xml")
    uri: String,
}

/// The package pseudo-partname, source of package-level relationships
pub const PACKAGE_URI: &str = "/";

/// Part name of the content types item
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// # Arguments
    /// * `uri` - The URI string, which must begin with a forward slash
    ///
    /// # Returns
    /// * `Err` if the URI does not start with a forward slash
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// The part name stored under a ZIP member name.
    pub fn from_membername(name: &str) -> Result<Self, String> {
        Self::new(format!("/{}", name.trim_start_matches('/')))
    }

    /// Resolve a relationship target against the directory of its source.
    ///
    /// `("/xl", "worksheets/sheet1.xml")` gives `/xl/worksheets/sheet1.xml`;
    /// `("/ppt/slides", "../theme/theme1.xml")` gives `/ppt/theme/theme1.xml`.
    /// Absolute targets ignore the base.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };

        let mut segments: Vec<&str> = Vec::new();
        for segment in joined.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    if segments.pop().is_none() {
                        return Err(format!(
                            "'{}' escapes the package root from '{}'",
                            relative_ref, base_uri
                        ));
                    }
                },
                name => segments.push(name),
            }
        }
        Self::new(format!("/{}", segments.join("/")))
    }

    /// Directory portion, e.g. "/xl/worksheets" for "/xl/worksheets/sheet1.xml".
    /// The package pseudo-partname and top-level parts give "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Last path segment, e.g. "sheet1.xml". Empty for "/".
    pub fn filename(&self) -> &str {
        self.uri
            .rfind('/')
            .map(|pos| &self.uri[pos + 1..])
            .unwrap_or("")
    }

    /// Extension without the period, e.g. "xml".
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        filename
            .rfind('.')
            .map(|pos| &filename[pos + 1..])
            .unwrap_or("")
    }

    /// The ZIP member name (URI with the leading slash stripped).
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part, as stored in a
    /// relationship `Target`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == PACKAGE_URI {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments = vec![".."; from.len() - common];
        segments.extend(&to[common..]);
        segments.join("/")
    }

    /// The part holding this part's relationships,
    /// e.g. "/xl/_rels/workbook.xml.rels".
    pub fn rels_uri(&self) -> PackURI {
        let rels = format!("_rels/{}.rels", self.filename());
        let uri = match self.base_uri() {
            PACKAGE_URI => format!("/{}", rels),
            base => format!("{}/{}", base, rels),
        };
        PackURI { uri }
    }

    /// Whether this is a relationships part.
    pub fn is_rels(&self) -> bool {
        self.ext().eq_ignore_ascii_case("rels") && self.base_uri().ends_with("_rels")
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let uri = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        assert_eq!(uri.base_uri(), "/xl/worksheets");
        assert_eq!(uri.filename(), "sheet1.xml");
        assert_eq!(uri.ext(), "xml");
        assert_eq!(uri.membername(), "xl/worksheets/sheet1.xml");
        assert!(PackURI::new("xl/workbook.xml").is_err());
    }

    #[test]
    fn test_package_root() {
        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
        assert_eq!(root.rels_uri().as_str(), "/_rels/.rels");
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackURI::from_rel_ref("/ppt/slideMasters", "../theme/theme1.xml").unwrap();
        assert_eq!(uri.as_str(), "/ppt/theme/theme1.xml");
        let uri = PackURI::from_rel_ref("/", "word/document.xml").unwrap();
        assert_eq!(uri.as_str(), "/word/document.xml");
        let uri = PackURI::from_rel_ref("/xl", "/xl/styles.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/styles.xml");
        assert!(PackURI::from_rel_ref("/", "../../evil.xml").is_err());
    }

    #[test]
    fn test_relative_ref_round_trips() {
        let target = PackURI::new("/ppt/theme/theme1.xml").unwrap();
        let rel = target.relative_ref("/ppt/slideMasters");
        assert_eq!(rel, "../theme/theme1.xml");
        assert_eq!(
            PackURI::from_rel_ref("/ppt/slideMasters", &rel).unwrap(),
            target
        );
        assert_eq!(target.relative_ref("/"), "ppt/theme/theme1.xml");
    }

    #[test]
    fn test_rels_uri() {
        let uri = PackURI::new("/xl/workbook.xml").unwrap();
        let rels = uri.rels_uri();
        assert_eq!(rels.as_str(), "/xl/_rels/workbook.xml.rels");
        assert!(rels.is_rels());
        assert!(!uri.is_rels());
    }
}
