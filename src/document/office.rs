//! State shared by every document kind.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, warn};

use super::kind::DocumentKind;
use crate::common::{Error, Result};
use crate::models::{CoreProperties, PropertyModel, ThemePalette};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI, PackageGateway, Part};
use crate::ooxml::parts::core_xml::CorePart;
use crate::ooxml::parts::{malformed, template, theme_xml};

const CORE_PARTNAME: &str = "/docProps/core.xml";
const CORE_RECORD_PARTNAME: &str = "/docProps/customData/coreProperties.bin";

/// A package plus the parts of it every document kind interprets.
///
/// Core properties and the theme palette are decoded when the document is
/// opened and written back into a copy of the package on save. All other
/// parts are carried through as they were read.
#[derive(Clone)]
pub struct OfficeDocument {
    kind: DocumentKind,
    package: OpcPackage,
    main_part: PackURI,
    core: CoreProperties,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
    theme: Option<ThemePalette>,
    gateway: Arc<dyn PackageGateway>,
}

impl OfficeDocument {
    /// An empty document of `kind`, stamped with the current time.
    pub fn new(kind: DocumentKind, gateway: Arc<dyn PackageGateway>) -> Result<Self> {
        let package = template::new_package(kind)?;
        let mut doc = Self::from_package(kind, package, gateway)?;
        let now = Utc::now().trunc_subsecs(0);
        doc.created = Some(now);
        doc.modified = Some(now);
        debug!(%kind, "created new document");
        Ok(doc)
    }

    /// Interpret a decoded package as a document of `kind`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFormat`] if the package has no main document or
    /// its main document is of another kind; [`Error::MalformedBuffer`] if
    /// a part the document reads cannot be parsed.
    pub fn from_package(
        kind: DocumentKind,
        package: OpcPackage,
        gateway: Arc<dyn PackageGateway>,
    ) -> Result<Self> {
        let main_part = package
            .rels()
            .part_with_reltype(rt::OFFICE_DOCUMENT)?
            .ok_or_else(|| Error::UnsupportedFormat("package has no main document".to_string()))?;
        let content_type = package
            .part(&main_part)
            .ok_or_else(|| {
                Error::MalformedBuffer(format!("main document {} is missing", main_part))
            })?
            .content_type();
        match DocumentKind::from_content_type(content_type) {
            Some(found) if found == kind => {},
            Some(found) => {
                return Err(Error::UnsupportedFormat(format!(
                    "expected a {} document, found {}",
                    kind, found
                )));
            },
            None => {
                return Err(Error::UnsupportedFormat(format!(
                    "expected a {} document, found main part of type {}",
                    kind, content_type
                )));
            },
        }

        let core_xml = match core_partname(&package)?.and_then(|name| package.part(&name)) {
            Some(part) => Some(CorePart::parse(
                part.xml_str().map_err(|e| malformed("core properties", e))?,
            )?),
            None => None,
        };
        let (created, modified) = core_xml
            .as_ref()
            .map_or((None, None), |core| (core.created, core.modified));
        let core = match (read_core_record(&package)?, core_xml) {
            (Some(record), Some(core)) if !core.agrees_with(&record)? => {
                debug!("core properties part changed since the record was saved, using the part");
                core.properties
            },
            (Some(record), _) => record,
            (None, Some(core)) => core.properties,
            (None, None) => CoreProperties::new(),
        };

        let theme = match theme_partname(&package, kind, &main_part)?.and_then(|n| package.part(&n)) {
            Some(part) => Some(theme_xml::parse_palette(
                part.xml_str().map_err(|e| malformed("theme", e))?,
            )?),
            None => None,
        };

        debug!(%kind, parts = package.part_count(), main = %main_part, "opened document");
        Ok(Self {
            kind,
            package,
            main_part,
            core,
            created,
            modified,
            theme,
            gateway,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The package as read, without pending property or theme changes.
    pub fn package(&self) -> &OpcPackage {
        &self.package
    }

    pub(crate) fn package_mut(&mut self) -> &mut OpcPackage {
        &mut self.package
    }

    pub fn main_partname(&self) -> &PackURI {
        &self.main_part
    }

    /// The main document part as read.
    pub fn main_part(&self) -> Result<&Part> {
        self.package
            .part(&self.main_part)
            .ok_or_else(|| Error::NotFound(self.main_part.to_string()))
    }

    pub fn core_properties(&self) -> &CoreProperties {
        &self.core
    }

    pub fn core_properties_mut(&mut self) -> &mut CoreProperties {
        &mut self.core
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub fn set_modified(&mut self, modified: DateTime<Utc>) {
        self.modified = Some(modified);
    }

    /// Stamp the document as modified now.
    pub fn touch(&mut self) {
        self.modified = Some(Utc::now().trunc_subsecs(0));
    }

    /// The theme palette, if the document has a theme.
    pub fn theme(&self) -> Option<&ThemePalette> {
        self.theme.as_ref()
    }

    /// The theme palette, adding a default theme to documents without one.
    pub fn theme_mut(&mut self) -> &mut ThemePalette {
        self.theme.get_or_insert_with(ThemePalette::new)
    }

    pub fn gateway(&self) -> &Arc<dyn PackageGateway> {
        &self.gateway
    }

    /// A copy of the package with core properties and theme written back.
    ///
    /// The theme part is only rewritten when the palette has changes or the
    /// package has no theme yet.
    pub fn to_package(&self) -> Result<OpcPackage> {
        let mut package = self.package.clone();
        self.write_core(&mut package)?;
        self.write_core_record(&mut package)?;
        if let Some(palette) = &self.theme {
            self.write_theme(&mut package, palette)?;
        }
        Ok(package)
    }

    fn write_core(&self, package: &mut OpcPackage) -> Result<()> {
        let xml = CorePart {
            properties: self.core.clone(),
            created: self.created,
            modified: self.modified,
        }
        .to_xml()?;

        let partname = match core_partname(package)? {
            Some(name) => name,
            None => PackURI::new(CORE_PARTNAME).map_err(Error::MalformedBuffer)?,
        };
        match package.part_mut(&partname) {
            Some(part) => part.set_blob(xml),
            None => {
                package.add_part(Part::new(partname.clone(), ct::OPC_CORE_PROPERTIES, xml));
            },
        }
        package.relate_to(&partname, rt::CORE_PROPERTIES);
        Ok(())
    }

    /// The core properties record as encoded, so fields the XML part cannot
    /// hold exactly (such as tags containing separators) survive a reopen.
    fn write_core_record(&self, package: &mut OpcPackage) -> Result<()> {
        let existing = package.rels().part_with_reltype(rt::CORE_PROPERTIES_RECORD)?;
        if self.core.table().is_empty() {
            if let Some(name) = existing {
                package.remove_part(&name);
                if let Some(r_id) = package
                    .rels()
                    .first_with_reltype(rt::CORE_PROPERTIES_RECORD)
                    .map(|rel| rel.r_id().to_string())
                {
                    package.rels_mut().remove(&r_id);
                }
            }
            return Ok(());
        }

        let partname = match existing {
            Some(name) => name,
            None => PackURI::new(CORE_RECORD_PARTNAME).map_err(Error::MalformedBuffer)?,
        };
        let bytes = self.core.to_bytes()?;
        match package.part_mut(&partname) {
            Some(part) => part.set_blob(bytes),
            None => {
                package.add_part(Part::new(partname.clone(), ct::CORE_PROPERTIES_BIN, bytes));
            },
        }
        package.relate_to(&partname, rt::CORE_PROPERTIES_RECORD);
        Ok(())
    }

    fn write_theme(&self, package: &mut OpcPackage, palette: &ThemePalette) -> Result<()> {
        let partname = match theme_partname(package, self.kind, &self.main_part)?
            .filter(|name| package.contains_part(name))
        {
            Some(_) if !palette.has_changes() => return Ok(()),
            Some(name) => name,
            None => {
                let name = PackURI::new(self.kind.default_theme_partname())
                    .map_err(Error::MalformedBuffer)?;
                package.add_part(Part::new(name.clone(), ct::OFC_THEME, template::THEME_XML));
                if let Some(main) = package.part_mut(&self.main_part) {
                    main.rels_mut().get_or_add(rt::THEME, &name);
                }
                debug!(partname = %name, "added theme part");
                name
            },
        };

        let Some(part) = package.part_mut(&partname) else {
            return Err(Error::NotFound(partname.to_string()));
        };
        let xml = theme_xml::apply_palette(
            part.xml_str().map_err(|e| malformed("theme", e))?,
            palette,
        )?;
        part.set_blob(xml);
        Ok(())
    }
}

impl std::fmt::Debug for OfficeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfficeDocument")
            .field("kind", &self.kind)
            .field("main_part", &self.main_part)
            .field("parts", &self.package.part_count())
            .field("created", &self.created)
            .field("modified", &self.modified)
            .field("has_theme", &self.theme.is_some())
            .finish_non_exhaustive()
    }
}

fn core_partname(package: &OpcPackage) -> Result<Option<PackURI>> {
    let name = package.rels().part_with_reltype(rt::CORE_PROPERTIES)?;
    if let Some(name) = &name
        && !package.contains_part(name)
    {
        warn!(partname = %name, "core properties relationship points at a missing part");
    }
    Ok(name)
}

/// The encoded core properties record related from the package, if any.
fn read_core_record(package: &OpcPackage) -> Result<Option<CoreProperties>> {
    let Some(partname) = package.rels().part_with_reltype(rt::CORE_PROPERTIES_RECORD)? else {
        return Ok(None);
    };
    match package.part(&partname) {
        Some(part) => Ok(Some(CoreProperties::from_bytes(part.blob().clone())?)),
        None => {
            warn!(partname = %partname, "core properties record relationship points at a missing part");
            Ok(None)
        },
    }
}

/// The theme part the document's colours come from. Presentations take it
/// from their first slide master.
fn theme_partname(
    package: &OpcPackage,
    kind: DocumentKind,
    main_part: &PackURI,
) -> Result<Option<PackURI>> {
    if kind == DocumentKind::PowerPoint
        && let Some(master) = package.related_partname(main_part, rt::SLIDE_MASTER)?
        && package.contains_part(&master)
        && let Some(theme) = package.related_partname(&master, rt::THEME)?
    {
        return Ok(Some(theme));
    }
    Ok(package.related_partname(main_part, rt::THEME)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ThemeColor, ThemeSlot};
    use crate::ooxml::opc::OoxmlGateway;

    fn gateway() -> Arc<dyn PackageGateway> {
        Arc::new(OoxmlGateway::default())
    }

    #[test]
    fn test_new_document_is_stamped() {
        let doc = OfficeDocument::new(DocumentKind::Word, gateway()).unwrap();
        assert!(doc.created().is_some());
        assert_eq!(doc.created(), doc.modified());
        assert_eq!(doc.core_properties().title().unwrap(), "");
    }

    #[test]
    fn test_wrong_kind_is_unsupported() {
        let package = template::new_package(DocumentKind::Excel).unwrap();
        let err = OfficeDocument::from_package(DocumentKind::Word, package, gateway()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref s) if s.contains("Excel")));
    }

    #[test]
    fn test_package_without_main_document() {
        let err =
            OfficeDocument::from_package(DocumentKind::Word, OpcPackage::new(), gateway()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_to_package_writes_core_part() {
        let mut doc = OfficeDocument::new(DocumentKind::Excel, gateway()).unwrap();
        doc.core_properties_mut().set_title("Budget").unwrap();

        let package = doc.to_package().unwrap();
        let name = package.rels().part_with_reltype(rt::CORE_PROPERTIES).unwrap().unwrap();
        assert_eq!(name.as_str(), CORE_PARTNAME);
        assert!(package.part(&name).unwrap().xml_str().unwrap().contains("<dc:title>Budget</dc:title>"));
        // The document's own package is untouched.
        assert!(!doc.package().contains_part(&name));
    }

    #[test]
    fn test_core_record_written_only_when_set() {
        let mut doc = OfficeDocument::new(DocumentKind::Word, gateway()).unwrap();
        let record = PackURI::new(CORE_RECORD_PARTNAME).unwrap();
        assert!(!doc.to_package().unwrap().contains_part(&record));

        doc.core_properties_mut().set_subject("Q3").unwrap();
        let package = doc.to_package().unwrap();
        assert_eq!(
            package.part(&record).unwrap().content_type(),
            ct::CORE_PROPERTIES_BIN
        );

        let mut reopened = OfficeDocument::from_package(DocumentKind::Word, package, gateway()).unwrap();
        reopened.core_properties_mut().clear_field(CoreProperties::VT_SUBJECT).unwrap();
        let package = reopened.to_package().unwrap();
        assert!(!package.contains_part(&record));
        assert!(package.rels().first_with_reltype(rt::CORE_PROPERTIES_RECORD).is_none());
    }

    #[test]
    fn test_core_part_edited_elsewhere_wins() {
        let mut doc = OfficeDocument::new(DocumentKind::Word, gateway()).unwrap();
        doc.core_properties_mut().set_title("Draft").unwrap();
        let mut package = doc.to_package().unwrap();

        let core = PackURI::new(CORE_PARTNAME).unwrap();
        let part = package.part_mut(&core).unwrap();
        let xml = part.xml_str().unwrap().replace("Draft", "Final");
        part.set_blob(xml);

        let reopened = OfficeDocument::from_package(DocumentKind::Word, package, gateway()).unwrap();
        assert_eq!(reopened.core_properties().title().unwrap(), "Final");
    }

    #[test]
    fn test_theme_added_on_first_write() {
        let mut doc = OfficeDocument::new(DocumentKind::Word, gateway()).unwrap();
        assert!(doc.theme().is_none());
        doc.theme_mut()
            .set_color(ThemeSlot::Accent2, ThemeColor::rgb(1, 2, 3))
            .unwrap();

        let package = doc.to_package().unwrap();
        let reopened = OfficeDocument::from_package(DocumentKind::Word, package, gateway()).unwrap();
        let palette = reopened.theme().unwrap();
        assert_eq!(palette.color(ThemeSlot::Accent2).unwrap(), ThemeColor::rgb(1, 2, 3));
        assert_eq!(
            palette.color(ThemeSlot::Accent1).unwrap(),
            ThemeSlot::Accent1.default_color()
        );
    }

    #[test]
    fn test_presentation_theme_comes_from_master() {
        let doc = OfficeDocument::new(DocumentKind::PowerPoint, gateway()).unwrap();
        assert!(doc.theme().is_some());
    }
}
