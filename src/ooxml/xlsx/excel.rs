use std::path::Path;

use bytes::Bytes;
use tracing::{debug, warn};

use super::registry::SheetRegistry;
use super::sheet::{Sheet, SheetSource};
use crate::common::{Error, Result};
use crate::document::{Document, DocumentKind, OfficeDocument};
use crate::models::{ExcelProperties, PropertyModel, StyleSetting};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI, Part};
use crate::ooxml::parts::styles_xml::StyleSheet;
use crate::ooxml::parts::workbook_xml::{self, SheetEntry};
use crate::ooxml::parts::{malformed, template};

const WORKSHEET_PARTNAME: &str = "/xl/worksheets/sheet%d.xml";
const WORKBOOK_PROPERTIES_PARTNAME: &str = "/xl/customData/workbookProperties%d.bin";
const SHEET_PROPERTIES_PARTNAME: &str = "/xl/customData/sheetProperties%d.bin";
const STYLES_PARTNAME: &str = "/xl/styles%d.xml";

/// An Excel workbook.
///
/// Sheets are managed through the [`SheetRegistry`]; their cell content is
/// carried through unchanged. Workbook and per-sheet [`ExcelProperties`]
/// are stored as encoded records in custom parts related from the workbook
/// and worksheet parts. Cell formats requested with
/// [`Excel::get_style_id_mut`] are added to the workbook stylesheet.
///
/// # Examples
///
/// ```rust,no_run
/// use officekit::{Document, Excel};
///
/// let mut book = Excel::new()?;
/// book.add_sheet("Q1")?;
/// book.rename_sheet("Sheet1", "Summary")?;
/// book.properties_mut().set_editable(false)?;
/// book.save_as("report.xlsx")?;
/// # Ok::<(), officekit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Excel {
    office: OfficeDocument,
    registry: SheetRegistry,
    properties: ExcelProperties,
    /// Read on the first style request
    styles: Option<StyleSheet>,
}

impl Excel {
    /// Open or create a workbook and give it the encoded `buffer` as its
    /// workbook properties.
    ///
    /// An empty `buffer` leaves the properties at their defaults.
    pub fn from_properties_buffer(file_name: Option<&Path>, buffer: &[u8]) -> Result<Self> {
        let properties = if buffer.is_empty() {
            ExcelProperties::new()
        } else {
            ExcelProperties::from_bytes(Bytes::copy_from_slice(buffer))?
        };
        let mut excel = Self::create(file_name, None)?;
        excel.properties = properties;
        Ok(excel)
    }

    /// Workbook-wide properties.
    pub fn properties(&self) -> &ExcelProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut ExcelProperties {
        &mut self.properties
    }

    /// Properties in effect for the sheet called `name`.
    pub fn sheet_properties(&self, name: &str) -> Result<&ExcelProperties> {
        Ok(self.registry.get_sheet(name)?.properties_or(&self.properties))
    }

    pub fn sheets(&self) -> &SheetRegistry {
        &self.registry
    }

    pub fn sheets_mut(&mut self) -> &mut SheetRegistry {
        &mut self.registry
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Sheet> {
        self.registry.add_sheet(name)
    }

    pub fn add_default_sheet(&mut self) -> Result<&mut Sheet> {
        self.registry.add_default_sheet()
    }

    pub fn rename_sheet(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        self.registry.rename_sheet(old_name, new_name)
    }

    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.registry.get_sheet(name)
    }

    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.registry.get_sheet_mut(name)
    }

    pub fn list_sheet_names(&self) -> Vec<String> {
        self.registry.list_sheet_names()
    }

    pub fn sheet_count(&self) -> usize {
        self.registry.len()
    }

    pub fn hide_sheet(&mut self, name: &str) -> Result<()> {
        self.registry.hide_sheet(name)
    }

    pub fn unhide_sheet(&mut self, name: &str) -> Result<()> {
        self.registry.unhide_sheet(name)
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.registry.active_sheet()
    }

    pub fn set_active_sheet(&mut self, name: &str) -> Result<()> {
        self.registry.set_active_sheet(name)
    }

    /// Index of the cell format that looks like `setting`, for use as a
    /// cell's `s` attribute.
    ///
    /// Formats, fonts, fills, borders and number formats already in the
    /// stylesheet are reused; anything missing is added and written on the
    /// next save.
    pub fn get_style_id_mut(&mut self, setting: &StyleSetting) -> Result<u32> {
        let mut styles = match self.styles.take() {
            Some(styles) => styles,
            None => self.load_styles()?,
        };
        let id = styles.style_id(setting);
        self.styles = Some(styles);
        id
    }

    fn load_styles(&self) -> Result<StyleSheet> {
        let package = self.office.package();
        let Some(partname) = package.related_partname(self.office.main_partname(), rt::STYLES)?
        else {
            debug!("workbook has no stylesheet, starting from the default one");
            return StyleSheet::parse(template::SPREADSHEET_STYLES_XML);
        };
        match package.part(&partname) {
            Some(part) => StyleSheet::parse(part.xml_str().map_err(|e| malformed("styles", e))?),
            None => {
                warn!(partname = %partname, "styles relationship points at a missing part");
                StyleSheet::parse(template::SPREADSHEET_STYLES_XML)
            },
        }
    }

    /// Write the stylesheet when formats were added to it.
    fn write_styles(&self, package: &mut OpcPackage) -> Result<()> {
        let Some(styles) = self.styles.as_ref().filter(|styles| styles.has_changes()) else {
            return Ok(());
        };
        let workbook = self.office.main_partname();
        let xml = styles.to_xml()?;
        let partname = match package.related_partname(workbook, rt::STYLES)? {
            Some(name) => name,
            None => package.next_partname(STYLES_PARTNAME)?,
        };
        match package.part_mut(&partname) {
            Some(part) => part.set_blob(xml),
            None => {
                package.add_part(Part::new(partname.clone(), ct::SML_STYLES, xml));
            },
        }
        if let Some(owner) = package.part_mut(workbook) {
            owner.rels_mut().get_or_add(rt::STYLES, &partname);
        }
        Ok(())
    }

    fn write_sheets(&self, package: &mut OpcPackage) -> Result<()> {
        let workbook = self.office.main_partname().clone();
        let mut next_sheet_id = self
            .registry
            .iter()
            .filter_map(|sheet| sheet.source().map(|source| source.sheet_id))
            .max()
            .unwrap_or(0);

        let mut entries = Vec::with_capacity(self.registry.len());
        let mut renames = Vec::new();
        for sheet in self.registry.iter() {
            if let Some(source) = sheet.source()
                && source.name != sheet.name()
            {
                renames.push((source.name.clone(), sheet.name().to_string()));
            }
            let (sheet_id, r_id, partname) = match sheet.source() {
                Some(source) => (source.sheet_id, source.r_id.clone(), source.partname.clone()),
                None => {
                    let partname = package.next_partname(WORKSHEET_PARTNAME)?;
                    package.add_part(Part::new(
                        partname.clone(),
                        ct::SML_WORKSHEET,
                        template::WORKSHEET_XML,
                    ));
                    let r_id = package
                        .part_mut(&workbook)
                        .ok_or_else(|| Error::NotFound(workbook.to_string()))?
                        .rels_mut()
                        .get_or_add(rt::WORKSHEET, &partname);
                    next_sheet_id += 1;
                    (next_sheet_id, r_id, partname)
                },
            };

            write_properties(package, &partname, sheet.properties(), SHEET_PROPERTIES_PARTNAME)?;
            entries.push(SheetEntry {
                name: sheet.name().to_string(),
                sheet_id,
                state: sheet.state(),
                r_id,
            });
        }

        let part = package
            .part_mut(&workbook)
            .ok_or_else(|| Error::NotFound(workbook.to_string()))?;
        let xml = workbook_xml::patch(
            part.xml_str().map_err(|e| malformed("workbook", e))?,
            &entries,
            self.registry.active_position().unwrap_or(0),
            &renames,
        )?;
        part.set_blob(xml);
        Ok(())
    }
}

/// Store `record` in a part related from `owner`, or remove the part when
/// there is nothing to store.
fn write_properties(
    package: &mut OpcPackage,
    owner: &PackURI,
    record: Option<&ExcelProperties>,
    partname_template: &str,
) -> Result<()> {
    if !package.contains_part(owner) {
        return Ok(());
    }
    let existing = package.related_partname(owner, rt::EXCEL_PROPERTIES)?;

    match record.filter(|record| !record.table().is_empty()) {
        Some(record) => {
            let bytes = record.to_bytes()?;
            let partname = match existing {
                Some(name) => name,
                None => package.next_partname(partname_template)?,
            };
            match package.part_mut(&partname) {
                Some(part) => part.set_blob(bytes),
                None => {
                    package.add_part(Part::new(partname.clone(), ct::EXCEL_PROPERTIES_BIN, bytes));
                },
            }
            if let Some(owner) = package.part_mut(owner) {
                owner.rels_mut().get_or_add(rt::EXCEL_PROPERTIES, &partname);
            }
        },
        None => {
            if let Some(name) = existing {
                package.remove_part(&name);
                if let Some(owner) = package.part_mut(owner)
                    && let Some(r_id) = owner
                        .rels()
                        .first_with_reltype(rt::EXCEL_PROPERTIES)
                        .map(|rel| rel.r_id().to_string())
                {
                    owner.rels_mut().remove(&r_id);
                }
            }
        },
    }
    Ok(())
}

/// The encoded record related from `owner`, if any.
fn read_properties(package: &OpcPackage, owner: &PackURI) -> Result<Option<ExcelProperties>> {
    let Some(partname) = package.related_partname(owner, rt::EXCEL_PROPERTIES)? else {
        return Ok(None);
    };
    match package.part(&partname) {
        Some(part) => Ok(Some(ExcelProperties::from_bytes(part.blob().clone())?)),
        None => {
            warn!(partname = %partname, "excel properties relationship points at a missing part");
            Ok(None)
        },
    }
}

impl Document for Excel {
    const KIND: DocumentKind = DocumentKind::Excel;

    fn office(&self) -> &OfficeDocument {
        &self.office
    }

    fn office_mut(&mut self) -> &mut OfficeDocument {
        &mut self.office
    }

    fn from_office(office: OfficeDocument) -> Result<Self> {
        if office.kind() != Self::KIND {
            return Err(Error::UnsupportedFormat(format!(
                "expected an Excel workbook, found {}",
                office.kind()
            )));
        }

        let package = office.package();
        let workbook = office.main_part()?;
        let info = workbook_xml::parse(workbook.xml_str().map_err(|e| malformed("workbook", e))?)?;

        let mut registry = SheetRegistry::new();
        for entry in info.sheets {
            let rel = workbook.rels().get(&entry.r_id).ok_or_else(|| {
                Error::MalformedBuffer(format!(
                    "sheet {:?} refers to missing relationship {}",
                    entry.name, entry.r_id
                ))
            })?;
            let partname = workbook.rels().target_partname(rel)?;
            let properties = if package.contains_part(&partname) {
                read_properties(package, &partname)?
            } else {
                warn!(sheet = %entry.name, partname = %partname, "worksheet part is missing");
                None
            };

            let source = SheetSource {
                name: entry.name.clone(),
                sheet_id: entry.sheet_id,
                r_id: entry.r_id,
                partname,
            };
            registry
                .insert_loaded(entry.name, entry.state, properties, source)
                .map_err(|e| match e {
                    Error::DuplicateName(name) => {
                        Error::MalformedBuffer(format!("workbook lists sheet {:?} twice", name))
                    },
                    other => other,
                })?;
        }
        if registry.is_empty() {
            warn!("workbook has no sheets");
        }
        registry.restore_active(info.active_tab);

        let properties =
            read_properties(package, office.main_partname())?.unwrap_or_else(ExcelProperties::new);

        debug!(sheets = registry.len(), "loaded workbook");
        Ok(Self {
            office,
            registry,
            properties,
            styles: None,
        })
    }

    fn to_package(&self) -> Result<OpcPackage> {
        let mut package = self.office.to_package()?;
        self.write_sheets(&mut package)?;
        self.write_styles(&mut package)?;
        write_properties(
            &mut package,
            self.office.main_partname(),
            Some(&self.properties),
            WORKBOOK_PROPERTIES_PARTNAME,
        )?;
        Ok(package)
    }
}
