//! Document lifecycle shared by Word, PowerPoint and Excel.
//!
//! Every document kind wraps an [`OfficeDocument`] and implements
//! [`Document`], which provides creation, opening and saving on top of a
//! [`PackageGateway`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use officekit::{Document, Word};
//!
//! let mut doc = Word::create(Some(Path::new("report.docx")), None)?;
//! doc.core_properties_mut().set_title("Quarterly report")?;
//! doc.save_as("report.docx")?;
//! # Ok::<(), officekit::Error>(())
//! ```

mod kind;
mod office;

pub use kind::DocumentKind;
pub use office::OfficeDocument;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::common::Result;
use crate::models::{CoreProperties, ThemePalette};
use crate::ooxml::opc::{OoxmlGateway, OpcPackage, PackageGateway};

/// The gateway used when none is given: ZIP packages, deflated.
pub fn default_gateway() -> Arc<dyn PackageGateway> {
    Arc::new(OoxmlGateway::default())
}

/// A document of one [`DocumentKind`].
///
/// Implementors supply the conversions to and from [`OfficeDocument`]; the
/// lifecycle operations are provided.
pub trait Document: Sized {
    const KIND: DocumentKind;

    fn office(&self) -> &OfficeDocument;

    fn office_mut(&mut self) -> &mut OfficeDocument;

    /// Finish opening a document whose package has been read.
    fn from_office(office: OfficeDocument) -> Result<Self>;

    /// The package to save. Kinds with state of their own write it into the
    /// package here.
    fn to_package(&self) -> Result<OpcPackage> {
        self.office().to_package()
    }

    /// An empty document.
    fn new() -> Result<Self> {
        Self::new_with(default_gateway())
    }

    fn new_with(gateway: Arc<dyn PackageGateway>) -> Result<Self> {
        Self::from_office(OfficeDocument::new(Self::KIND, gateway)?)
    }

    /// Open or create a document.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Read when `buffer` is absent or empty and the file exists
    /// * `buffer` - Serialized package; takes precedence over `file_name`
    ///
    /// With neither, or with a `file_name` that does not exist yet, an empty
    /// document is built.
    fn create(file_name: Option<&Path>, buffer: Option<&[u8]>) -> Result<Self> {
        Self::create_with(default_gateway(), file_name, buffer)
    }

    fn create_with(
        gateway: Arc<dyn PackageGateway>,
        file_name: Option<&Path>,
        buffer: Option<&[u8]>,
    ) -> Result<Self> {
        match (buffer, file_name) {
            (Some(bytes), _) if !bytes.is_empty() => Self::from_bytes_with(gateway, bytes),
            (_, Some(path)) if path.exists() => Self::open_with(gateway, path),
            _ => Self::new_with(gateway),
        }
    }

    /// Open an existing file. Fails with an I/O error if it does not exist.
    fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(default_gateway(), path)
    }

    fn open_with(gateway: Arc<dyn PackageGateway>, path: impl AsRef<Path>) -> Result<Self> {
        let (path, kind) = (path.as_ref(), Self::KIND);
        debug!(path = %path.display(), %kind, "opening document");
        let package = gateway.read_package(path)?;
        Self::from_office(OfficeDocument::from_package(Self::KIND, package, gateway)?)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(default_gateway(), bytes)
    }

    fn from_bytes_with(gateway: Arc<dyn PackageGateway>, bytes: &[u8]) -> Result<Self> {
        let package = gateway.decode_package(bytes)?;
        Self::from_office(OfficeDocument::from_package(Self::KIND, package, gateway)?)
    }

    /// Write the document to `path`, replacing any existing file.
    ///
    /// The file is written beside `path` and renamed into place, so on
    /// failure a previous file at `path` is left as it was. The document
    /// itself is never modified by saving.
    fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let package = self.to_package()?;
        self.office().gateway().save_package(path, &package)?;
        let kind = Self::KIND;
        debug!(path = %path.display(), %kind, parts = package.part_count(), "saved document");
        Ok(())
    }

    /// The serialized package.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let package = self.to_package()?;
        let mut out = Vec::new();
        self.office().gateway().encode_package(&package, &mut out)?;
        Ok(out)
    }

    fn kind(&self) -> DocumentKind {
        Self::KIND
    }

    fn core_properties(&self) -> &CoreProperties {
        self.office().core_properties()
    }

    fn core_properties_mut(&mut self) -> &mut CoreProperties {
        self.office_mut().core_properties_mut()
    }

    fn theme(&self) -> Option<&ThemePalette> {
        self.office().theme()
    }

    fn theme_mut(&mut self) -> &mut ThemePalette {
        self.office_mut().theme_mut()
    }
}
