//! The seam between in-memory documents and their serialized packages.
//!
//! Documents never touch ZIP or the filesystem directly; they hand an
//! [`OpcPackage`] to a [`PackageGateway`]. [`OoxmlGateway`] is the standard
//! implementation. Tests substitute their own to observe or break saves.

use std::io::Write;
use std::path::Path;

use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::phys_pkg::{Compression, write_atomic};
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;

/// Persistence of packages.
///
/// Only `decode_package` and `encode_package` are required. The provided
/// `save_package` writes through a temporary file and renames it into place,
/// so a failing `encode_package` never leaves a partial file behind.
pub trait PackageGateway: Send + Sync {
    /// Parse serialized package bytes.
    fn decode_package(&self, bytes: &[u8]) -> Result<OpcPackage>;

    /// Serialize a package into `sink`.
    fn encode_package(&self, package: &OpcPackage, sink: &mut dyn Write) -> Result<()>;

    fn read_package(&self, path: &Path) -> Result<OpcPackage> {
        let bytes = std::fs::read(path)?;
        self.decode_package(&bytes)
    }

    fn save_package(&self, path: &Path, package: &OpcPackage) -> Result<()> {
        write_atomic(path, |file| self.encode_package(package, file))
    }
}

/// ZIP-based Office Open XML packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OoxmlGateway {
    pub compression: Compression,
}

impl OoxmlGateway {
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }
}

impl PackageGateway for OoxmlGateway {
    fn decode_package(&self, bytes: &[u8]) -> Result<OpcPackage> {
        PackageReader::read(bytes)
    }

    fn encode_package(&self, package: &OpcPackage, sink: &mut dyn Write) -> Result<()> {
        let bytes = PackageWriter::to_bytes(package, self.compression)?;
        sink.write_all(&bytes)?;
        Ok(())
    }
}
