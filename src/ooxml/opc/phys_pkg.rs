//! Physical access to a ZIP-based OPC package.
//!
//! Reading checks the container signature before handing the bytes to the
//! ZIP reader so that legacy binary files and plain garbage are reported as
//! unsupported instead of as corrupt archives. Writing is deterministic:
//! members are stored in the order they are written and carry a fixed
//! modification time.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;

/// Local file header signature that starts every non-empty ZIP archive
const ZIP_SIGNATURE: [u8; 4] = *b"PK\x03\x04";

/// End of central directory signature, which starts an empty archive
const EMPTY_ZIP_SIGNATURE: [u8; 4] = *b"PK\x05\x06";

/// OLE2 compound file signature used by .doc, .xls and .ppt
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// How part content is compressed when a package is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Reader over the members of an in-memory ZIP package.
pub struct PhysPkgReader<'data> {
    archive: ZipArchive<Cursor<&'data [u8]>>,
}

impl<'data> PhysPkgReader<'data> {
    /// Open a package held in memory.
    ///
    /// # Errors
    /// [`OpcError::UnsupportedContainer`] if the bytes are not a ZIP archive,
    /// [`OpcError::ZipError`] if they are a damaged one.
    pub fn new(data: &'data [u8]) -> Result<Self> {
        if data.starts_with(&OLE_SIGNATURE) {
            return Err(OpcError::UnsupportedContainer(
                "legacy OLE2 compound file".to_string(),
            ));
        }
        if !data.starts_with(&ZIP_SIGNATURE) && !data.starts_with(&EMPTY_ZIP_SIGNATURE) {
            return Err(OpcError::UnsupportedContainer(
                "not a ZIP-based package".to_string(),
            ));
        }

        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Decompress every file member, keyed by member name.
    pub fn read_all(&mut self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut members = BTreeMap::new();
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size().min(1 << 24) as usize);
            file.read_to_end(&mut data)?;
            members.insert(name, data);
        }
        tracing::debug!(members = members.len(), "read package members");
        Ok(members)
    }
}

/// Writer that assembles a ZIP package in memory.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PhysPkgWriter {
    pub fn new(compression: Compression) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(compression.method())
            .last_modified_time(zip::DateTime::default());
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        }
    }

    /// Write one member.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.archive.start_file(pack_uri.membername(), self.options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.archive.finish()?.into_inner())
    }
}

/// Replace the file at `path` with what `write` produces, all or nothing.
///
/// Content goes to a temporary file in the destination directory, which is
/// synced and then renamed over `path`. If `write` fails, the temporary file
/// is removed and any existing file at `path` is left untouched.
pub fn write_atomic<E, F>(path: &Path, write: F) -> std::result::Result<(), E>
where
    E: From<std::io::Error>,
    F: FnOnce(&mut File) -> std::result::Result<(), E>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| E::from(e.error))?;

    if let Ok(dir_handle) = File::open(dir)
        && let Err(e) = dir_handle.sync_all()
    {
        tracing::warn!("failed to sync {} after rename: {}", dir.display(), e);
    }

    tracing::debug!(path = %path.display(), "saved package");
    Ok(())
}
