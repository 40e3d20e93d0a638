use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{ArchiveError, Result};
use crate::{ArchiveOpener, PackageArchive};

/// Zip-backed [`PackageArchive`] over any seekable reader.
pub struct ZipPackage<R: Read + Seek> {
    inner: Option<ZipArchive<R>>,
    label: String,
}

impl ZipPackage<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| ArchiveError::corrupt(&label, e.to_string()))?;
        Self::from_reader(file, label)
    }
}

impl ZipPackage<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>, label: impl Into<String>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes), label)
    }
}

impl<R: Read + Seek> ZipPackage<R> {
    pub fn from_reader(reader: R, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let inner =
            ZipArchive::new(reader).map_err(|e| ArchiveError::corrupt(&label, e.to_string()))?;

        Ok(Self {
            inner: Some(inner),
            label,
        })
    }

    fn zip_mut(&mut self) -> Result<&mut ZipArchive<R>> {
        let label = &self.label;
        self.inner
            .as_mut()
            .ok_or_else(|| ArchiveError::corrupt(label.as_str(), "archive already closed"))
    }
}

impl<R: Read + Seek> PackageArchive for ZipPackage<R> {
    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let label = self.label.clone();
        let zip = self.zip_mut()?;

        // Entry names are matched case-insensitively; packages produced by
        // different platform versions disagree on casing.
        let resolved = match zip.file_names().find(|n| n.eq_ignore_ascii_case(name)) {
            Some(n) => n.to_string(),
            None => return Ok(None),
        };

        let mut entry = match zip.by_name(&resolved) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(ArchiveError::corrupt(label, e.to_string())),
        };

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| ArchiveError::corrupt(&label, format!("{}: {}", resolved, e)))?;
        Ok(Some(buf))
    }

    fn read_first_entry(&mut self) -> Result<Option<(String, Vec<u8>)>> {
        let label = self.label.clone();
        let zip = self.zip_mut()?;

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| ArchiveError::corrupt(&label, e.to_string()))?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .map_err(|e| ArchiveError::corrupt(&label, format!("{}: {}", name, e)))?;
            return Ok(Some((name, buf)));
        }

        Ok(None)
    }

    fn close(&mut self) {
        self.inner = None;
    }
}

/// Opens zip packages from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipOpener;

impl ArchiveOpener for ZipOpener {
    type Archive = ZipPackage<File>;

    fn open(&self, path: &Path) -> Result<Self::Archive> {
        ZipPackage::open(path)
    }
}
