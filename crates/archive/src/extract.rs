use std::path::Path;

use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::guard::ArchiveGuard;
use crate::zip_package::ZipOpener;
use crate::{ArchiveOpener, PackageArchive};

const UTF8_BOM: &str = "\u{feff}";

/// Open the package at `path` and return `entry_name` as text.
///
/// The archive is closed before this returns, on success and on every error.
pub fn extract<O: ArchiveOpener>(opener: &O, path: &Path, entry_name: &str) -> Result<String> {
    let label = path.display().to_string();
    let archive = opener.open(path)?;
    let mut guard = ArchiveGuard::new(archive, label.as_str());

    let bytes = guard
        .archive_mut()
        .read_entry(entry_name)?
        .ok_or_else(|| ArchiveError::entry_not_found(&label, entry_name))?;

    debug!(
        archive = %label,
        entry = %entry_name,
        bytes = bytes.len(),
        "Entry extracted"
    );

    decode_text(bytes, &label, entry_name)
}

/// [`extract`] against a zip file on disk.
pub fn extract_zip(path: &Path, entry_name: &str) -> Result<String> {
    extract(&ZipOpener, path, entry_name)
}

/// Read the first file entry of an already opened archive as text.
///
/// Takes ownership of the archive and closes it before returning.
pub fn extract_first_entry<A: PackageArchive>(archive: A, label: &str) -> Result<(String, String)> {
    let mut guard = ArchiveGuard::new(archive, label);

    let (name, bytes) = guard
        .archive_mut()
        .read_first_entry()?
        .ok_or_else(|| ArchiveError::entry_not_found(label, "<first entry>"))?;

    let text = decode_text(bytes, label, &name)?;
    Ok((name, text))
}

/// Decode entry bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode_text(bytes: Vec<u8>, label: &str, entry_name: &str) -> Result<String> {
    let text = String::from_utf8(bytes).map_err(|e| {
        ArchiveError::corrupt(label, format!("{} is not valid UTF-8: {}", entry_name, e))
    })?;

    match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(text),
    }
}
