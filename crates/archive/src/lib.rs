//! Reads named entries out of zip-format solution packages.
//!
//! Every archive handle is wrapped in an [`ArchiveGuard`] so it is closed
//! exactly once, whichever way extraction ends.

mod error;
mod extract;
mod guard;
mod zip_package;

pub use error::{ArchiveError, Result};
pub use extract::{decode_text, extract, extract_first_entry, extract_zip};
pub use guard::ArchiveGuard;
pub use zip_package::{ZipOpener, ZipPackage};

use std::path::Path;

/// An opened package whose entries can be read by name.
pub trait PackageArchive {
    /// Read one entry. `Ok(None)` means the entry does not exist.
    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Read the first file entry, returning its name and contents.
    fn read_first_entry(&mut self) -> Result<Option<(String, Vec<u8>)>>;

    /// Release the underlying handle.
    fn close(&mut self);
}

/// Opens packages from disk.
pub trait ArchiveOpener {
    type Archive: PackageArchive;

    fn open(&self, path: &Path) -> Result<Self::Archive>;
}
