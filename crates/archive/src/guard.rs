//! RAII guard that closes an archive when it goes out of scope.

use tracing::debug;

use crate::PackageArchive;

/// Owns an opened archive and closes it exactly once.
///
/// Closing happens either through [`ArchiveGuard::close`] or on drop,
/// never both.
pub struct ArchiveGuard<A: PackageArchive> {
    archive: A,
    label: String,
    closed: bool,
}

impl<A: PackageArchive> ArchiveGuard<A> {
    pub fn new(archive: A, label: impl Into<String>) -> Self {
        let label = label.into();
        debug!(archive = %label, "Archive opened");

        Self {
            archive,
            label,
            closed: false,
        }
    }

    pub fn archive_mut(&mut self) -> &mut A {
        &mut self.archive
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the archive now instead of waiting for drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.archive.close();
        self.closed = true;
        debug!(archive = %self.label, "Archive closed");
    }
}

impl<A: PackageArchive> Drop for ArchiveGuard<A> {
    fn drop(&mut self) {
        self.close();
    }
}
