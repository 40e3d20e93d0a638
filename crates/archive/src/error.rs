use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive corrupt: {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Entry not found in {path}: {entry}")]
    EntryNotFound { path: String, entry: String },
}

impl ArchiveError {
    pub fn corrupt(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn entry_not_found(path: impl Into<String>, entry: impl Into<String>) -> Self {
        Self::EntryNotFound {
            path: path.into(),
            entry: entry.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
