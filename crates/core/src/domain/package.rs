use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Solution package written to disk by the export step.
///
/// The file outlives the pipeline run; nothing removes it automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPackage {
    pub file_path: PathBuf,
}

impl ExportedPackage {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }
}
