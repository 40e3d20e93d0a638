use archive::ArchiveError;
use dataverse::DataverseError;
use ribbon::RibbonError;
use ribbon_core::CoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::step::PipelineStep;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dataverse error: {0}")]
    Api(#[from] DataverseError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Ribbon error: {0}")]
    Ribbon(#[from] RibbonError),

    #[error("Cancelled at step {step}")]
    Cancelled { step: PipelineStep },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigMissing(message) | CoreError::InvalidConfig(message) => {
                Self::ConfigMissing(message)
            }
            CoreError::Io(e) => Self::Io(e),
        }
    }
}

/// Flat classification of a failed run, independent of which layer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigMissing,
    Auth,
    NotFound,
    Http,
    Timeout,
    ArchiveCorrupt,
    EntryNotFound,
    Parse,
    Cancelled,
    Io,
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "config_missing",
            Self::Auth => "auth",
            Self::NotFound => "not_found",
            Self::Http => "http",
            Self::Timeout => "timeout",
            Self::ArchiveCorrupt => "archive_corrupt",
            Self::EntryNotFound => "entry_not_found",
            Self::Parse => "parse",
            Self::Cancelled => "cancelled",
            Self::Io => "io",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn archive_kind(err: &ArchiveError) -> ErrorKind {
    match err {
        ArchiveError::Corrupt { .. } => ErrorKind::ArchiveCorrupt,
        ArchiveError::EntryNotFound { .. } => ErrorKind::EntryNotFound,
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigMissing(_) => ErrorKind::ConfigMissing,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Api(err) => match err {
                DataverseError::Auth(_) => ErrorKind::Auth,
                DataverseError::NotFound { .. } => ErrorKind::NotFound,
                DataverseError::Http { .. } | DataverseError::Request(_) => ErrorKind::Http,
                DataverseError::Timeout { .. } => ErrorKind::Timeout,
                DataverseError::Serialization(_) | DataverseError::InvalidResponse(_) => {
                    ErrorKind::Parse
                }
                DataverseError::Io(_) => ErrorKind::Io,
            },
            Self::Archive(err) => archive_kind(err),
            Self::Ribbon(err) => match err {
                RibbonError::Archive(inner) => archive_kind(inner),
                RibbonError::Io(_) => ErrorKind::Io,
                RibbonError::MalformedXml(_)
                | RibbonError::InvalidPayload(_)
                | RibbonError::Serialization(_) => ErrorKind::Parse,
            },
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_unwraps_api_errors() {
        let err = PipelineError::from(DataverseError::not_found("Entity", "nope"));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = PipelineError::from(DataverseError::Timeout {
            operation: "export_solution".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err = PipelineError::from(DataverseError::Auth("expired".to_string()));
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[test]
    fn test_kind_for_archive_failures() {
        let err = PipelineError::from(ArchiveError::entry_not_found("a.zip", "customizations.xml"));
        assert_eq!(err.kind(), ErrorKind::EntryNotFound);

        let nested = PipelineError::from(RibbonError::Archive(ArchiveError::corrupt("payload", "bad")));
        assert_eq!(nested.kind(), ErrorKind::ArchiveCorrupt);
    }

    #[test]
    fn test_kind_for_parse_failures() {
        let err = PipelineError::from(RibbonError::MalformedXml("unexpected end".to_string()));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_core_errors_become_config_missing() {
        let err = PipelineError::from(CoreError::InvalidConfig("bad url".to_string()));
        assert_eq!(err.kind(), ErrorKind::ConfigMissing);
    }

    #[test]
    fn test_cancelled_display() {
        let err = PipelineError::Cancelled {
            step: PipelineStep::ExportSolution,
        };
        assert_eq!(err.to_string(), "Cancelled at step export_solution");
        assert!(err.is_cancelled());
        assert_eq!(err.kind().to_string(), "cancelled");
    }
}
