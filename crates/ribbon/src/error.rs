use thiserror::Error;

#[derive(Debug, Error)]
pub enum RibbonError {
    #[error("Malformed ribbon XML: {0}")]
    MalformedXml(String),

    #[error("Invalid ribbon payload: {0}")]
    InvalidPayload(String),

    #[error("Ribbon payload archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RibbonResult<T> = Result<T, RibbonError>;
