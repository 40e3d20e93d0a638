use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::ConfigMissing("publisher_unique_name".to_string());
        assert!(error.to_string().contains("publisher_unique_name"));
    }
}
