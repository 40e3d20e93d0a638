use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataverseError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP {status} from {operation}: {message}")]
    Http {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("{resource} not found: {key}")]
    NotFound { resource: String, key: String },

    #[error("{operation} timed out")]
    Timeout { operation: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataverseError {
    pub fn not_found(resource: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            key: key.into(),
        }
    }

    /// Map a transport error, keeping timeouts distinguishable.
    pub fn from_request(operation: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: operation.to_string(),
            }
        } else {
            Self::Request(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, DataverseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DataverseError::not_found("Publisher", "missing");
        assert_eq!(err.to_string(), "Publisher not found: missing");
    }

    #[test]
    fn test_http_display() {
        let err = DataverseError::Http {
            operation: "create_solution".to_string(),
            status: 400,
            message: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 400 from create_solution: bad");
    }
}
