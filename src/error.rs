//! Error types for Poll Position

use std::fmt;

/// Result type alias for Poll Position operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Poll Position
#[derive(Debug)]
pub enum Error {
    /// Object store errors
    ObjectStore(object_store::Error),
    /// HTTP client errors (connect, timeout, body decode)
    Http(reqwest::Error),
    /// Upstream data source answered with a non-success status
    Upstream {
        status: u16,
        url: String,
        body: String,
    },
    /// IO errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// No artifact matched the request
    NotFound(String),
    /// Internal error
    Internal(String),
}

impl Error {
    /// Whether this error means "nothing to serve" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ObjectStore(e) => Some(e),
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ObjectStore(e) => write!(f, "Object store error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Upstream { status, url, body } => {
                write!(f, "Upstream request to {} failed with status {}: {}", url, status, body)
            }
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::NotFound(msg) => write!(f, "{}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<object_store::Error> for Error {
    fn from(e: object_store::Error) -> Self {
        Error::ObjectStore(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Internal(format!("worker task failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_bare_message() {
        let err = Error::NotFound("No poll data found".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No poll data found");
    }

    #[test]
    fn upstream_error_mentions_status_and_url() {
        let err = Error::Upstream {
            status: 401,
            url: "https://example.test/rankings".to_string(),
            body: "unauthorized".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("401"));
        assert!(text.contains("https://example.test/rankings"));
        assert!(!err.is_not_found());
    }
}
