//! Error types for tagflow
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// All error types that can occur in tagflow
#[derive(Debug, Error)]
pub enum TagflowError {
    /// A declared path resolves outside the project root
    #[error("Path {path} escapes project root {root}")]
    PathEscape { path: PathBuf, root: PathBuf },

    /// The external fragment producer failed mid-turn
    #[error("Producer error: {0}")]
    Producer(String),

    /// A filesystem operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tagflow operations
pub type Result<T> = std::result::Result<T, TagflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_escape_error() {
        let err = TagflowError::PathEscape {
            path: PathBuf::from("../../etc/passwd"),
            root: PathBuf::from("/tmp/project"),
        };
        assert_eq!(
            err.to_string(),
            "Path ../../etc/passwd escapes project root /tmp/project"
        );
    }

    #[test]
    fn test_producer_error() {
        let err = TagflowError::Producer("stream closed".to_string());
        assert_eq!(err.to_string(), "Producer error: stream closed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TagflowError = io_err.into();
        assert!(matches!(err, TagflowError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TagflowError = json_err.into();
        assert!(matches!(err, TagflowError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        assert!(returns_ok().is_ok());
    }
}
