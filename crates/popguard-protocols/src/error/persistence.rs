//! Pattern file persistence errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern file format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only filesystem");
        let err = PersistenceError::from(io_err);
        assert!(err.to_string().contains("read-only filesystem"));
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("[unclosed").unwrap_err();
        let err: PersistenceError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_invalid_format_display() {
        let err = PersistenceError::InvalidFormat("expected a JSON array".to_string());
        assert!(err.to_string().contains("expected a JSON array"));
    }
}
