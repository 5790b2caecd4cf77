//! Error types for dspace.

use thiserror::Error;

use crate::backend::BackendError;
use crate::transfer::TransferFailure;

/// Common error type for dspace.
#[derive(Error, Debug)]
pub enum DspaceError {
    /// A backend call failed outside of the transfer engine's retry loop.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// An upload or download could not complete.
    ///
    /// Chunks uploaded before the failure are left in the backend.
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferFailure),

    /// No job root with the given job id exists under the tree root.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Lookup by id or path yielded nothing.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// The persisted snapshot does not exist yet.
    #[error("virtual directory not initialized: {0}")]
    NotInitialized(String),

    /// A record path that cannot live where it was asked to go.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A record path already occupied by another record.
    #[error("path conflict: {0}")]
    PathConflict(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or request (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Archive packaging error.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for client input.
    #[error("validation error: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for DspaceError {
    fn from(e: serde_json::Error) -> Self {
        DspaceError::Serialization(e.to_string())
    }
}

impl From<zip::result::ZipError> for DspaceError {
    fn from(e: zip::result::ZipError) -> Self {
        DspaceError::Archive(e.to_string())
    }
}

/// Result type alias for dspace operations.
pub type Result<T> = std::result::Result<T, DspaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_not_found_display() {
        let err = DspaceError::JobNotFound("job-1".to_string());
        assert_eq!(err.to_string(), "job not found: job-1");
    }

    #[test]
    fn test_record_not_found_display() {
        let err = DspaceError::RecordNotFound("abc".to_string());
        assert_eq!(err.to_string(), "record not found: abc");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DspaceError = io_err.into();
        assert!(matches!(err, DspaceError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DspaceError = json_err.into();
        assert!(matches!(err, DspaceError::Serialization(_)));
    }

    #[test]
    fn test_transfer_failure_keeps_chunk_index() {
        let failure = TransferFailure::Upload {
            index: 2,
            name: "01012026000000000.bin.2.chunk".to_string(),
            attempts: 3,
            source: BackendError::Unavailable("channel offline".to_string()),
        };
        let err: DspaceError = failure.into();
        let text = err.to_string();
        assert!(text.contains("chunk 2"));
        assert!(text.contains("channel offline"));
    }
}
