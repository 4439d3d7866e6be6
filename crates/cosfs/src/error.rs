//! Error types for the cosfs crate

use crate::rename::{RenameReport, RenameStage};
use cosfs_client::ClientError;
use thiserror::Error;

/// Result type alias using `FsError`
pub type Result<T> = std::result::Result<T, FsError>;

/// Coarse classification of a failure, stable across error variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed path, scheme, or missing bucket/object name
    InvalidArgument,
    /// Object, bucket or prefix does not exist
    NotFound,
    /// Writer unusable, or delete attempted on a non-empty directory
    FailedPrecondition,
    /// Reader could not satisfy the request; signals end of stream
    OutOfRange,
    /// A store operation failed
    Internal,
    /// Caller-level integrity check failed
    DataLoss,
}

/// Errors that can occur in filesystem operations
#[derive(Error, Debug)]
pub enum FsError {
    /// Malformed input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing object, bucket or prefix
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the current state
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Read past the end of an object
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Store failure, carrying the store's code and message
    #[error("internal: {0}")]
    Internal(String),

    /// Short read where the full length was required
    #[error("data loss: {0}")]
    DataLoss(String),

    /// A rename stopped partway; objects already moved stay moved
    #[error("rename stopped at {failed_key} during {stage} after {report}: {message}")]
    RenameIncomplete {
        report: RenameReport,
        failed_key: String,
        stage: RenameStage,
        message: String,
    },
}

impl FsError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            Self::OutOfRange(_) => ErrorKind::OutOfRange,
            Self::Internal(_) | Self::RenameIncomplete { .. } => ErrorKind::Internal,
            Self::DataLoss(_) => ErrorKind::DataLoss,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Store errors surface verbatim as `Internal`
impl From<ClientError> for FsError {
    fn from(err: ClientError) -> Self {
        FsError::Internal(format!("{}: {}", err.code(), err.message()))
    }
}
