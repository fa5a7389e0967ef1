use thiserror::Error;

use crate::validation::FileRejection;

/// Failure reported by an external collaborator (file storage, waiver
/// authority, record store). The message is passed through verbatim so it can
/// be matched against known infrastructure signatures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("File rejected: {0}")]
    FileRejected(#[from] FileRejection),
    #[error("Document upload failed: {0}")]
    Upload(BackendError),
    #[error("Waiver code check failed: {0}")]
    WaiverCheck(BackendError),
    #[error("Waiver code `{0}` is no longer valid")]
    WaiverRejected(String),
    #[error("Waiver code changed after it was verified; verify `{0}` again")]
    WaiverChanged(String),
    #[error("Waiver code consumption failed: {0}")]
    WaiverConsume(BackendError),
    #[error("Waiver code `{0}` could not be consumed")]
    WaiverNotConsumed(String),
    #[error("Author photo upload failed: {0}")]
    PhotoUpload(BackendError),
    #[error("Publication record creation failed: {0}")]
    RecordCreate(BackendError),
    #[error("You must be signed in to submit a publication")]
    NotAuthenticated,
    #[error("No document attached to the submission")]
    MissingDocument,
    #[error("Invalid validation policy: {0}")]
    InvalidPolicy(String),
}

impl CoreError {
    /// Collaborator error text carried by this failure, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            CoreError::Upload(err)
            | CoreError::WaiverCheck(err)
            | CoreError::WaiverConsume(err)
            | CoreError::PhotoUpload(err)
            | CoreError::RecordCreate(err) => Some(err.message.as_str()),
            _ => None,
        }
    }
}
