//! Upload error types.

use filechat_transfer::{EncodeError, TransferError};

/// Errors produced while uploading a batch.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

impl From<EncodeError> for UploadError {
    fn from(e: EncodeError) -> Self {
        UploadError::Transfer(TransferError::Encode(e))
    }
}

impl UploadError {
    /// `true` when a chunk could not be read or encoded.
    pub fn is_encode(&self) -> bool {
        matches!(self, UploadError::Transfer(TransferError::Encode(_)))
    }
}
