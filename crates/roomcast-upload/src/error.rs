//! Error types for segment upload.

use thiserror::Error;

/// Errors that can occur while uploading a segment.
#[derive(Debug, Error)]
pub enum UploadError {
    /// HTTP request failed (connect, timeout, transfer).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Token refresh or credential problem.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server answered with a non-success status.
    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Folder lookup or creation failed.
    #[error("Folder error: {0}")]
    Folder(String),

    /// The segment file is gone or unreadable.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
