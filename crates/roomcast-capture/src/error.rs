//! Error types for the capture module.

use thiserror::Error;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Monitor enumeration failed.
    #[error("Monitor enumeration failed: {0}")]
    Enumeration(String),

    /// Requested monitor index does not exist.
    #[error("Monitor index {0} not found")]
    SourceNotFound(usize),

    /// No monitors were selected for the session.
    #[error("No capture sources selected")]
    NoSources,

    /// The OS refused or failed a grab.
    #[error("Screen grab failed: {0}")]
    Grab(String),
}
