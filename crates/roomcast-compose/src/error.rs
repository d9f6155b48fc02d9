//! Error types for the compositor.

use thiserror::Error;

/// Errors that can occur while composing frames.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The input frame list was empty. This is a caller bug, not a runtime
    /// condition; the capture loop never hands an empty cycle down.
    #[error("Cannot compose an empty frame list")]
    EmptyInput,

    /// The embedded overlay font failed to parse.
    #[error("Overlay font unavailable: {0}")]
    Font(String),

    /// Still-image encoding failed.
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
