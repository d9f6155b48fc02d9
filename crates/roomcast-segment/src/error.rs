//! Error types for segment writing.

use thiserror::Error;

/// Errors that can occur while writing a segment.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// The ffmpeg child process could not be started.
    #[error("Failed to start ffmpeg: {0}")]
    Spawn(String),

    /// ffmpeg's stdin pipe was unavailable.
    #[error("Failed to open ffmpeg stdin")]
    Stdin,

    /// A raw frame could not be written to the encoder pipe.
    #[error("Failed to write frame: {0}")]
    Write(#[from] std::io::Error),

    /// A frame's dimensions did not match the dimensions the writer was
    /// opened with.
    #[error("Frame is {got_width}x{got_height} but writer expects {want_width}x{want_height}")]
    DimensionMismatch {
        got_width: u32,
        got_height: u32,
        want_width: u32,
        want_height: u32,
    },

    /// ffmpeg exited with a failure status while finalizing.
    #[error("ffmpeg encoding failed: {0}")]
    Finalize(String),
}
