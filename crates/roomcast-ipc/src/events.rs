//! Events sent from the engine to the caller.

use serde::{Deserialize, Serialize};

use crate::state::RecorderState;
use crate::types::{MonitorInfo, SessionStats, UploadReport};

/// Events that the engine can send to a front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecorderEvent {
    /// Engine state has changed.
    StateChanged {
        /// Previous state.
        previous: Box<RecorderState>,

        /// Current state.
        current: Box<RecorderState>,
    },

    /// Human-readable status line (connection state, upload progress).
    Status(String),

    /// Updated session statistics.
    Stats(SessionStats),

    /// A finished segment went through the upload pipeline.
    SegmentUploaded(UploadReport),

    /// Error occurred.
    Error {
        /// Whether the error is recoverable.
        recoverable: bool,

        /// Error message.
        message: String,
    },

    /// List of capturable monitors.
    Monitors(Vec<MonitorInfo>),

    /// Engine is ready.
    Ready,

    /// Engine has shut down.
    Shutdown,
}
