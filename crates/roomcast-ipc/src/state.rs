//! Engine state machine types.

use serde::{Deserialize, Serialize};

use crate::types::{RecorderConfig, SessionStats};

/// The current state of the recorder engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum RecorderState {
    /// Engine is idle, not recording.
    #[default]
    Idle,

    /// Engine is starting a session (opening capture, connecting transport).
    Starting,

    /// Engine is recording.
    Recording {
        /// Active session configuration.
        config: RecorderConfig,

        /// Current session statistics.
        stats: SessionStats,
    },

    /// Engine is stopping: waiting for the capture worker to drain and the
    /// final segment upload to resolve.
    Stopping {
        /// Reason for stopping.
        reason: StopReason,
    },

    /// Engine encountered a fatal error.
    Error {
        /// Error message.
        message: String,

        /// Whether recovery is possible.
        recoverable: bool,
    },
}

impl RecorderState {
    /// Returns true if the engine is in the Idle state.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if the engine is currently recording.
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Returns true if the engine is starting.
    pub fn is_starting(&self) -> bool {
        matches!(self, Self::Starting)
    }

    /// Returns true if the engine is stopping.
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping { .. })
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Starting => "Starting",
            Self::Recording { .. } => "Recording",
            Self::Stopping { .. } => "Stopping",
            Self::Error { .. } => "Error",
        }
    }
}

/// Reason for stopping a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StopReason {
    /// Operator requested stop.
    UserRequested,

    /// Capture failed in a way the per-cycle recovery could not absorb.
    CaptureFailed { message: String },

    /// Fatal error occurred.
    FatalError { message: String },
}

impl StopReason {
    /// Returns a display message for this reason.
    pub fn message(&self) -> String {
        match self {
            Self::UserRequested => "Recording stopped by user".to_string(),
            Self::CaptureFailed { message } => format!("Capture failed: {message}"),
            Self::FatalError { message } => format!("Fatal error: {message}"),
        }
    }
}
