//! Commands sent from the caller to the engine.

use serde::{Deserialize, Serialize};

use crate::types::RecorderConfig;

/// Commands that a front-end can send to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecorderCommand {
    /// Start recording with the given configuration.
    Start { config: RecorderConfig },

    /// Stop the current session. The engine finalizes and uploads the last
    /// segment before acknowledging the stop.
    Stop,

    /// Request the list of capturable monitors.
    GetMonitors,

    /// Request current engine state.
    GetState,

    /// Shutdown the engine completely.
    Shutdown,
}
