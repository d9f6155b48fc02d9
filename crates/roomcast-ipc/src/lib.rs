//! Typed caller<->engine messages for the recorder.
//!
//! This crate defines all the message types used for communication between
//! a front-end (CLI, window shell) and the recorder engine.

mod commands;
mod events;
mod state;
mod types;

pub use commands::RecorderCommand;
pub use events::RecorderEvent;
pub use state::{RecorderState, StopReason};
pub use types::{
    DriveSettings, MonitorInfo, RecorderConfig, SessionStats, StorageTier, UploadReport,
};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for commands (caller → engine).
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Channel capacity for events (engine → caller).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded command channel.
pub fn command_channel() -> (Sender<RecorderCommand>, Receiver<RecorderCommand>) {
    crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY)
}

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<RecorderEvent>, Receiver<RecorderEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
