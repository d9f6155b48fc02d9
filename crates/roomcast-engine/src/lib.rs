//! Core orchestrator for the recorder.
//!
//! This crate coordinates capture, composition, segment writing, the live
//! transport, and the upload pipeline behind a command/event channel pair.

mod recorder;
mod session;
mod stats;

pub use recorder::Recorder;
pub use session::Session;
pub use stats::StatsTracker;

use crossbeam_channel::{Receiver, Sender};
use roomcast_ipc::{RecorderCommand, RecorderEvent};

/// Create a recorder instance with IPC channels.
pub fn create_recorder(
    command_rx: Receiver<RecorderCommand>,
    event_tx: Sender<RecorderEvent>,
) -> Recorder {
    Recorder::new(command_rx, event_tx)
}
