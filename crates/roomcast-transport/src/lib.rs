//! Live-view transport.
//!
//! This crate forwards composed frames to the relay server over a
//! WebSocket and keeps the API server's publisher registry in sync. The
//! live view is best-effort by design: recording never waits on it.

mod connection;
mod error;
mod live;
mod messages;
mod registry;

pub use connection::{ConnectionState, ConnectionWatch};
pub use error::TransportError;
pub use live::{LiveClient, LiveFrame, TransportStatistics};
pub use registry::{register_stream, unregister_stream};

/// Channel capacity for outgoing frames.
pub const FRAME_CHANNEL_CAPACITY: usize = 30;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
