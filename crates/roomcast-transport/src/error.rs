//! Error types for the transport module.

use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection error (general).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid WebSocket URL.
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// Send error.
    #[error("Send error: {0}")]
    Send(String),

    /// Already connected.
    #[error("Already connected")]
    AlreadyConnected,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
