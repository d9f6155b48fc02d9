//! Connection state management.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Connection state for the live-view client.
///
/// The client makes a single connection attempt per session. When that
/// attempt fails, or the server later drops us, the state moves to
/// `Failed` and stays there: recording continues, only the live view is
/// lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,

    /// Connecting to server.
    Connecting,

    /// Connected and forwarding frames.
    Connected,

    /// Connection failed; no retry is made within the session.
    Failed { reason: String },
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Get status message for UI.
    pub fn message(&self) -> String {
        match self {
            Self::Disconnected => "Disconnected".to_string(),
            Self::Connecting => "Connecting...".to_string(),
            Self::Connected => "Connected".to_string(),
            Self::Failed { reason } => format!("Failed: {}", reason),
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

/// Read-only view of a client's connection state, cheap to clone into the
/// thread that produces frames. Senders consult it before submitting a
/// frame so nothing is queued while the socket is down.
#[derive(Clone)]
pub struct ConnectionWatch {
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionWatch {
    pub(crate) fn new(state: Arc<RwLock<ConnectionState>>) -> Self {
        Self { state }
    }

    /// Whether the relay connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected()
    }

    /// Current state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.state.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(ConnectionState::Failed {
            reason: "refused".to_string()
        }
        .is_failed());
        assert!(!ConnectionState::default().is_failed());
    }

    #[test]
    fn test_failed_message_carries_reason() {
        let state = ConnectionState::Failed {
            reason: "handshake timeout".to_string(),
        };
        assert_eq!(state.message(), "Failed: handshake timeout");
    }
}
