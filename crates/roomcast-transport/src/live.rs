//! WebSocket live-view client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::runtime::Runtime;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::connection::{ConnectionState, ConnectionWatch};
use crate::error::TransportError;
use crate::messages::WireMessage;
use crate::registry::{register_stream, unregister_stream};
use crate::{TransportResult, FRAME_CHANNEL_CAPACITY};

/// A composed frame to forward to the relay.
#[derive(Debug, Clone)]
pub struct LiveFrame {
    /// JPEG-encoded frame data.
    pub jpeg: Bytes,
}

/// WebSocket client that forwards composed frames to the relay server.
///
/// One connection attempt per session. Frames submitted while the socket
/// is down are counted as dropped; the recording path never blocks on the
/// live view.
pub struct LiveClient {
    server_url: String,
    api_url: String,
    room: String,
    username: String,
    state: Arc<RwLock<ConnectionState>>,
    runtime: Option<Runtime>,
    should_stop: Arc<AtomicBool>,
    frame_sender: Option<Sender<LiveFrame>>,
    frames_sent: Arc<AtomicU64>,
    frames_dropped: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
}

impl LiveClient {
    /// Create a new live-view client.
    pub fn new(
        server_url: String,
        api_url: String,
        room: String,
        username: String,
    ) -> TransportResult<Self> {
        if !server_url.starts_with("ws://") && !server_url.starts_with("wss://") {
            return Err(TransportError::InvalidUrl(
                "URL must start with ws:// or wss://".to_string(),
            ));
        }

        Ok(Self {
            server_url,
            api_url,
            room,
            username,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            runtime: None,
            should_stop: Arc::new(AtomicBool::new(false)),
            frame_sender: None,
            frames_sent: Arc::new(AtomicU64::new(0)),
            frames_dropped: Arc::new(AtomicU64::new(0)),
            bytes_sent: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Connect to the relay and start the forwarding task.
    ///
    /// Returns the sender that frames are submitted on. Connection failure
    /// is reported through [`LiveClient::state`] rather than here: the
    /// attempt runs on its own runtime and the session proceeds without a
    /// live view if it fails.
    #[instrument(name = "live_connect", skip(self))]
    pub fn connect(&mut self) -> TransportResult<Sender<LiveFrame>> {
        if self.state.read().is_connected() {
            return Err(TransportError::AlreadyConnected);
        }

        let url = publisher_url(&self.server_url, &self.room, &self.username)?;
        info!(url = %url, "Connecting to relay server");
        *self.state.write() = ConnectionState::Connecting;

        let runtime = Runtime::new().map_err(TransportError::Io)?;

        let (sender, receiver): (Sender<LiveFrame>, Receiver<LiveFrame>) =
            crossbeam_channel::bounded(FRAME_CHANNEL_CAPACITY);

        let state = Arc::clone(&self.state);
        let should_stop = Arc::clone(&self.should_stop);
        should_stop.store(false, Ordering::SeqCst);

        let api_url = self.api_url.clone();
        let room = self.room.clone();
        let username = self.username.clone();
        let frames_sent = Arc::clone(&self.frames_sent);
        let frames_dropped = Arc::clone(&self.frames_dropped);
        let bytes_sent = Arc::clone(&self.bytes_sent);

        runtime.spawn(async move {
            if let Err(e) = run_live_connection(
                url,
                api_url,
                room,
                username,
                receiver,
                state,
                should_stop,
                frames_sent,
                frames_dropped,
                bytes_sent,
            )
            .await
            {
                error!("Live connection error: {}", e);
            }
        });

        self.runtime = Some(runtime);
        self.frame_sender = Some(sender.clone());

        Ok(sender)
    }

    /// Disconnect from the relay. Safe to call more than once.
    #[instrument(name = "live_disconnect", skip(self))]
    pub fn disconnect(&mut self) -> TransportResult<()> {
        if self.runtime.is_none() && self.frame_sender.is_none() {
            return Ok(());
        }

        info!("Disconnecting from relay server");

        self.should_stop.store(true, Ordering::SeqCst);

        // Drop the frame sender to signal shutdown
        self.frame_sender = None;

        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(Duration::from_secs(5));
        }

        *self.state.write() = ConnectionState::Disconnected;

        info!("Disconnected from relay server");
        Ok(())
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.read().clone()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected()
    }

    /// Handle for observing the connection state from the frame producer.
    pub fn watch(&self) -> ConnectionWatch {
        ConnectionWatch::new(Arc::clone(&self.state))
    }

    /// Get transport statistics.
    pub fn statistics(&self) -> TransportStatistics {
        TransportStatistics {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

/// Transport statistics.
#[derive(Debug, Clone, Default)]
pub struct TransportStatistics {
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub bytes_sent: u64,
}

/// Build the publisher endpoint URL with room and identity query params.
fn publisher_url(server_url: &str, room: &str, username: &str) -> TransportResult<Url> {
    let mut url = Url::parse(server_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("room", room)
        .append_pair("role", "publisher")
        .append_pair("name", username);
    Ok(url)
}

#[allow(clippy::too_many_arguments)]
async fn run_live_connection(
    url: Url,
    api_url: String,
    room: String,
    username: String,
    receiver: Receiver<LiveFrame>,
    state: Arc<RwLock<ConnectionState>>,
    should_stop: Arc<AtomicBool>,
    frames_sent: Arc<AtomicU64>,
    frames_dropped: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
) -> TransportResult<()> {
    // Single attempt: a refused relay disables the live view, nothing more.
    let (ws, _response) = match connect_async(url.as_str()).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Relay connection failed: {}", e);
            *state.write() = ConnectionState::Failed {
                reason: e.to_string(),
            };
            return Err(TransportError::Connection(e.to_string()));
        }
    };

    info!("Relay connection established");
    *state.write() = ConnectionState::Connected;

    let (mut write, mut read) = ws.split();

    // Drain inbound messages so pings are answered and closes observed.
    tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Relay closed the connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Relay read error: {}", e);
                    break;
                }
            }
        }
    });

    let join = serde_json::to_string(&WireMessage::Join {
        username: &username,
        room: &room,
    })
    .map_err(|e| TransportError::Send(e.to_string()))?;
    write
        .send(Message::Text(join))
        .await
        .map_err(|e| TransportError::Send(e.to_string()))?;
    debug!(room = %room, username = %username, "Joined as publisher");

    register_stream(&api_url, &room, &username);

    loop {
        if should_stop.load(Ordering::SeqCst) {
            break;
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) => {
                let message = serde_json::to_string(&WireMessage::Frame {
                    user: &username,
                    room: &room,
                    data: BASE64.encode(&frame.jpeg),
                });
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Frame serialization failed: {}", e);
                        frames_dropped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                };

                let len = message.len() as u64;
                if let Err(e) = write.send(Message::Text(message)).await {
                    warn!("Send error: {}", e);
                    frames_dropped.fetch_add(1, Ordering::Relaxed);
                    *state.write() = ConnectionState::Failed {
                        reason: e.to_string(),
                    };
                    break;
                }
                frames_sent.fetch_add(1, Ordering::Relaxed);
                bytes_sent.fetch_add(len, Ordering::Relaxed);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Frame channel disconnected");
                break;
            }
        }
    }

    let _ = write.send(Message::Close(None)).await;
    unregister_stream(&api_url, &room, &username);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_websocket_url() {
        let result = LiveClient::new(
            "https://relay.example".to_string(),
            "https://api.example".to_string(),
            "standup".to_string(),
            "alice".to_string(),
        );
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_publisher_url_encodes_identity() {
        let url = publisher_url("wss://relay.example:8444", "standup", "alice smith").unwrap();
        assert_eq!(url.host_str(), Some("relay.example"));
        let query = url.query().unwrap();
        assert!(query.contains("room=standup"));
        assert!(query.contains("role=publisher"));
        assert!(query.contains("name=alice+smith"));
    }

    #[test]
    fn test_watch_tracks_connection_state() {
        let client = LiveClient::new(
            "wss://relay.example".to_string(),
            "https://api.example".to_string(),
            "standup".to_string(),
            "alice".to_string(),
        )
        .unwrap();
        let watch = client.watch();
        assert!(!watch.is_connected());

        *client.state.write() = ConnectionState::Connected;
        assert!(watch.is_connected());

        *client.state.write() = ConnectionState::Failed {
            reason: "relay gone".to_string(),
        };
        assert!(!watch.is_connected());
        assert!(watch.state().is_failed());
    }

    #[test]
    fn test_fresh_client_is_disconnected() {
        let client = LiveClient::new(
            "wss://relay.example".to_string(),
            "https://api.example".to_string(),
            "standup".to_string(),
            "alice".to_string(),
        )
        .unwrap();
        assert!(!client.is_connected());
        assert_eq!(client.statistics().frames_sent, 0);
    }
}
