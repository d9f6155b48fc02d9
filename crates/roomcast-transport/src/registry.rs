//! Stream registry side-calls.
//!
//! The API server keeps its own list of active publishers next to the relay.
//! These calls are best-effort: a failure is logged and never interrupts the
//! session.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

const REGISTRY_TIMEOUT: Duration = Duration::from_secs(5);

fn post_registry(api_url: &str, endpoint: &str, room: &str, username: &str) {
    let url = format!("{}/api/stream/{}", api_url.trim_end_matches('/'), endpoint);
    let body = json!({ "room": room, "username": username });

    let client = match reqwest::blocking::Client::builder()
        .timeout(REGISTRY_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Registry client build failed: {}", e);
            return;
        }
    };

    match client.post(&url).json(&body).send() {
        Ok(response) if response.status().is_success() => {
            debug!(url = %url, "Registry call succeeded");
        }
        Ok(response) => {
            warn!(url = %url, status = %response.status(), "Registry call rejected");
        }
        Err(e) => {
            warn!(url = %url, "Registry call failed: {}", e);
        }
    }
}

/// Announce the publisher to the API server. Fire-and-forget.
pub fn register_stream(api_url: &str, room: &str, username: &str) {
    let (api_url, room, username) = (api_url.to_string(), room.to_string(), username.to_string());
    std::thread::spawn(move || post_registry(&api_url, "register", &room, &username));
}

/// Remove the publisher from the API server's list. Fire-and-forget.
pub fn unregister_stream(api_url: &str, room: &str, username: &str) {
    let (api_url, room, username) = (api_url.to_string(), room.to_string(), username.to_string());
    std::thread::spawn(move || post_registry(&api_url, "unregister", &room, &username));
}
