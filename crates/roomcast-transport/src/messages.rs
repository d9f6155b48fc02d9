//! Wire messages understood by the relay server.

use serde::Serialize;

/// Outbound JSON messages. The server routes on the `type` field.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage<'a> {
    /// Announces the publisher after the socket opens.
    Join { username: &'a str, room: &'a str },

    /// One composed frame, JPEG bytes encoded as base64.
    Frame {
        user: &'a str,
        room: &'a str,
        data: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_message_shape() {
        let msg = WireMessage::Join {
            username: "alice",
            room: "standup",
        };
        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(json["type"], "join");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["room"], "standup");
    }

    #[test]
    fn test_frame_message_shape() {
        let msg = WireMessage::Frame {
            user: "alice",
            room: "standup",
            data: "aGVsbG8=".to_string(),
        };
        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(json["type"], "frame");
        assert_eq!(json["user"], "alice");
        assert_eq!(json["data"], "aGVsbG8=");
    }
}
