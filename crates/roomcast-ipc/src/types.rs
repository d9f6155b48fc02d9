//! Common types used across recorder messages.

use serde::{Deserialize, Serialize};

/// Configuration for starting a recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// WebSocket server URL for the live view (e.g., "wss://stream.example.com:8444").
    pub server_url: String,

    /// HTTP API base URL for uploads and registration side-calls.
    pub api_url: String,

    /// Room the session publishes into.
    pub room: String,

    /// Display name of the operator.
    pub username: String,

    /// Zero-based indexes of the monitors to capture.
    pub monitors: Vec<usize>,

    /// Target capture frame rate in frames per second.
    pub frame_rate: u32,

    /// JPEG quality for live frames (0-100).
    pub jpeg_quality: u8,

    /// Maximum composed output width in pixels.
    pub max_width: u32,

    /// Maximum composed output height in pixels.
    pub max_height: u32,

    /// Seconds of recording per segment before the periodic flush rotates it.
    pub segment_secs: u64,

    /// Timeout for a single upload attempt, in seconds.
    pub upload_timeout_secs: u64,

    /// Cloud storage credentials; `None` disables the cloud tier.
    pub drive: Option<DriveSettings>,
}

/// Credentials for the direct-to-Drive upload tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveSettings {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub root_folder_id: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            api_url: String::new(),
            room: String::new(),
            username: String::new(),
            monitors: vec![0],
            frame_rate: 12,
            jpeg_quality: 80,
            max_width: 1920,
            max_height: 1080,
            segment_secs: 300,
            upload_timeout_secs: 600,
            drive: None,
        }
    }
}

/// A capturable monitor, as shown to the operator before recording starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorInfo {
    /// Zero-based monitor index.
    pub index: usize,

    /// Display name reported by the OS.
    pub name: String,

    /// Origin offset of the monitor in the virtual desktop.
    pub x: i32,
    pub y: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Whether this is the primary monitor.
    pub is_primary: bool,
}

/// Rolling session statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames composed since the session started.
    pub frames: u64,

    /// Frames sent over the live transport.
    pub frames_sent: u64,

    /// Rolling frames per second.
    pub fps: f32,

    /// Segments handed to the upload pipeline so far.
    pub parts_uploaded: u32,

    /// Session uptime in seconds.
    pub uptime_seconds: u64,
}

/// Where a finished segment ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageTier {
    /// Delivered to cloud storage.
    Cloud,

    /// Delivered to the origin server over HTTP.
    Origin,

    /// All tiers failed; the file stays on local disk.
    Retained,
}

impl StorageTier {
    /// Display name for logs and status lines.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Origin => "origin",
            Self::Retained => "retained",
        }
    }
}

/// Outcome of one segment upload, as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    /// Part number of the segment within the session.
    pub part_number: u32,

    /// Whether any tier confirmed persistence.
    pub success: bool,

    /// Tier that took the segment (or `Retained`).
    pub tier: StorageTier,

    /// Web link to the stored file, when the storage backend returned one.
    pub link: Option<String>,
}
