//! Origin API storage backend.
//!
//! Posts the segment to `{api}/api/recordings/upload` as a multipart form.
//! The server decides where the file finally lands and may answer with a
//! Drive link of its own, which we surface when present.

use std::path::Path;

use chrono::Utc;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use roomcast_ipc::StorageTier;

use crate::store::{SegmentMeta, SegmentStore};
use crate::{UploadError, UploadResult};

/// Uploads segments to the recording API server.
pub struct OriginStore {
    api_url: String,
    client: Client,
}

impl OriginStore {
    /// Create an origin backend with the given upload timeout.
    pub fn new(api_url: String, timeout: Duration) -> UploadResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { api_url, client })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/api/recordings/upload",
            self.api_url.trim_end_matches('/')
        )
    }
}

/// Pull a viewing link out of the server's response, whichever key the
/// deployed server version uses.
fn extract_link(body: &Value) -> Option<String> {
    ["driveWebLink", "webViewLink", "googleDriveLink"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

impl SegmentStore for OriginStore {
    fn tier(&self) -> StorageTier {
        StorageTier::Origin
    }

    fn put(&self, meta: &SegmentMeta, path: &Path) -> UploadResult<Option<String>> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("part{}.mp4", meta.part_number));
        let bytes = std::fs::read(path)?;
        let size = bytes.len();

        let video = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("video/mp4")
            .map_err(UploadError::Http)?;
        let form = Form::new()
            .text("username", meta.username.clone())
            .text("roomName", meta.room.clone())
            .text("timestamp", Utc::now().timestamp_millis().to_string())
            .part("video", video);

        debug!(url = %self.upload_url(), file = %file_name, size, "Posting segment to origin");
        let response = self.client.post(self.upload_url()).multipart(form).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        // A 2xx with an unparseable body still counts as stored.
        let link = match response.json::<Value>() {
            Ok(body) => {
                if let Some(storage) = body.get("storage").and_then(Value::as_str) {
                    info!(file = %file_name, storage, "Segment stored by origin");
                }
                extract_link(&body)
            }
            Err(e) => {
                warn!("Origin response body was not JSON: {}", e);
                None
            }
        };

        Ok(link)
    }
}
