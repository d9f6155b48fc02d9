//! Direct-to-Drive storage backend.
//!
//! Segments land under `{root}/{room}/{username}/{YYYY-MM-DD}/`, with each
//! folder looked up before it is created. Uploads use the resumable
//! protocol: initiate with metadata, then PUT the file bytes to the session
//! URI Drive hands back.

use std::path::Path;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use roomcast_ipc::StorageTier;

use crate::store::{SegmentMeta, SegmentStore};
use crate::{UploadError, UploadResult};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// OAuth and folder configuration for the Drive backend.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub root_folder_id: String,
}

/// Uploads segments straight to Drive using a long-lived refresh token.
pub struct DriveStore {
    config: DriveConfig,
    client: Client,
    access_token: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
    #[serde(rename = "webViewLink")]
    web_view_link: Option<String>,
}

impl DriveStore {
    /// Create a Drive backend with the given upload timeout.
    pub fn new(config: DriveConfig, timeout: Duration) -> UploadResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            config,
            client,
            access_token: Mutex::new(None),
        })
    }

    /// Exchange the refresh token for an access token, caching it for the
    /// rest of the session.
    fn token(&self) -> UploadResult<String> {
        let mut cached = self.access_token.lock();
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        debug!("Refreshing Drive access token");
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(UploadError::Auth(format!(
                "token refresh returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json()?;
        *cached = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    /// Look a folder up under `parent`, creating it when absent.
    fn find_or_create_folder(
        &self,
        token: &str,
        parent: &str,
        name: &str,
    ) -> UploadResult<String> {
        let query = format!(
            "'{}' in parents and name='{}' and mimeType='{}' and trashed=false",
            parent,
            name.replace('\'', "\\'"),
            FOLDER_MIME
        );
        let list: FileList = self
            .client
            .get(FILES_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
            ])
            .send()?
            .error_for_status()
            .map_err(|e| UploadError::Folder(format!("lookup of '{}' failed: {}", name, e)))?
            .json()?;

        if let Some(found) = list.files.first() {
            return Ok(found.id.clone());
        }

        let metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME,
            "parents": [parent],
        });
        let created: DriveFile = self
            .client
            .post(FILES_URL)
            .bearer_auth(token)
            .query(&[("fields", "id")])
            .json(&metadata)
            .send()?
            .error_for_status()
            .map_err(|e| UploadError::Folder(format!("create of '{}' failed: {}", name, e)))?
            .json()?;

        debug!(folder = %name, id = %created.id, "Created Drive folder");
        Ok(created.id)
    }

    /// Resolve `{root}/{room}/{username}/{YYYY-MM-DD}`.
    fn session_folder(&self, token: &str, meta: &SegmentMeta) -> UploadResult<String> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let room = self.find_or_create_folder(token, &self.config.root_folder_id, &meta.room)?;
        let user = self.find_or_create_folder(token, &room, &meta.username)?;
        self.find_or_create_folder(token, &user, &date)
    }
}

impl SegmentStore for DriveStore {
    fn tier(&self) -> StorageTier {
        StorageTier::Cloud
    }

    fn put(&self, meta: &SegmentMeta, path: &Path) -> UploadResult<Option<String>> {
        let token = self.token()?;
        let folder = self.session_folder(&token, meta)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("part{}.mp4", meta.part_number));
        let bytes = std::fs::read(path)?;

        // Initiate the resumable session, then PUT the bytes to the
        // session URI from the Location header.
        let metadata = json!({ "name": file_name, "parents": [folder] });
        let initiate = self
            .client
            .post(UPLOAD_URL)
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "resumable"),
                ("fields", "id, name, webViewLink"),
            ])
            .header("X-Upload-Content-Type", "video/mp4")
            .json(&metadata)
            .send()?;

        if !initiate.status().is_success() {
            let status = initiate.status().as_u16();
            let body = initiate.text().unwrap_or_default();
            return Err(UploadError::Rejected { status, body });
        }

        let session_uri = initiate
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| UploadError::Auth("resumable session missing location".to_string()))?;

        let response = self
            .client
            .put(&session_uri)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(UploadError::Rejected { status, body });
        }

        let uploaded: DriveFile = response.json()?;
        info!(id = %uploaded.id, file = %file_name, "Segment stored in Drive");
        Ok(uploaded.web_view_link)
    }
}
