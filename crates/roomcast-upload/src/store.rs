//! Storage backend abstraction.

use std::path::Path;

use roomcast_ipc::StorageTier;

use crate::UploadResult;

/// Identifies the segment being uploaded.
#[derive(Debug, Clone)]
pub struct SegmentMeta {
    /// Room the session belongs to.
    pub room: String,

    /// Publisher identity.
    pub username: String,

    /// Sequence number within the session, starting at 1.
    pub part_number: u32,
}

/// One storage backend a finished segment can be handed to.
///
/// Backends are tried in pipeline order; `put` returning `Ok` means the
/// segment is durably stored and the local file may be deleted. The pipeline
/// is shared between the rotation timer and the capture worker, so backends
/// take `&self` and must be `Sync`.
pub trait SegmentStore: Send + Sync {
    /// Tier this backend represents.
    fn tier(&self) -> StorageTier;

    /// Store the segment, returning a viewing link when the backend has one.
    fn put(&self, meta: &SegmentMeta, path: &Path) -> UploadResult<Option<String>>;
}
