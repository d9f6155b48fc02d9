//! Segment upload with tiered fallback.
//!
//! A finished segment is offered to each configured backend in order:
//! direct Drive upload first when credentials are present, then the
//! origin API server. The local file is deleted only after a backend
//! confirms the segment is stored; if every tier fails the file stays
//! where it is.

mod drive;
mod error;
mod origin;
mod pipeline;
mod store;

pub use drive::{DriveConfig, DriveStore};
pub use error::UploadError;
pub use origin::OriginStore;
pub use pipeline::UploadPipeline;
pub use store::{SegmentMeta, SegmentStore};

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;
