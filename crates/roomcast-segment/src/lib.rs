//! MP4 segment writing.
//!
//! Each segment is encoded by a dedicated ffmpeg child process: raw rgb24
//! frames are piped over stdin and ffmpeg produces an H.264 MP4 with the
//! moov atom up front. Rotation is the engine's concern; this crate only
//! knows how to open, feed, and finalize a single segment.

mod error;
mod naming;
mod writer;

pub use error::SegmentError;
pub use naming::segment_file_name;
pub use writer::SegmentWriter;

/// Result type for segment operations.
pub type SegmentResult<T> = Result<T, SegmentError>;
