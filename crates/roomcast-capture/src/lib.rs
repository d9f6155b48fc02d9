//! Monitor enumeration and per-cycle screen grabs.
//!
//! This crate wraps the OS capture handles for one or more monitors and
//! produces raw pixel buffers on demand, one grab per source per cycle.

mod error;
mod frame;
mod grabber;
mod monitor;

pub use error::CaptureError;
pub use frame::RawFrame;
pub use grabber::MonitorGrabber;
pub use monitor::enumerate_monitors;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A source of raw frames, one per configured monitor per call.
///
/// Grabs are sequential; no hard synchronization is guaranteed across
/// monitors. A failed cycle returns an error and produces no frames.
pub trait FrameSource: Send {
    /// Capture one raw frame per source.
    fn capture(&mut self) -> CaptureResult<Vec<RawFrame>>;

    /// Number of sources this grabber covers.
    fn source_count(&self) -> usize;
}
