//! Grid compositing, downscaling, and identity overlay.
//!
//! Pure functions over 3-channel frames: combine the raw grabs of one cycle
//! into a single image, cap its size, and burn the operator/clock label into
//! the top-left corner. Nothing here touches I/O except the JPEG encoder for
//! the live path.

mod error;
mod grid;
mod jpeg;
mod overlay;

pub use error::ComposeError;
pub use grid::{compose_grid, shrink_to_fit};
pub use jpeg::encode_jpeg;
pub use overlay::draw_identity_overlay;

/// Result type for compositor operations.
pub type ComposeResult<T> = Result<T, ComposeError>;
