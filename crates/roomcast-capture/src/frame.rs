//! Raw frame type produced by the grabber.

use image::RgbImage;

/// A raw frame grabbed from one monitor, already in 3-channel RGB.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Pixel data.
    pub image: RgbImage,

    /// Zero-based index of the monitor this frame came from.
    pub monitor_index: usize,
}

impl RawFrame {
    /// Create a raw frame from an RGB buffer.
    pub fn new(image: RgbImage, monitor_index: usize) -> Self {
        Self {
            image,
            monitor_index,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
