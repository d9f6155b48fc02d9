//! JPEG encoding for the live-view path.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::io::Cursor;

use crate::ComposeResult;

/// Encode a composed frame as a JPEG still at the given quality (0-100).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> ComposeResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(image)?;
    Ok(buf.into_inner())
}
