//! Grid layout and size capping.

use image::{imageops, imageops::FilterType, RgbImage};

use crate::{ComposeError, ComposeResult};

/// Combine one cycle's frames into a single image.
///
/// A single frame passes through unchanged. Multiple frames are arranged in
/// a grid with `columns = ceil(sqrt(n))`; every frame is resized to the
/// minimum input height (aspect preserved) and missing cells are padded with
/// black, then rows are concatenated horizontally and stacked vertically.
pub fn compose_grid(frames: &[RgbImage]) -> ComposeResult<RgbImage> {
    match frames {
        [] => Err(ComposeError::EmptyInput),
        [single] => Ok(single.clone()),
        _ => Ok(compose_many(frames)),
    }
}

fn compose_many(frames: &[RgbImage]) -> RgbImage {
    let columns = (frames.len() as f64).sqrt().ceil() as usize;
    let rows = frames.len().div_ceil(columns);

    let target_height = frames.iter().map(RgbImage::height).min().unwrap_or(1).max(1);

    let mut resized: Vec<RgbImage> = frames
        .iter()
        .map(|frame| {
            if frame.height() == target_height {
                frame.clone()
            } else {
                let ratio = target_height as f64 / frame.height() as f64;
                let new_width = ((frame.width() as f64 * ratio) as u32).max(1);
                imageops::resize(frame, new_width, target_height, FilterType::Triangle)
            }
        })
        .collect();

    // Pad the trailing cells with black frames matching the first cell.
    let pad = rows * columns - resized.len();
    if pad > 0 {
        let black = RgbImage::new(resized[0].width(), resized[0].height());
        resized.extend(std::iter::repeat(black).take(pad));
    }

    let row_images: Vec<RgbImage> = resized
        .chunks(columns)
        .map(|row| hconcat(row, target_height))
        .collect();

    vconcat(&row_images)
}

/// Concatenate a row of equal-height frames side by side.
fn hconcat(row: &[RgbImage], height: u32) -> RgbImage {
    let width: u32 = row.iter().map(RgbImage::width).sum();
    let mut out = RgbImage::new(width.max(1), height);

    let mut x = 0i64;
    for frame in row {
        imageops::overlay(&mut out, frame, x, 0);
        x += i64::from(frame.width());
    }
    out
}

/// Stack rows vertically, padding narrower rows with black on the right.
fn vconcat(rows: &[RgbImage]) -> RgbImage {
    let width = rows.iter().map(RgbImage::width).max().unwrap_or(1);
    let height: u32 = rows.iter().map(RgbImage::height).sum();
    let mut out = RgbImage::new(width, height.max(1));

    let mut y = 0i64;
    for row in rows {
        imageops::overlay(&mut out, row, 0, y);
        y += i64::from(row.height());
    }
    out
}

/// Uniformly downscale `image` so it fits within `max_width` × `max_height`.
///
/// Images already within bounds are returned untouched. The scale factor is
/// `min(max_w/w, max_h/h)`, so aspect ratio is preserved within rounding;
/// the triangle filter averages source pixels, which keeps shrunk text
/// legible.
pub fn shrink_to_fit(image: RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width <= max_width && height <= max_height {
        return image;
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);

    imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}
