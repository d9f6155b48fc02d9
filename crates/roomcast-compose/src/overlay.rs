//! Identity/clock overlay drawing.

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::sync::OnceLock;

use crate::{ComposeError, ComposeResult};

const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const LABEL_SCALE: f32 = 24.0;
const MARGIN: i32 = 12;
const PADDING_X: i32 = 18;
const PADDING_Y: i32 = 12;
const BORDER_PX: i32 = 2;

const FILL: Rgb<u8> = Rgb([0, 0, 0]);
const ACCENT: Rgb<u8> = Rgb([96, 165, 250]);
const TEXT: Rgb<u8> = Rgb([255, 255, 255]);

fn font() -> ComposeResult<&'static FontRef<'static>> {
    static FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();
    FONT.get_or_init(|| FontRef::try_from_slice(FONT_BYTES).ok())
        .as_ref()
        .ok_or_else(|| ComposeError::Font("embedded font did not parse".to_string()))
}

/// Burn the `"{identity} | {HH:MM:SS}"` label into the top-left corner:
/// a filled rectangle sized to the text with a 2 px accent border, then the
/// label in white, centered within the rectangle's padding.
pub fn draw_identity_overlay(image: &mut RgbImage, label: &str) -> ComposeResult<()> {
    let font = font()?;
    let scale = PxScale::from(LABEL_SCALE);

    let (text_w, text_h) = text_size(scale, font, label);
    let rect_w = text_w as i32 + PADDING_X * 2;
    let rect_h = text_h as i32 + PADDING_Y * 2;

    draw_filled_rect_mut(
        image,
        Rect::at(MARGIN, MARGIN).of_size(rect_w as u32, rect_h as u32),
        FILL,
    );
    for inset in 0..BORDER_PX {
        draw_hollow_rect_mut(
            image,
            Rect::at(MARGIN + inset, MARGIN + inset)
                .of_size((rect_w - inset * 2) as u32, (rect_h - inset * 2) as u32),
            ACCENT,
        );
    }

    draw_text_mut(
        image,
        TEXT,
        MARGIN + PADDING_X,
        MARGIN + PADDING_Y,
        scale,
        font,
        label,
    );

    Ok(())
}
