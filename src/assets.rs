//! Data baked into the binary

use anyhow::{Context, Result};
use image::ImageFormat;
use std::path::Path;
use tracing::warn;

use crate::rotate::Bitmap;
use crate::ui::font::LabelFont;

/// The spinning icon, a 30x30 greyscale PNG.
const ICON_PNG: &[u8] = include_bytes!("../assets/icon.png");

/// Greetings shown one after another next to the icon.
pub const LABELS: [&str; 7] = [
    "UBNT Demo",
    "русский",
    "中文",
    "汉语",
    "漢語",
    "日本語",
    "にほんご",
];

/// Decode the embedded icon into an 8-bit intensity bitmap.
pub fn load_icon() -> Result<Bitmap> {
    decode_icon(ICON_PNG)
}

fn decode_icon(bytes: &[u8]) -> Result<Bitmap> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .context("icon is not a valid PNG")?;
    Ok(Bitmap::from(img.into_luma8()))
}

/// Load the outline font for labels, or `None` to keep the built-in mono font.
pub fn load_label_font(path: &Path, px_height: f32) -> Option<LabelFont> {
    match LabelFont::load(path, px_height) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("{:#}; labels use the built-in font", e);
            None
        }
    }
}
