//! Outline font for labels the built-in mono font cannot spell
//!
//! The mono font only carries Latin and Cyrillic. When a TrueType fallback
//! font is available, labels are rasterised through it instead so CJK and
//! kana glyphs come out as themselves.

use ab_glyph::{point, Font, FontVec, GlyphId, InvalidFont, PxScale, ScaleFont};
use anyhow::{Context, Result};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::fs;
use std::path::Path;
use tracing::info;

use super::TextAlign;

/// A TrueType/OpenType font scaled to one pixel height.
pub struct LabelFont {
    font: FontVec,
    scale: PxScale,
}

impl LabelFont {
    pub fn from_bytes(data: Vec<u8>, px_height: f32) -> Result<Self, InvalidFont> {
        let font = FontVec::try_from_vec(data)?;
        Ok(Self { font, scale: PxScale::from(px_height) })
    }

    /// Read and parse the font file at `path`.
    pub fn load(path: &Path, px_height: f32) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
        let font = Self::from_bytes(data, px_height)
            .with_context(|| format!("{} is not a usable font", path.display()))?;
        info!("Loaded label font {} ({} glyphs)", path.display(), font.font.glyph_count());
        Ok(font)
    }

    /// Whether every character of `text` has a glyph in this font.
    pub fn covers(&self, text: &str) -> bool {
        text.chars().all(|c| self.font.glyph_id(c) != GlyphId(0))
    }

    /// Rasterise `text` inside `area`, vertically centred, shading from
    /// `background` to `color` by glyph coverage.
    ///
    /// Returns `None` if a character is missing from the font.
    pub fn rasterize(
        &self,
        text: &str,
        area: Rectangle,
        align: TextAlign,
        color: Rgb888,
        background: Rgb888,
    ) -> Option<Vec<Pixel<Rgb888>>> {
        if !self.covers(text) {
            return None;
        }

        let scaled = self.font.as_scaled(self.scale);
        let ids: Vec<GlyphId> = text.chars().map(|c| self.font.glyph_id(c)).collect();
        let width: f32 = ids.iter().map(|&id| scaled.h_advance(id)).sum();

        let left = area.top_left.x as f32;
        let right = left + area.size.width as f32;
        let mut caret = match align {
            TextAlign::Left => left,
            TextAlign::Centered => left + (area.size.width as f32 - width) / 2.0,
            TextAlign::Right => right - width,
        };
        let middle = area.top_left.y as f32 + area.size.height as f32 / 2.0;
        let baseline = middle + (scaled.ascent() + scaled.descent()) / 2.0;

        let mut pixels = Vec::new();
        for id in ids {
            let glyph = id.with_scale_and_position(self.scale, point(caret, baseline));
            caret += scaled.h_advance(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, coverage| {
                if coverage <= 0.0 {
                    return;
                }
                let at = Point::new(bounds.min.x as i32 + x as i32, bounds.min.y as i32 + y as i32);
                pixels.push(Pixel(at, shade(background, color, coverage)));
            });
        }
        Some(pixels)
    }
}

fn shade(from: Rgb888, to: Rgb888, coverage: f32) -> Rgb888 {
    let t = coverage.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    Rgb888::new(mix(from.r(), to.r()), mix(from.g(), to.g()), mix(from.b(), to.b()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small font with blocky glyphs for the CJK and kana labels only.
    pub(crate) const CJK_SUBSET: &[u8] = include_bytes!("../../assets/testdata/cjk-subset.ttf");

    pub(crate) fn cjk_font() -> LabelFont {
        LabelFont::from_bytes(CJK_SUBSET.to_vec(), 20.0).unwrap()
    }

    fn cell() -> Rectangle {
        Rectangle::new(Point::new(0, 0), Size::new(110, 30))
    }

    #[test]
    fn coverage_follows_the_cmap() {
        let font = cjk_font();
        assert!(font.covers("中文"));
        assert!(font.covers("にほんご"));
        assert!(!font.covers("UBNT Demo"));
        assert!(!font.covers("русский"));
    }

    #[test]
    fn missing_glyph_declines_to_rasterize() {
        let font = cjk_font();
        assert!(font.rasterize("中a", cell(), TextAlign::Centered, Rgb888::WHITE, Rgb888::BLACK).is_none());
    }

    #[test]
    fn different_characters_give_different_pixels() {
        let font = cjk_font();
        let draw = |text: &str| {
            font.rasterize(text, cell(), TextAlign::Centered, Rgb888::WHITE, Rgb888::BLACK)
                .unwrap()
        };
        let zhongwen = draw("中文");
        assert!(!zhongwen.is_empty());
        assert_ne!(zhongwen, draw("汉语"));
        assert_ne!(draw("日本語"), draw("にほんご"));
    }

    #[test]
    fn centred_text_stays_inside_the_cell() {
        let font = cjk_font();
        let pixels = font.rasterize("漢語", cell(), TextAlign::Centered, Rgb888::WHITE, Rgb888::BLACK).unwrap();
        assert!(pixels.iter().all(|Pixel(p, _)| (0..110).contains(&p.x) && (0..30).contains(&p.y)));
        let min_x = pixels.iter().map(|Pixel(p, _)| p.x).min().unwrap();
        let max_x = pixels.iter().map(|Pixel(p, _)| p.x).max().unwrap();
        // two 20px glyphs centred in 110px
        assert!((30..=40).contains(&min_x), "min_x {min_x}");
        assert!((70..=80).contains(&max_x), "max_x {max_x}");
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(LabelFont::load(Path::new("/nonexistent/font.ttf"), 16.0).is_err());
        assert!(LabelFont::from_bytes(b"not a font".to_vec(), 16.0).is_err());
    }

    #[test]
    fn shade_blends_by_coverage() {
        assert_eq!(shade(Rgb888::BLACK, Rgb888::WHITE, 1.0), Rgb888::WHITE);
        assert_eq!(shade(Rgb888::BLACK, Rgb888::WHITE, 0.5), Rgb888::new(128, 128, 128));
        assert_eq!(shade(Rgb888::new(10, 20, 30), Rgb888::WHITE, 0.0), Rgb888::new(10, 20, 30));
    }
}
