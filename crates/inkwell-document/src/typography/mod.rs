// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typography services — text measurement, glyph rasterization, and math
// typesetting. Layout depends only on `TextMeasure`; the compositor needs the
// full `GlyphRasterizer`.

pub mod block;
pub mod font;
pub mod math;

use image::{GrayImage, Luma};

pub use block::BlockGlyphs;
pub use font::FontGlyphs;
pub use math::{MathGlyph, MathTypesetter, SymbolTypesetter, TypesetError, TypesetFormula};

/// The face and size a piece of text is set in. Sizes are in pixels of
/// whatever surface the caller is working in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    pub fn regular(size: f32) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
        }
    }

    /// Same face at a different size.
    pub fn sized(self, size: f32) -> Self {
        Self { size, ..self }
    }
}

/// Rendered width of text. Implementations must be cheap to call per word.
pub trait TextMeasure: Send + Sync {
    /// Horizontal advance of one character.
    fn advance(&self, ch: char, font: &FontSpec) -> f32;

    /// Width of a string: the sum of its advances, without kerning.
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().map(|ch| self.advance(ch, font)).sum()
    }
}

/// Produces coverage masks for individual characters.
pub trait GlyphRasterizer: TextMeasure {
    fn rasterize(&self, ch: char, font: &FontSpec) -> GlyphMask;
}

/// An 8-bit coverage bitmap for one glyph.
///
/// `left`/`top` place the bitmap's top-left corner relative to the pen
/// position on the baseline, so `top` is negative for anything drawn above it.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub coverage: GrayImage,
    pub left: i32,
    pub top: i32,
    pub advance: f32,
}

impl GlyphMask {
    /// A glyph with nothing to draw (whitespace, missing outlines).
    pub fn empty(advance: f32) -> Self {
        Self {
            coverage: GrayImage::new(0, 0),
            left: 0,
            top: 0,
            advance,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.coverage.width() == 0 || self.coverage.height() == 0
    }
}

// -- Mask helpers -------------------------------------------------------------

/// Stroke widening for synthetic bold at an em size: one pixel per 16 px,
/// never less than one.
pub fn synthetic_bold_px(size: f32) -> u32 {
    (size / 16.0).round().max(1.0) as u32
}

/// Thicken a mask horizontally by `px` pixels (max filter). Used for synthetic
/// bold and pen-pressure stroke weight.
pub fn embolden(mask: &GrayImage, px: u32) -> GrayImage {
    if px == 0 || mask.width() == 0 {
        return mask.clone();
    }
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w + px, h);
    for y in 0..h {
        for x in 0..w + px {
            let from = x.saturating_sub(px);
            let to = x.min(w - 1);
            let value = (from..=to)
                .map(|sx| mask.get_pixel(sx, y).0[0])
                .max()
                .unwrap_or(0);
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// Slant a mask to the right, pivoting on `baseline_row`. Used for synthetic
/// italics. Returns the sheared mask and how far its left edge moved.
pub fn shear(mask: &GrayImage, baseline_row: i32, slant: f32) -> (GrayImage, i32) {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return (mask.clone(), 0);
    }
    let shift_at = |row: i32| ((baseline_row - row) as f32 * slant).round() as i32;
    let top_shift = shift_at(0);
    let bottom_shift = shift_at(h as i32 - 1);
    let min_shift = top_shift.min(bottom_shift);
    let extra = (top_shift - bottom_shift).unsigned_abs();

    let mut out = GrayImage::new(w + extra, h);
    for y in 0..h {
        let dx = shift_at(y as i32) - min_shift;
        for x in 0..w {
            let value = mask.get_pixel(x, y).0[0];
            if value > 0 {
                out.put_pixel((x as i32 + dx) as u32, y, Luma([value]));
            }
        }
    }
    (out, min_shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_bold_grows_with_size() {
        assert_eq!(synthetic_bold_px(8.0), 1);
        assert_eq!(synthetic_bold_px(16.0), 1);
        assert_eq!(synthetic_bold_px(48.0), 3);
        assert_eq!(synthetic_bold_px(512.0), 32);
        assert!(synthetic_bold_px(96.0) > synthetic_bold_px(24.0));
    }

    #[test]
    fn embolden_widens_and_keeps_coverage() {
        let mut mask = GrayImage::new(3, 1);
        mask.put_pixel(1, 0, Luma([200]));
        let bold = embolden(&mask, 1);
        assert_eq!(bold.dimensions(), (4, 1));
        assert_eq!(bold.get_pixel(1, 0).0[0], 200);
        assert_eq!(bold.get_pixel(2, 0).0[0], 200);
        assert_eq!(bold.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn shear_moves_top_rows_right() {
        let mut mask = GrayImage::new(1, 5);
        for y in 0..5 {
            mask.put_pixel(0, y, Luma([255]));
        }
        let (slanted, shift) = shear(&mask, 4, 0.5);
        assert_eq!(shift, 0);
        assert_eq!(slanted.width(), 3);
        assert_eq!(slanted.get_pixel(2, 0).0[0], 255);
        assert_eq!(slanted.get_pixel(0, 4).0[0], 255);
    }

    #[test]
    fn measure_sums_advances() {
        let glyphs = BlockGlyphs::default();
        let font = FontSpec::regular(10.0);
        assert_eq!(glyphs.measure("abcd", &font), 4.0 * glyphs.advance('a', &font));
    }
}
