// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-advance rectangular glyphs. Needs no font file, so it is what the
// CLI falls back to without `--font` and what tests render with.

use image::{GrayImage, Luma};

use super::{FontSpec, GlyphMask, GlyphRasterizer, TextMeasure};

/// Every character advances by `advance_em` of the font size; printable
/// characters draw as a solid bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockGlyphs {
    pub advance_em: f32,
}

impl Default for BlockGlyphs {
    fn default() -> Self {
        Self { advance_em: 0.5 }
    }
}

impl TextMeasure for BlockGlyphs {
    fn advance(&self, ch: char, font: &FontSpec) -> f32 {
        if ch == '\n' {
            0.0
        } else {
            font.size * self.advance_em
        }
    }
}

impl GlyphRasterizer for BlockGlyphs {
    fn rasterize(&self, ch: char, font: &FontSpec) -> GlyphMask {
        let advance = self.advance(ch, font);
        if ch.is_whitespace() || font.size <= 0.0 {
            return GlyphMask::empty(advance);
        }

        let weight = if font.bold { 0.9 } else { 0.8 };
        let width = (advance * weight).round().max(1.0) as u32;
        let height = (font.size * 0.7).round().max(1.0) as u32;
        let inset = ((advance - width as f32) / 2.0).floor() as i32;

        GlyphMask {
            coverage: GrayImage::from_pixel(width, height, Luma([255])),
            left: inset.max(0),
            top: -(height as i32),
            advance,
        }
    }
}
