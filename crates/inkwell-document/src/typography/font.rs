// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TrueType/OpenType glyph source backed by `ab_glyph`.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{GrayImage, Luma};
use inkwell_core::error::{InkwellError, Result};
use tracing::{info, instrument};

use super::{FontSpec, GlyphMask, GlyphRasterizer, TextMeasure, embolden, shear, synthetic_bold_px};

/// Slant applied when italics are requested but no italic face is loaded.
const SYNTHETIC_SLANT: f32 = 0.2;

/// A handwriting family: a regular face plus optional bold, italic, and
/// bold-italic faces. Missing styles are synthesised from the closest face.
#[derive(Clone)]
pub struct FontGlyphs {
    family: String,
    regular: FontArc,
    bold: Option<FontArc>,
    italic: Option<FontArc>,
    bold_italic: Option<FontArc>,
}

impl std::fmt::Debug for FontGlyphs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontGlyphs")
            .field("family", &self.family)
            .field("bold", &self.bold.is_some())
            .field("italic", &self.italic.is_some())
            .field("bold_italic", &self.bold_italic.is_some())
            .finish()
    }
}

fn parse_face(data: Vec<u8>) -> Result<FontArc> {
    FontArc::try_from_vec(data).map_err(|err| InkwellError::Font(err.to_string()))
}

fn read_face(path: &Path) -> Result<FontArc> {
    let data = std::fs::read(path)?;
    FontArc::try_from_vec(data)
        .map_err(|err| InkwellError::Font(format!("{}: {}", path.display(), err)))
}

impl FontGlyphs {
    /// Load the regular face from bytes.
    pub fn from_bytes(family: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            family: family.into(),
            regular: parse_face(data)?,
            bold: None,
            italic: None,
            bold_italic: None,
        })
    }

    /// Load the regular face from a font file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(family: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let regular = read_face(path.as_ref())?;
        let family = family.into();
        info!(family = %family, "Font loaded");
        Ok(Self {
            family,
            regular,
            bold: None,
            italic: None,
            bold_italic: None,
        })
    }

    pub fn with_bold(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.bold = Some(read_face(path.as_ref())?);
        Ok(self)
    }

    pub fn with_italic(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.italic = Some(read_face(path.as_ref())?);
        Ok(self)
    }

    pub fn with_bold_italic(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.bold_italic = Some(read_face(path.as_ref())?);
        Ok(self)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// The face to draw with, and whether bold/italic still need synthesising.
    fn face(&self, font: &FontSpec) -> (&FontArc, bool, bool) {
        match (font.bold, font.italic) {
            (true, true) => match (&self.bold_italic, &self.bold, &self.italic) {
                (Some(face), _, _) => (face, false, false),
                (None, Some(face), _) => (face, false, true),
                (None, None, Some(face)) => (face, true, false),
                (None, None, None) => (&self.regular, true, true),
            },
            (true, false) => match &self.bold {
                Some(face) => (face, false, false),
                None => (&self.regular, true, false),
            },
            (false, true) => match &self.italic {
                Some(face) => (face, false, false),
                None => (&self.regular, false, true),
            },
            (false, false) => (&self.regular, false, false),
        }
    }
}

/// Scale so that `size` is the em size, matching how CSS sizes text.
fn px_scale(face: &FontArc, size: f32) -> PxScale {
    let units_per_em = face.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * face.height_unscaled() / units_per_em)
}

impl TextMeasure for FontGlyphs {
    fn advance(&self, ch: char, font: &FontSpec) -> f32 {
        if ch == '\n' {
            return 0.0;
        }
        let (face, fake_bold, _) = self.face(font);
        let scaled = face.as_scaled(px_scale(face, font.size));
        let advance = scaled.h_advance(face.glyph_id(ch));
        if fake_bold {
            advance + synthetic_bold_px(font.size) as f32
        } else {
            advance
        }
    }
}

impl GlyphRasterizer for FontGlyphs {
    fn rasterize(&self, ch: char, font: &FontSpec) -> GlyphMask {
        let advance = self.advance(ch, font);
        let (face, fake_bold, fake_italic) = self.face(font);
        let scale = px_scale(face, font.size);
        let glyph = face
            .glyph_id(ch)
            .with_scale_and_position(scale, point(0.0, 0.0));

        let Some(outlined) = face.outline_glyph(glyph) else {
            return GlyphMask::empty(advance);
        };

        let bounds = outlined.px_bounds();
        let width = bounds.width().ceil().max(1.0) as u32;
        let height = bounds.height().ceil().max(1.0) as u32;
        let mut coverage = GrayImage::new(width, height);
        outlined.draw(|x, y, c| {
            if x < width && y < height {
                let value = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                coverage.put_pixel(x, y, Luma([value]));
            }
        });

        let mut left = bounds.min.x.floor() as i32;
        let top = bounds.min.y.floor() as i32;
        if fake_bold {
            coverage = embolden(&coverage, synthetic_bold_px(font.size));
        }
        if fake_italic {
            let (slanted, shift) = shear(&coverage, -top, SYNTHETIC_SLANT);
            coverage = slanted;
            left += shift;
        }

        GlyphMask {
            coverage,
            left,
            top,
            advance,
        }
    }
}
