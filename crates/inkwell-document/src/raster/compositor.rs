// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster compositor — paints paper, then every draw instruction, back to
// front. Each character passes through the realism modulator on its way
// to the surface.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use inkwell_core::config::{EffectConfig, StyleConfig};
use inkwell_core::types::Color;
use rand::Rng;
use tracing::{debug, instrument};

use super::paper::{blank_sheet, paint_paper};
use super::{blend_mask, fill_rect};
use crate::layout::{DrawInstruction, GlyphRun, MathPlacement, PageGeometry};
use crate::realism::{GlyphTransform, RealismModulator};
use crate::typography::{GlyphMask, GlyphRasterizer, embolden};

/// Formulas are drawn at this multiple of the surface resolution, then reduced.
pub const MATH_SUPERSAMPLE: f32 = 2.0;

const HIGHLIGHT_COLOR: Color = Color::rgb(0xff, 0xeb, 0x3b);
const HIGHLIGHT_ALPHA: f32 = 0.45;

/// Paints draw instructions with a glyph rasterizer at a fixed output scale.
pub struct Compositor<'a, G: GlyphRasterizer + ?Sized> {
    glyphs: &'a G,
    scale: f32,
}

/// Wobble phase and character index of the line being drawn.
struct LineCursor {
    line: Option<usize>,
    phase: f32,
    index: usize,
}

impl<'a, G: GlyphRasterizer + ?Sized> Compositor<'a, G> {
    /// `scale` is surface pixels per logical pixel.
    pub fn new(glyphs: &'a G, scale: f32) -> Self {
        Self { glyphs, scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Surface size for a page.
    pub fn surface_size(&self, geometry: &PageGeometry) -> (u32, u32) {
        (
            (geometry.width * self.scale).round().max(1.0) as u32,
            (geometry.height * self.scale).round().max(1.0) as u32,
        )
    }

    /// Paint a page: paper, ruling and margin rules, highlights, text and
    /// formulas, then underline and strike-through.
    #[instrument(skip_all, fields(instructions = instructions.len(), scale = self.scale))]
    pub fn composite<R: Rng + ?Sized>(
        &self,
        instructions: &[DrawInstruction],
        style: &StyleConfig,
        geometry: &PageGeometry,
        effects: &EffectConfig,
        rng: &mut R,
    ) -> RgbaImage {
        let (width, height) = self.surface_size(geometry);
        let mut canvas = blank_sheet(width, height, style.paper_color);
        paint_paper(&mut canvas, style, geometry, self.scale);

        for instruction in instructions {
            if let DrawInstruction::Glyphs(run) = instruction {
                if run.decoration.highlight {
                    self.highlight(&mut canvas, run);
                }
            }
        }

        let modulator = RealismModulator::new(effects);
        let mut cursor = LineCursor {
            line: None,
            phase: 0.0,
            index: 0,
        };
        for instruction in instructions {
            if cursor.line != Some(instruction.line()) {
                cursor = LineCursor {
                    line: Some(instruction.line()),
                    phase: modulator.line_phase(rng),
                    index: 0,
                };
            }
            match instruction {
                DrawInstruction::Glyphs(run) => {
                    self.draw_run(&mut canvas, run, &modulator, &mut cursor, rng)
                }
                DrawInstruction::Math(math) => {
                    self.draw_math(&mut canvas, math, &modulator, &mut cursor, rng)
                }
            }
        }

        for instruction in instructions {
            if let DrawInstruction::Glyphs(run) = instruction {
                self.decorate(&mut canvas, run);
            }
        }

        debug!(width, height, "Page composited");
        canvas
    }

    fn draw_run<R: Rng + ?Sized>(
        &self,
        canvas: &mut RgbaImage,
        run: &GlyphRun,
        modulator: &RealismModulator,
        cursor: &mut LineCursor,
        rng: &mut R,
    ) {
        let s = self.scale;
        let font = run.font.sized(run.font.size * s);
        let baseline = run.y * s;
        let mut pen_x = run.x * s;

        for ch in run.text.chars() {
            let advance = self.glyphs.advance(ch, &font);
            if !ch.is_whitespace() {
                let t = modulator.modulate(cursor.index, cursor.phase, rng);
                let mask = self
                    .glyphs
                    .rasterize(ch, &font.sized(font.size * t.size_factor()));
                if !mask.is_blank() {
                    let (coverage, left, top) = transform_mask(&mask, &t, s);
                    blend_mask(
                        canvas,
                        &coverage,
                        pen_x.round() as i32 + left,
                        (baseline + t.baseline_offset_y * s).round() as i32 + top,
                        run.color,
                        t.alpha,
                    );
                }
            }
            cursor.index += 1;
            pen_x += advance;
        }
    }

    /// Set the formula into a supersampled coverage bitmap, reduce it, and
    /// blend it at the placement's baseline.
    fn draw_math<R: Rng + ?Sized>(
        &self,
        canvas: &mut RgbaImage,
        math: &MathPlacement,
        modulator: &RealismModulator,
        cursor: &mut LineCursor,
        rng: &mut R,
    ) {
        let k = self.scale * MATH_SUPERSAMPLE;
        let typeset = &math.typeset;
        let pad = (typeset.ascent.max(1.0) * k * 0.5).ceil() as i32;
        let width = (typeset.width * k).ceil() as i32 + 2 * pad;
        let height = (typeset.height() * k).ceil() as i32 + 2 * pad;
        if width <= 0 || height <= 0 {
            return;
        }
        let baseline_row = pad + (typeset.ascent * k).round() as i32;

        let mut bitmap = GrayImage::new(width as u32, height as u32);
        for glyph in &typeset.glyphs {
            let t = modulator.modulate(cursor.index, cursor.phase, rng);
            cursor.index += 1;
            let font = glyph.font().sized(glyph.size * k * t.size_factor());
            let mask = self.glyphs.rasterize(glyph.ch, &font);
            if mask.is_blank() {
                continue;
            }
            let (coverage, left, top) = transform_mask(&mask, &t, k);
            let x = pad + (glyph.x * k).round() as i32 + left;
            let y = baseline_row + ((t.baseline_offset_y - glyph.rise) * k).round() as i32 + top;
            max_into(&mut bitmap, &coverage, x, y, t.alpha);
        }

        let reduced = imageops::resize(
            &bitmap,
            ((width as f32) / MATH_SUPERSAMPLE).ceil().max(1.0) as u32,
            ((height as f32) / MATH_SUPERSAMPLE).ceil().max(1.0) as u32,
            FilterType::Triangle,
        );
        let x0 = (math.x * self.scale).round() as i32 - (pad as f32 / MATH_SUPERSAMPLE).round() as i32;
        let y0 = (math.y * self.scale).round() as i32
            - (baseline_row as f32 / MATH_SUPERSAMPLE).round() as i32;
        blend_mask(canvas, &reduced, x0, y0, math.color, 1.0);
    }

    fn highlight(&self, canvas: &mut RgbaImage, run: &GlyphRun) {
        let s = self.scale;
        let size = run.font.size;
        fill_rect(
            canvas,
            run.x * s,
            (run.y - size * 0.85) * s,
            (run.x + run.width) * s,
            (run.y + size * 0.25) * s,
            HIGHLIGHT_COLOR,
            HIGHLIGHT_ALPHA,
        );
    }

    fn decorate(&self, canvas: &mut RgbaImage, run: &GlyphRun) {
        let s = self.scale;
        let size = run.font.size;
        let thickness = (size * 0.06).max(1.0) * s;
        let (x0, x1) = (run.x * s, (run.x + run.width) * s);
        if run.decoration.underline {
            let y = (run.y + size * 0.15) * s;
            fill_rect(canvas, x0, y, x1, y + thickness, run.color, 1.0);
        }
        if run.decoration.strike {
            let y = (run.y - size * 0.3) * s;
            fill_rect(canvas, x0, y, x1, y + thickness, run.color, 1.0);
        }
    }
}

/// Apply weight, rotation, and bleed to a glyph mask. Returns the new mask
/// and its offset from the pen position. `px` is pixels per logical pixel.
fn transform_mask(mask: &GlyphMask, t: &GlyphTransform, px: f32) -> (GrayImage, i32, i32) {
    let mut coverage = mask.coverage.clone();
    let (mut left, mut top) = (mask.left, mask.top);

    let weight = (t.stroke_weight_delta * px).round() as u32;
    if weight > 0 {
        coverage = embolden(&coverage, weight);
    }

    if t.rotation_degrees.abs() > 0.01 {
        // Pad so the pen position sits at the centre, then rotate about it.
        let (w, h) = (coverage.width() as i32, coverage.height() as i32);
        let (ox, oy) = (-left, -top);
        let half_w = ox.max(w - ox).max(1);
        let half_h = oy.max(h - oy).max(1);
        let mut padded = GrayImage::new((2 * half_w + 1) as u32, (2 * half_h + 1) as u32);
        imageops::replace(&mut padded, &coverage, (half_w - ox) as i64, (half_h - oy) as i64);
        coverage = rotate_about_center(
            &padded,
            t.rotation_degrees.to_radians(),
            Interpolation::Bilinear,
            Luma([0]),
        );
        left = -half_w;
        top = -half_h;
    }

    let sigma = t.blur_radius * px;
    if sigma > 0.05 {
        let margin = (sigma * 3.0).ceil() as i32;
        let mut padded = GrayImage::new(
            coverage.width() + 2 * margin as u32,
            coverage.height() + 2 * margin as u32,
        );
        imageops::replace(&mut padded, &coverage, margin as i64, margin as i64);
        coverage = gaussian_blur_f32(&padded, sigma);
        left -= margin;
        top -= margin;
    }

    (coverage, left, top)
}

/// Combine coverage into `target` keeping the darker of the two.
fn max_into(target: &mut GrayImage, coverage: &GrayImage, x0: i32, y0: i32, alpha: f32) {
    let (tw, th) = (target.width() as i32, target.height() as i32);
    for (mx, my, value) in coverage.enumerate_pixels() {
        let (x, y) = (x0 + mx as i32, y0 + my as i32);
        if x < 0 || y < 0 || x >= tw || y >= th {
            continue;
        }
        let scaled = (value.0[0] as f32 * alpha).round() as u8;
        let dst = target.get_pixel_mut(x as u32, y as u32);
        dst.0[0] = dst.0[0].max(scaled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use crate::markup::compile;
    use crate::typography::{BlockGlyphs, SymbolTypesetter};
    use inkwell_core::config::Effect;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn render(markup: &str, effects: &EffectConfig, seed: u64) -> RgbaImage {
        let style = StyleConfig::blank_paper();
        let glyphs = BlockGlyphs::default();
        let math = SymbolTypesetter::default();
        let geometry = PageGeometry::for_style(&style);
        let layout = LayoutEngine::new(&glyphs, &math).layout(
            &compile(markup),
            &style,
            geometry.width,
            geometry.height,
        );
        let mut rng = StdRng::seed_from_u64(seed);
        Compositor::new(&glyphs, 1.0).composite(&layout.instructions, &style, &geometry, effects, &mut rng)
    }

    fn ink_pixels(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p.0[0] < 128).count()
    }

    #[test]
    fn surface_matches_page_at_scale() {
        let glyphs = BlockGlyphs::default();
        let geometry = PageGeometry::for_style(&StyleConfig::default());
        assert_eq!(Compositor::new(&glyphs, 2.0).surface_size(&geometry), (1588, 2246));
    }

    #[test]
    fn text_leaves_ink_where_it_was_placed() {
        let image = render("Hello", &EffectConfig::disabled(), 0);
        // Baseline at 59.2, glyph bars 11px tall starting at x = 31.
        assert_eq!(image.get_pixel(33, 55).0[..3], [0, 0, 0]);
        assert_eq!(image.get_pixel(33, 70).0[..3], [255, 255, 255]);
        assert!(ink_pixels(&image) > 5 * 6 * 11 - 10);
    }

    #[test]
    fn deterministic_without_random_effects() {
        let a = render("same text {latex: x^2}", &EffectConfig::disabled(), 1);
        let b = render("same text {latex: x^2}", &EffectConfig::disabled(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let effects = EffectConfig {
            baseline_wobble: Effect::on(1.0),
            ..EffectConfig::default()
        };
        let a = render("wobbly handwriting", &effects, 5);
        let b = render("wobbly handwriting", &effects, 5);
        let c = render("wobbly handwriting", &effects, 6);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn formula_is_drawn() {
        let blank = render("", &EffectConfig::disabled(), 0);
        let image = render("{latex: a+b}", &EffectConfig::disabled(), 0);
        assert_eq!(ink_pixels(&blank), 0);
        assert!(ink_pixels(&image) > 50);
    }

    #[test]
    fn underline_draws_below_the_baseline() {
        let plain = render("under", &EffectConfig::disabled(), 0);
        let lined = render("{u: under}", &EffectConfig::disabled(), 0);
        assert_eq!(plain.get_pixel(40, 62).0[..3], [255, 255, 255]);
        assert_eq!(lined.get_pixel(40, 62).0[..3], [0, 0, 0]);
    }

    #[test]
    fn highlight_sits_behind_text() {
        let image = render("{mark: glow}", &EffectConfig::disabled(), 0);
        let between = image.get_pixel(38, 50).0;
        assert!(between[2] < 200 && between[0] > 200, "{between:?}");
        assert_eq!(image.get_pixel(33, 55).0[..3], [0, 0, 0]);
    }

    #[test]
    fn rotation_keeps_glyph_near_its_origin() {
        let mut mask = GrayImage::new(4, 10);
        for p in mask.pixels_mut() {
            *p = Luma([255]);
        }
        let glyph = GlyphMask {
            coverage: mask,
            left: 0,
            top: -10,
            advance: 5.0,
        };
        let t = GlyphTransform {
            rotation_degrees: 10.0,
            ..GlyphTransform::IDENTITY
        };
        let (rotated, left, top) = transform_mask(&glyph, &t, 1.0);
        assert_eq!((left, top), (-4, -10));
        assert_eq!(rotated.dimensions(), (9, 21));
        assert!(rotated.pixels().filter(|p| p.0[0] > 0).count() > 30);
    }
}
