// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wear and handling marks — aged tint, stains, creases, and binding holes.

use imageproc::drawing::{draw_antialiased_line_segment_mut, draw_filled_circle_mut};
use imageproc::pixelops::interpolate;
use inkwell_core::error::{InkwellError, Result};
use inkwell_core::types::Color;
use rand::Rng;
use tracing::{debug, instrument};

use super::Surface;
use crate::raster::{blend_pixel, rgba};

const TINT: Color = Color::rgb(0xe8, 0xd2, 0x9b);
const STAIN: Color = Color::rgb(0x9c, 0x74, 0x3c);
const CREASE: Color = Color::rgb(0xb4, 0xb0, 0xa8);
/// Tint alpha at the bottom of the page at intensity 1; the top gets half.
const TINT_ALPHA: f32 = 0.18;
const STAIN_ALPHA: f32 = 0.15;
const CREASE_ALPHA: f32 = 0.35;

/// Binding holes along the left edge, independent of intensity.
pub const BINDING_HOLES: u32 = 10;
const HOLE_RADIUS: f32 = 6.0;
const HOLE_INSET: f32 = 18.0;
const HOLE_COLOR: Color = Color::rgb(0xe6, 0xe6, 0xe6);
const HOLE_SHADOW: Color = Color::rgb(0x80, 0x80, 0x80);

// -- Weathering ---------------------------------------------------------------

/// Number of stains and creases for an intensity in [0, 1].
pub fn weathering_marks(level: f32) -> (usize, usize) {
    let extra = level.clamp(0.0, 1.0).round() as usize;
    (1 + extra, 2 + extra)
}

/// Age the page: a yellow tint that deepens towards the bottom, a few soft
/// stains, and some faint crease lines.
#[instrument(skip(surface, rng))]
pub fn weathering<R: Rng + ?Sized>(surface: &mut Surface, level: f32, scale: f32, rng: &mut R) -> Result<()> {
    let (width, height) = surface.dimensions();

    let span = height.max(2) - 1;
    for (_, y, pixel) in surface.enumerate_pixels_mut() {
        let t = 0.5 + 0.5 * y as f32 / span as f32;
        let a = TINT_ALPHA * level * t;
        for (channel, tint) in pixel.0.iter_mut().zip(TINT.channels()) {
            *channel = (*channel as f32 * (1.0 - a) + tint as f32 * a).round() as u8;
        }
    }

    let (stains, creases) = weathering_marks(level);
    for _ in 0..stains {
        let cx = rng.random_range(0.0..width as f32);
        let cy = rng.random_range(0.0..height as f32);
        let radius = rng.random_range(20.0..80.0) * scale;
        stain(surface, cx, cy, radius, STAIN_ALPHA * level);
    }

    for _ in 0..creases {
        let start = (rng.random_range(0..width) as i32, 0);
        let end = (rng.random_range(0..width) as i32, height as i32 - 1);
        let alpha = CREASE_ALPHA * level.max(0.3);
        draw_antialiased_line_segment_mut(surface, start, end, rgba(CREASE), |line, under, weight| {
            interpolate(line, under, weight * alpha)
        });
    }

    debug!(stains, creases, "Weathering applied");
    Ok(())
}

/// A radial blob whose alpha falls off to zero at `radius`.
fn stain(surface: &mut Surface, cx: f32, cy: f32, radius: f32, alpha: f32) {
    let r = radius.ceil() as i32;
    let (x0, y0) = (cx.round() as i32, cy.round() as i32);
    for y in (y0 - r)..=(y0 + r) {
        for x in (x0 - r)..=(x0 + r) {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            if d < radius {
                let falloff = 1.0 - d / radius;
                blend_pixel(surface, x, y, STAIN, alpha * falloff * falloff);
            }
        }
    }
}

// -- Binding ------------------------------------------------------------------

/// Punch `BINDING_HOLES` evenly spaced holes down the left margin, each
/// with a one-pixel drop shadow.
#[instrument(skip(surface))]
pub fn binding_holes(surface: &mut Surface, scale: f32) -> Result<()> {
    let (width, height) = surface.dimensions();
    let radius = (HOLE_RADIUS * scale).round().max(1.0) as i32;
    let x = (HOLE_INSET * scale).round() as i32;
    if (x + radius) as u32 >= width || height < BINDING_HOLES * 2 * radius as u32 {
        return Err(InkwellError::ImageError(format!(
            "{width}x{height} surface is too small for binding holes"
        )));
    }
    let shadow_offset = scale.round().max(1.0) as i32;
    for k in 0..BINDING_HOLES {
        let y = ((k + 1) as f32 * height as f32 / (BINDING_HOLES + 1) as f32).round() as i32;
        draw_filled_circle_mut(
            surface,
            (x + shadow_offset, y + shadow_offset),
            radius,
            rgba(HOLE_SHADOW),
        );
        draw_filled_circle_mut(surface, (x, y), radius, rgba(HOLE_COLOR));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn white(w: u32, h: u32) -> Surface {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn mark_counts_scale_with_intensity() {
        assert_eq!(weathering_marks(0.2), (1, 2));
        assert_eq!(weathering_marks(1.0), (2, 3));
    }

    #[test]
    fn weathering_yellows_the_page() {
        let mut surface = white(120, 160);
        weathering(&mut surface, 1.0, 1.0, &mut StdRng::seed_from_u64(3)).expect("weathering");
        let bottom = surface.get_pixel(0, 159).0;
        // Blue falls faster than red under a yellow tint.
        assert!(bottom[2] < bottom[0], "{bottom:?}");
        assert!(surface.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn ten_holes_down_the_left_margin() {
        let mut surface = white(200, 1100);
        binding_holes(&mut surface, 1.0).expect("binding");
        let centres: Vec<u32> = (0..1100)
            .filter(|&y| surface.get_pixel(18, y).0 == rgba(HOLE_COLOR).0)
            .collect();
        // Each hole covers 13 rows at the centre column.
        assert_eq!(centres.len(), 10 * 13);
        assert_eq!(surface.get_pixel(18, 100).0, rgba(HOLE_COLOR).0);
        // Shadow peeks out below-right of each hole.
        assert_eq!(surface.get_pixel(25, 101).0, rgba(HOLE_SHADOW).0);
        assert_eq!(surface.get_pixel(150, 100).0, [255, 255, 255, 255]);
    }

    #[test]
    fn binding_needs_room() {
        assert!(binding_holes(&mut white(10, 10), 1.0).is_err());
    }
}
