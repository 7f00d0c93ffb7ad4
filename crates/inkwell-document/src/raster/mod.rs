// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — paints paper and draw instructions onto an RGBA surface.

pub mod compositor;
pub mod paper;

use image::{GrayImage, Rgba, RgbaImage};
use inkwell_core::types::Color;

pub use compositor::Compositor;

/// Linear mix of two colors; `t` = 0 gives `a`, 1 gives `b`.
pub fn mix(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color::rgb(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
}

pub fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// Alpha-blend `color` over one pixel. Out-of-bounds coordinates are ignored.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Color, alpha: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() || alpha <= 0.0 {
        return;
    }
    let a = alpha.min(1.0);
    let px = canvas.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in px.0.iter_mut().zip(color.channels()) {
        *dst = (*dst as f32 * (1.0 - a) + src as f32 * a).round() as u8;
    }
}

/// Blend a coverage mask whose top-left corner lands at (`x0`, `y0`).
pub fn blend_mask(canvas: &mut RgbaImage, mask: &GrayImage, x0: i32, y0: i32, color: Color, alpha: f32) {
    for (mx, my, coverage) in mask.enumerate_pixels() {
        let c = coverage.0[0];
        if c > 0 {
            blend_pixel(canvas, x0 + mx as i32, y0 + my as i32, color, alpha * c as f32 / 255.0);
        }
    }
}

/// Blend a solid rectangle given in surface pixels. Partial pixels are skipped.
pub fn fill_rect(canvas: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Color, alpha: f32) {
    let (left, right) = (x0.min(x1).round() as i32, x0.max(x1).round() as i32);
    let (top, bottom) = (y0.min(y1).round() as i32, y0.max(y1).round() as i32);
    let right = right.max(left + 1);
    let bottom = bottom.max(top + 1);
    for y in top.max(0)..bottom.min(canvas.height() as i32) {
        for x in left.max(0)..right.min(canvas.width() as i32) {
            blend_pixel(canvas, x, y, color, alpha);
        }
    }
}
