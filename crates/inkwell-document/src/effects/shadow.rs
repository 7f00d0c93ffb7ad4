// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page drop shadow. Pads the surface so the blurred, offset shadow fits
// behind the page, then composites the page back on top.

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;
use inkwell_core::config::ShadowEffect;
use inkwell_core::error::{InkwellError, Result};
use tracing::{debug, instrument};

use super::{MAX_SURFACE_SIDE, Surface};

/// Color around the page once the surface is padded.
const BACKDROP: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Padding added to each side of a page, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowPadding {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl ShadowPadding {
    /// Each side gets the blur radius plus however far the shadow is
    /// pushed towards it.
    pub fn for_shadow(shadow: &ShadowEffect, scale: f32) -> Self {
        let (dx, dy) = shadow.offset();
        let blur = shadow.blur.max(0.0);
        let side = |push: f32| ((push.max(0.0) + blur) * scale).ceil() as u32;
        Self {
            left: side(-dx),
            top: side(-dy),
            right: side(dx),
            bottom: side(dy),
        }
    }
}

/// A new, larger surface with `page` drawn over its drop shadow.
#[instrument(skip(page, shadow), fields(width = page.width(), height = page.height()))]
pub fn drop_shadow(page: &Surface, shadow: &ShadowEffect, scale: f32) -> Result<Surface> {
    let pad = ShadowPadding::for_shadow(shadow, scale);
    let width = page.width() as u64 + pad.left as u64 + pad.right as u64;
    let height = page.height() as u64 + pad.top as u64 + pad.bottom as u64;
    if width > MAX_SURFACE_SIDE as u64 || height > MAX_SURFACE_SIDE as u64 {
        return Err(InkwellError::ImageError(format!(
            "shadow would grow the surface to {width}x{height}"
        )));
    }
    let (width, height) = (width as u32, height as u32);

    let (dx, dy) = shadow.offset();
    let mut mask = GrayImage::new(width, height);
    let footprint = Rect::at(
        pad.left as i32 + (dx * scale).round() as i32,
        pad.top as i32 + (dy * scale).round() as i32,
    )
    .of_size(page.width(), page.height());
    draw_filled_rect_mut(&mut mask, footprint, Luma([255]));
    // A CSS-style blur radius is roughly two standard deviations.
    let sigma = shadow.blur * scale / 2.0;
    if sigma > 0.0 {
        mask = gaussian_blur_f32(&mask, sigma);
    }

    let opacity = shadow.opacity.clamp(0.0, 1.0);
    let mut out = RgbaImage::from_pixel(width, height, BACKDROP);
    for (pixel, coverage) in out.pixels_mut().zip(mask.pixels()) {
        let a = opacity * coverage.0[0] as f32 / 255.0;
        for channel in pixel.0.iter_mut().take(3) {
            *channel = (*channel as f32 * (1.0 - a)).round() as u8;
        }
    }
    imageops::replace(&mut out, page, pad.left as i64, pad.top as i64);

    debug!(width, height, ?pad, "Drop shadow applied");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_shadow() -> ShadowEffect {
        ShadowEffect::default()
    }

    #[test]
    fn padding_follows_offset_direction() {
        // 45 degrees, distance 5: offset (3.54, 3.54), blur 10.
        let pad = ShadowPadding::for_shadow(&default_shadow(), 1.0);
        assert_eq!(pad, ShadowPadding { left: 10, top: 10, right: 14, bottom: 14 });
        let doubled = ShadowPadding::for_shadow(&default_shadow(), 2.0);
        assert_eq!(doubled, ShadowPadding { left: 20, top: 20, right: 28, bottom: 28 });
    }

    #[test]
    fn page_sits_on_top_of_its_shadow() {
        let page = RgbaImage::from_pixel(40, 30, Rgba([250, 250, 250, 255]));
        let out = drop_shadow(&page, &default_shadow(), 1.0).expect("shadow");
        assert_eq!(out.dimensions(), (64, 54));
        // Page pixels are untouched.
        assert_eq!(out.get_pixel(10, 10).0, [250, 250, 250, 255]);
        assert_eq!(out.get_pixel(49, 39).0, [250, 250, 250, 255]);
        // Shadow shows below-right of the page, not above-left.
        assert!(out.get_pixel(52, 42).0[0] < 230);
        assert!(out.get_pixel(1, 1).0[0] > out.get_pixel(52, 42).0[0]);
    }

    #[test]
    fn oversized_padding_is_an_error() {
        let page = RgbaImage::from_pixel(4, 4, BACKDROP);
        let shadow = ShadowEffect {
            blur: MAX_SURFACE_SIDE as f32,
            ..default_shadow()
        };
        assert!(drop_shadow(&page, &shadow, 1.0).is_err());
    }
}
