// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tonal passes — contrast, chromatic aberration, noise, and the scanner
// light bar. All operate in place on an RGBA surface and leave alpha alone.

use image::Rgba;
use inkwell_core::error::{InkwellError, Result};
use rand::Rng;
use tracing::{debug, instrument};

use super::Surface;

/// Largest per-channel noise delta at intensity 1.
pub const NOISE_AMPLITUDE: f32 = 25.0;
/// Light bar overlay values at the top and bottom of the page.
const LIGHT_BAR_TOP: f32 = 0.6;
const LIGHT_BAR_BOTTOM: f32 = 0.4;
const LIGHT_BAR_ALPHA: f32 = 0.5;

// -- Contrast -----------------------------------------------------------------

/// Linear remap around mid-gray. `factor` > 1 increases contrast.
#[instrument(skip(surface))]
pub fn contrast(surface: &mut Surface, factor: f32) -> Result<()> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(InkwellError::ImageError(format!("contrast factor {factor} is not usable")));
    }
    let adjust = |channel: u8| -> u8 {
        let val = factor * (channel as f32 - 128.0) + 128.0;
        val.clamp(0.0, 255.0) as u8
    };
    for pixel in surface.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([adjust(r), adjust(g), adjust(b), a]);
    }
    Ok(())
}

// -- Chromatic aberration -----------------------------------------------------

/// Channel shift in surface pixels for an intensity in [0, 1].
pub fn chromatic_offset(level: f32) -> u32 {
    (level.max(0.0) * 3.0).ceil() as u32
}

/// Shift the red channel left and the blue channel right by `offset`
/// pixels. Green stays put; reads past the edge clamp to the edge column.
#[instrument(skip(surface))]
pub fn chromatic_aberration(surface: &mut Surface, offset: u32) -> Result<()> {
    if offset == 0 {
        return Ok(());
    }
    let source = surface.clone();
    let max_x = source.width() - 1;
    for (x, y, pixel) in surface.enumerate_pixels_mut() {
        let red_from = x.saturating_add(offset).min(max_x);
        let blue_from = x.saturating_sub(offset);
        pixel.0[0] = source.get_pixel(red_from, y).0[0];
        pixel.0[2] = source.get_pixel(blue_from, y).0[2];
    }
    debug!(offset, "Channels shifted");
    Ok(())
}

// -- Noise --------------------------------------------------------------------

/// Add a uniform random delta to every color channel.
#[instrument(skip(surface, rng))]
pub fn noise<R: Rng + ?Sized>(surface: &mut Surface, level: f32, rng: &mut R) -> Result<()> {
    let amplitude = NOISE_AMPLITUDE * level;
    if amplitude <= 0.0 {
        return Ok(());
    }
    for pixel in surface.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let delta: f32 = rng.random_range(-amplitude..=amplitude);
            *channel = (*channel as f32 + delta).round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

// -- Light bar ----------------------------------------------------------------

/// Overlay a top-to-bottom luminance gradient, as left by a scanner lamp.
#[instrument(skip(surface))]
pub fn light_bar(surface: &mut Surface, level: f32) -> Result<()> {
    let alpha = LIGHT_BAR_ALPHA * level;
    let height = surface.height().max(2) - 1;
    for (_, y, pixel) in surface.enumerate_pixels_mut() {
        let t = y as f32 / height as f32;
        let bar = LIGHT_BAR_TOP + (LIGHT_BAR_BOTTOM - LIGHT_BAR_TOP) * t;
        for channel in pixel.0.iter_mut().take(3) {
            let base = *channel as f32 / 255.0;
            let mixed = base + (overlay(base, bar) - base) * alpha;
            *channel = (mixed * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

/// Overlay blend of `top` onto `base`, both in [0, 1].
fn overlay(base: f32, top: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn white(w: u32, h: u32) -> Surface {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn contrast_stretches_around_mid_gray() {
        let mut surface = RgbaImage::from_pixel(1, 2, Rgba([100, 128, 200, 255]));
        surface.put_pixel(0, 1, Rgba([0, 255, 64, 10]));
        contrast(&mut surface, 2.0).expect("contrast");
        assert_eq!(surface.get_pixel(0, 0).0, [72, 128, 255, 255]);
        assert_eq!(surface.get_pixel(0, 1).0, [0, 255, 0, 10]);
    }

    #[test]
    fn contrast_rejects_nonsense_factor() {
        assert!(contrast(&mut white(2, 2), f32::NAN).is_err());
    }

    #[test]
    fn chromatic_offset_rounds_up() {
        assert_eq!(chromatic_offset(0.0), 0);
        assert_eq!(chromatic_offset(0.3), 1);
        assert_eq!(chromatic_offset(0.5), 2);
        assert_eq!(chromatic_offset(1.0), 3);
    }

    #[test]
    fn chromatic_aberration_splits_channels() {
        // A single black column at x = 5.
        let mut surface = white(12, 1);
        surface.put_pixel(5, 0, Rgba([0, 0, 0, 255]));
        chromatic_aberration(&mut surface, 2).expect("shift");
        // Red moved left, blue moved right, green stayed.
        assert_eq!(surface.get_pixel(3, 0).0, [0, 255, 255, 255]);
        assert_eq!(surface.get_pixel(5, 0).0, [255, 0, 255, 255]);
        assert_eq!(surface.get_pixel(7, 0).0, [255, 255, 0, 255]);
    }

    #[test]
    fn chromatic_aberration_on_white_changes_nothing() {
        let mut surface = white(20, 4);
        chromatic_aberration(&mut surface, chromatic_offset(0.5)).expect("shift");
        assert_eq!(surface, white(20, 4));
    }

    #[test]
    fn noise_stays_within_amplitude() {
        let mut surface = RgbaImage::from_pixel(32, 32, Rgba([128, 128, 128, 255]));
        noise(&mut surface, 0.4, &mut StdRng::seed_from_u64(11)).expect("noise");
        assert!(surface.pixels().all(|p| p.0[..3].iter().all(|c| c.abs_diff(128) <= 10) && p.0[3] == 255));
        assert!(surface.pixels().any(|p| p.0[0] != 128));
    }

    #[test]
    fn light_bar_darkens_mid_tones_towards_the_bottom() {
        let mut surface = RgbaImage::from_pixel(4, 100, Rgba([128, 128, 128, 255]));
        light_bar(&mut surface, 1.0).expect("light bar");
        let top = surface.get_pixel(0, 0).0[0];
        let bottom = surface.get_pixel(0, 99).0[0];
        assert!(top > bottom, "top {top} bottom {bottom}");
        // Pure white is unchanged by an overlay.
        let mut paper = white(4, 10);
        light_bar(&mut paper, 1.0).expect("light bar");
        assert_eq!(paper, white(4, 10));
    }
}
