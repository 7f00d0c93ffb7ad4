// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paper grain — a small tileable noise texture multiplied over the page.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use inkwell_core::error::Result;
use rand::Rng;
use tracing::{debug, instrument};

use super::Surface;

/// Side length of the grain tile in pixels.
pub const GRAIN_TILE: u32 = 256;
/// Multiply strength at intensity 1.
const GRAIN_STRENGTH: f32 = 0.35;
/// Smallest zoomed octave.
const FIRST_OCTAVE: u32 = 4;

/// A square grayscale grain tile.
#[derive(Debug, Clone)]
pub struct GrainTexture {
    tile: GrayImage,
}

impl GrainTexture {
    /// White noise with progressively larger, fainter zoomed patches laid
    /// over it. Each octave of side `size` is drawn at alpha `4 / size`.
    #[instrument(skip_all)]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let noise = GrayImage::from_fn(GRAIN_TILE, GRAIN_TILE, |_, _| Luma([rng.random::<u8>()]));
        let mut tile = noise.clone();

        let mut size = FIRST_OCTAVE;
        while size <= GRAIN_TILE {
            let x = rng.random_range(0..=GRAIN_TILE - size);
            let y = rng.random_range(0..=GRAIN_TILE - size);
            let patch = imageops::crop_imm(&noise, x, y, size, size).to_image();
            let zoomed = imageops::resize(&patch, GRAIN_TILE, GRAIN_TILE, FilterType::Triangle);
            let alpha = FIRST_OCTAVE as f32 / size as f32;
            for (dst, src) in tile.pixels_mut().zip(zoomed.pixels()) {
                let mixed = dst.0[0] as f32 * (1.0 - alpha) + src.0[0] as f32 * alpha;
                dst.0[0] = mixed.round() as u8;
            }
            size *= 2;
        }

        debug!("Grain texture generated");
        Self { tile }
    }

    pub fn tile(&self) -> &GrayImage {
        &self.tile
    }

    /// Multiply the tiled texture over `surface` at a strength set by
    /// `level` in [0, 1].
    pub fn multiply_onto(&self, surface: &mut Surface, level: f32) -> Result<()> {
        let strength = GRAIN_STRENGTH * level;
        for (x, y, pixel) in surface.enumerate_pixels_mut() {
            let grain = self.tile.get_pixel(x % GRAIN_TILE, y % GRAIN_TILE).0[0] as f32 / 255.0;
            let factor = 1.0 - strength * (1.0 - grain);
            for channel in pixel.0.iter_mut().take(3) {
                *channel = (*channel as f32 * factor).round() as u8;
            }
        }
        Ok(())
    }
}
