// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Realism modulator — per-character perturbations that make set text look
// handwritten. Stateless: all randomness comes from the caller's generator,
// so a seeded generator gives a reproducible page.

use std::f32::consts::TAU;

use inkwell_core::config::EffectConfig;
use rand::Rng;

/// Baseline wobble amplitude at intensity 1, in logical pixels.
pub const WOBBLE_AMPLITUDE: f32 = 3.0;
/// Wobble phase advance per character.
const WOBBLE_FREQUENCY: f32 = 0.5;
/// Ink flow: maximum relative scale change at intensity 1.
const INK_FLOW_SCALE: f32 = 0.04;
/// Ink flow: maximum rotation at intensity 1, in degrees.
const INK_FLOW_ROTATION: f32 = 1.5;
/// Chance that a character gets a different size.
const FONT_VARIATION_CHANCE: f64 = 0.1;
/// Maximum relative size change at intensity 1.
const FONT_VARIATION_SPREAD: f32 = 0.25;
/// Lightest pen pressure.
const MIN_PRESSURE: f32 = 0.7;
/// Ink bleed blur at full pressure and intensity 1, in logical pixels.
const MAX_BLEED: f32 = 0.5;

/// How one character deviates from its typeset form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphTransform {
    pub scale: f32,
    pub rotation_degrees: f32,
    /// Downward shift of the baseline, in logical pixels.
    pub baseline_offset_y: f32,
    pub font_size_multiplier: f32,
    pub alpha: f32,
    /// Extra stroke width, in logical pixels.
    pub stroke_weight_delta: f32,
    pub blur_radius: f32,
}

impl GlyphTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        rotation_degrees: 0.0,
        baseline_offset_y: 0.0,
        font_size_multiplier: 1.0,
        alpha: 1.0,
        stroke_weight_delta: 0.0,
        blur_radius: 0.0,
    };

    /// Combined size factor (ink-flow scale times size variation).
    pub fn size_factor(&self) -> f32 {
        self.scale * self.font_size_multiplier
    }
}

impl Default for GlyphTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Intensities of the per-character effects, zero when an effect is off.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RealismModulator {
    ink_flow: f32,
    wobble: f32,
    font_variation: f32,
    pen_pressure: f32,
}

impl RealismModulator {
    pub fn new(effects: &EffectConfig) -> Self {
        Self {
            ink_flow: effects.ink_flow.level(),
            wobble: effects.baseline_wobble.level(),
            font_variation: effects.font_size_variation.level(),
            pen_pressure: effects.pen_pressure.level(),
        }
    }

    /// True when `modulate` can return anything but the identity.
    pub fn is_active(&self) -> bool {
        self.ink_flow > 0.0 || self.wobble > 0.0 || self.font_variation > 0.0 || self.pen_pressure > 0.0
    }

    /// A random starting phase for one line's wobble. Draws nothing when
    /// wobble is off.
    pub fn line_phase<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.wobble > 0.0 {
            rng.random_range(0.0..TAU)
        } else {
            0.0
        }
    }

    /// The transform for the character at `index` within its line. Effects
    /// compound; inactive effects consume no randomness.
    pub fn modulate<R: Rng + ?Sized>(&self, index: usize, phase: f32, rng: &mut R) -> GlyphTransform {
        let mut t = GlyphTransform::IDENTITY;

        if self.ink_flow > 0.0 {
            let spread = INK_FLOW_SCALE * self.ink_flow;
            let tilt = INK_FLOW_ROTATION * self.ink_flow;
            t.scale = rng.random_range(1.0 - spread..=1.0 + spread);
            t.rotation_degrees = rng.random_range(-tilt..=tilt);
        }

        if self.wobble > 0.0 {
            let angle = index as f32 * WOBBLE_FREQUENCY + phase;
            t.baseline_offset_y = angle.sin() * self.wobble * WOBBLE_AMPLITUDE;
        }

        if self.font_variation > 0.0 && rng.random_bool(FONT_VARIATION_CHANCE) {
            let spread = FONT_VARIATION_SPREAD * self.font_variation;
            t.font_size_multiplier = rng.random_range(1.0 - spread..=1.0 + spread);
        }

        if self.pen_pressure > 0.0 {
            let pressure: f32 = rng.random_range(MIN_PRESSURE..=1.0);
            let weight = (pressure - MIN_PRESSURE) / (1.0 - MIN_PRESSURE);
            t.alpha = 1.0 - self.pen_pressure * (1.0 - pressure);
            t.stroke_weight_delta = self.pen_pressure * weight;
            t.blur_radius = MAX_BLEED * self.pen_pressure * weight;
        }

        t
    }
}
