// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Style, effect, and render configuration.
//
// These are plain value structs passed into layout, compositing, and
// post-processing. A captured page keeps its own copies.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{InkwellError, Result};
use crate::types::{Color, MAX_FONT_SIZE, Margins, PageSize, Ruling};

/// Font size and ink color for the header or side-note region. The main
/// region uses the style's own `font_size` and `ink_color`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionStyle {
    pub font_size: f32,
    pub ink_color: Color,
}

impl Default for RegionStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            ink_color: Color::BLACK,
        }
    }
}

/// Typography, paper, and page geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_family: String,
    pub font_size: f32,
    /// Extra vertical gap after each block, in logical pixels.
    pub letter_spacing: f32,
    /// Extra vertical gap after each line, in logical pixels.
    pub word_spacing: f32,
    /// Line advance as a multiple of the line's font size.
    pub line_height: f32,
    pub ink_color: Color,
    pub paper_color: Color,

    pub header: RegionStyle,
    pub side_note: RegionStyle,

    pub page_size: PageSize,
    pub margins: Margins,
    pub header_height: f32,
    /// Side-note column width as a fraction of the page width.
    pub side_note_width: f32,
    pub show_margins: bool,
    pub show_header_margin: bool,
    pub show_side_margins: bool,
    pub margin_color: Color,

    pub ruling: Ruling,
    pub line_spacing: f32,
    pub line_color: Color,
    pub line_opacity: f32,

    pub superscript_size: f32,
    pub subscript_size: f32,
    /// Horizontal gap around inline formulas.
    pub math_spacing: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: "Homemade Apple".into(),
            font_size: 16.0,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            line_height: 1.2,
            ink_color: Color::BLACK,
            paper_color: Color::WHITE,
            header: RegionStyle {
                font_size: 20.0,
                ink_color: Color::BLACK,
            },
            side_note: RegionStyle::default(),
            page_size: PageSize::A4,
            margins: Margins::default(),
            header_height: 45.0,
            side_note_width: 0.15,
            show_margins: true,
            show_header_margin: true,
            show_side_margins: true,
            margin_color: Color::rgb(0xff, 0xc0, 0xc0),
            ruling: Ruling::Ruled,
            line_spacing: 24.0,
            line_color: Color::rgb(0xe0, 0xe0, 0xe0),
            line_opacity: 0.3,
            superscript_size: 0.7,
            subscript_size: 0.7,
            math_spacing: 4.0,
        }
    }
}

impl StyleConfig {
    /// A style with no margins decorations and no ruling: text on blank paper.
    pub fn blank_paper() -> Self {
        Self {
            show_margins: false,
            ruling: Ruling::None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (region, size) in [
            ("main", self.font_size),
            ("header", self.header.font_size),
            ("side note", self.side_note.font_size),
        ] {
            if !(size.is_finite() && size > 0.0 && size <= MAX_FONT_SIZE) {
                return Err(InkwellError::Config(format!(
                    "{region} font size must be in (0, {MAX_FONT_SIZE}], got {size}"
                )));
            }
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(InkwellError::Config(format!(
                "line height must be positive, got {}",
                self.line_height
            )));
        }
        if !(0.0..0.9).contains(&self.side_note_width) {
            return Err(InkwellError::Config(format!(
                "side note width must be a fraction below 0.9, got {}",
                self.side_note_width
            )));
        }
        Ok(())
    }
}

/// Contrast factor the scanner preset applies: a 0.55 boost on the
/// `(c + 255) / (255.01 - c)` curve, with `c` scaled to 0..255.
pub const SCANNER_CONTRAST: f32 = (0.55 * 255.0 + 255.0) / (255.01 - 0.55 * 255.0);

/// A toggle with a normalized intensity.
///
/// An effect only does anything when it is enabled *and* its intensity is
/// above zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effect {
    pub enabled: bool,
    pub intensity: f32,
}

impl Effect {
    pub const fn on(intensity: f32) -> Self {
        Self {
            enabled: true,
            intensity,
        }
    }

    pub const fn off(intensity: f32) -> Self {
        Self {
            enabled: false,
            intensity,
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.intensity > 0.0
    }

    /// Intensity clamped to [0, 1], or 0 when inactive.
    pub fn level(&self) -> f32 {
        if self.is_active() {
            self.intensity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for Effect {
    fn default() -> Self {
        Self::off(0.0)
    }
}

/// Page drop shadow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowEffect {
    pub enabled: bool,
    pub angle_degrees: f32,
    pub distance: f32,
    pub blur: f32,
    pub opacity: f32,
}

impl ShadowEffect {
    pub fn is_active(&self) -> bool {
        self.enabled && self.opacity > 0.0
    }

    /// Shadow offset (dx, dy) in logical pixels.
    pub fn offset(&self) -> (f32, f32) {
        let rad = self.angle_degrees.to_radians();
        (self.distance * rad.cos(), self.distance * rad.sin())
    }
}

impl Default for ShadowEffect {
    fn default() -> Self {
        Self {
            enabled: true,
            angle_degrees: 45.0,
            distance: 5.0,
            blur: 10.0,
            opacity: 0.5,
        }
    }
}

/// Realism and post-processing effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub shadow: ShadowEffect,
    /// Scanner look: resolves into contrast, noise, and light bar.
    pub scanner: Effect,
    pub ink_flow: Effect,
    pub paper_grain: Effect,
    pub pen_pressure: Effect,
    pub weathering: Effect,
    pub chromatic_aberration: Effect,
    pub noise: Effect,
    /// Intensity is a multiplicative contrast factor, typically 0.5..2.
    pub contrast: Effect,
    pub light_bar: Effect,
    pub binding: Effect,
    pub baseline_wobble: Effect,
    pub font_size_variation: Effect,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            shadow: ShadowEffect::default(),
            scanner: Effect::off(1.0),
            ink_flow: Effect::on(0.5),
            paper_grain: Effect::on(0.3),
            pen_pressure: Effect::on(0.4),
            weathering: Effect::off(0.2),
            chromatic_aberration: Effect::off(0.3),
            noise: Effect::on(0.2),
            contrast: Effect::on(1.0),
            light_bar: Effect::off(0.5),
            binding: Effect::off(1.0),
            baseline_wobble: Effect::off(0.2),
            font_size_variation: Effect::off(0.1),
        }
    }
}

impl EffectConfig {
    /// Every toggle off and every intensity zero.
    pub fn disabled() -> Self {
        Self {
            shadow: ShadowEffect {
                enabled: false,
                opacity: 0.0,
                ..ShadowEffect::default()
            },
            scanner: Effect::off(0.0),
            ink_flow: Effect::off(0.0),
            paper_grain: Effect::off(0.0),
            pen_pressure: Effect::off(0.0),
            weathering: Effect::off(0.0),
            chromatic_aberration: Effect::off(0.0),
            noise: Effect::off(0.0),
            contrast: Effect::off(0.0),
            light_bar: Effect::off(0.0),
            binding: Effect::off(0.0),
            baseline_wobble: Effect::off(0.0),
            font_size_variation: Effect::off(0.0),
        }
    }

    /// True when the contrast pass would change pixels.
    pub fn contrast_active(&self) -> bool {
        self.contrast.is_active() && (self.contrast.intensity - 1.0).abs() > f32::EPSILON
    }

    /// Expand the scanner preset into the concrete passes it implies.
    pub fn resolved(&self) -> Self {
        let mut out = self.clone();
        if self.scanner.is_active() {
            let level = self.scanner.level();
            if !self.contrast_active() {
                out.contrast = Effect::on(SCANNER_CONTRAST);
            }
            let noise_floor = 0.2 * level;
            if !self.noise.is_active() || self.noise.intensity < noise_floor {
                out.noise = Effect::on(noise_floor);
            }
            if !self.light_bar.is_active() {
                out.light_bar = Effect::on(level.max(0.5));
            }
            debug!(level, "scanner preset resolved");
        }
        out
    }

    /// True when no per-glyph randomness will be drawn.
    pub fn glyphs_deterministic(&self) -> bool {
        !(self.ink_flow.is_active()
            || self.pen_pressure.is_active()
            || self.baseline_wobble.is_active()
            || self.font_size_variation.is_active())
    }
}

/// Output settings for rendering and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output pixels per logical pixel.
    pub scale: f32,
    /// Seed for the jitter generator; pages use `seed + page index`.
    /// `None` draws a fresh OS seed per page.
    pub seed: Option<u64>,
    pub export_page_size: PageSize,
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            seed: None,
            export_page_size: PageSize::A4,
            title: "Inkwell Document".into(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0 && self.scale <= 8.0) {
            return Err(InkwellError::Config(format!(
                "render scale must be in (0, 8], got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Everything a renderer needs, loadable from one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkwellConfig {
    pub style: StyleConfig,
    pub effects: EffectConfig,
    pub render: RenderConfig,
}

impl InkwellConfig {
    /// Read a configuration file. Missing fields take their defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.style.validate()?;
        config.render.validate()?;
        info!(page_size = ?config.style.page_size, "Configuration loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!("Wrote configuration to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_needs_toggle_and_intensity() {
        assert!(Effect::on(0.3).is_active());
        assert!(!Effect::on(0.0).is_active());
        assert!(!Effect::off(0.3).is_active());
        assert_eq!(Effect::on(3.0).level(), 1.0);
        assert_eq!(Effect::off(0.8).level(), 0.0);
    }

    #[test]
    fn disabled_config_has_nothing_active() {
        let effects = EffectConfig::disabled();
        assert!(!effects.shadow.is_active());
        assert!(!effects.contrast_active());
        assert!(effects.glyphs_deterministic());
        let resolved = effects.resolved();
        assert_eq!(resolved, effects);
    }

    #[test]
    fn unit_contrast_is_not_active() {
        let effects = EffectConfig::default();
        assert!(effects.contrast.is_active());
        assert!(!effects.contrast_active());
    }

    #[test]
    fn scanner_resolves_to_contrast_noise_and_light_bar() {
        let effects = EffectConfig {
            scanner: Effect::on(1.0),
            ..EffectConfig::disabled()
        };
        let resolved = effects.resolved();
        assert!(resolved.contrast_active());
        assert_eq!(resolved.contrast.intensity, SCANNER_CONTRAST);
        assert!((SCANNER_CONTRAST - 3.444).abs() < 1e-3);
        assert!(resolved.noise.is_active());
        assert!(resolved.light_bar.is_active());
    }

    #[test]
    fn scanner_keeps_an_explicit_contrast() {
        let effects = EffectConfig {
            scanner: Effect::on(1.0),
            contrast: Effect::on(1.5),
            ..EffectConfig::disabled()
        };
        assert_eq!(effects.resolved().contrast, Effect::on(1.5));
    }

    #[test]
    fn shadow_offset_follows_angle() {
        let shadow = ShadowEffect {
            angle_degrees: 90.0,
            distance: 4.0,
            ..ShadowEffect::default()
        };
        let (dx, dy) = shadow.offset();
        assert!(dx.abs() < 1e-4);
        assert!((dy - 4.0).abs() < 1e-4);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: InkwellConfig =
            serde_json::from_str(r#"{ "style": { "font_size": 22.0 }, "render": { "seed": 7 } }"#)
                .expect("parse");
        assert_eq!(config.style.font_size, 22.0);
        assert_eq!(config.style.line_spacing, 24.0);
        assert_eq!(config.render.seed, Some(7));
        assert_eq!(config.render.scale, 2.0);
        assert_eq!(config.effects, EffectConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("inkwell.json");
        let mut config = InkwellConfig::default();
        config.style.page_size = PageSize::Letter;
        config.effects.weathering = Effect::on(0.7);
        config.save(&path).expect("save");
        let loaded = InkwellConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn oversized_region_font_is_rejected() {
        let mut style = StyleConfig::default();
        style.header.font_size = f32::INFINITY;
        assert!(matches!(style.validate(), Err(InkwellError::Config(_))));
        style.header.font_size = 20.0;
        style.font_size = MAX_FONT_SIZE * 2.0;
        assert!(matches!(style.validate(), Err(InkwellError::Config(_))));
    }

    #[test]
    fn load_rejects_bad_scale() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "render": { "scale": 0.0 } }"#).expect("write");
        assert!(matches!(
            InkwellConfig::load(&path),
            Err(InkwellError::Config(_))
        ));
    }
}
