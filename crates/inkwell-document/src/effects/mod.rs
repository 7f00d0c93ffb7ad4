// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-processing pipeline — full-page filters applied after compositing, in
// a fixed order. A pass that is off is never invoked; a pass that fails is
// skipped and reported, and the remaining passes still run.

pub mod grain;
pub mod shadow;
pub mod tone;
pub mod wear;

use image::RgbaImage;
use inkwell_core::config::EffectConfig;
use inkwell_core::error::{InkwellError, RenderWarning, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// A page raster being filtered.
pub type Surface = RgbaImage;

/// Largest surface side a pass will produce.
pub const MAX_SURFACE_SIDE: u32 = 1 << 15;

/// The post-processing passes, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    Shadow,
    Contrast,
    ChromaticAberration,
    Noise,
    PaperGrain,
    LightBar,
    Weathering,
    Binding,
}

impl PassKind {
    /// Every pass, in the order the pipeline runs them.
    pub const ORDER: [PassKind; 8] = [
        Self::Shadow,
        Self::Contrast,
        Self::ChromaticAberration,
        Self::Noise,
        Self::PaperGrain,
        Self::LightBar,
        Self::Weathering,
        Self::Binding,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Shadow => "shadow",
            Self::Contrast => "contrast",
            Self::ChromaticAberration => "chromatic aberration",
            Self::Noise => "noise",
            Self::PaperGrain => "paper grain",
            Self::LightBar => "light bar",
            Self::Weathering => "weathering",
            Self::Binding => "binding",
        }
    }
}

/// Which passes ran on a surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Passes that ran to completion.
    pub applied: Vec<PassKind>,
    /// Passes that were off and never invoked.
    pub skipped: Vec<PassKind>,
    /// One `EffectSkipped` per pass that failed.
    pub warnings: Vec<RenderWarning>,
}

impl PassReport {
    pub fn was_applied(&self, pass: PassKind) -> bool {
        self.applied.contains(&pass)
    }

    /// True when no pass touched the surface.
    pub fn is_untouched(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Runs the enabled passes of an `EffectConfig` over a surface.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    effects: EffectConfig,
    scale: f32,
}

impl PostProcessor {
    /// `effects` is resolved here, so a scanner preset turns into its
    /// concrete passes. `scale` is surface pixels per logical pixel.
    pub fn new(effects: &EffectConfig, scale: f32) -> Self {
        Self {
            effects: effects.resolved(),
            scale,
        }
    }

    /// True when `pass` would be invoked.
    pub fn is_enabled(&self, pass: PassKind) -> bool {
        let e = &self.effects;
        match pass {
            PassKind::Shadow => e.shadow.is_active(),
            PassKind::Contrast => e.contrast_active(),
            PassKind::ChromaticAberration => e.chromatic_aberration.is_active(),
            PassKind::Noise => e.noise.is_active(),
            PassKind::PaperGrain => e.paper_grain.is_active(),
            PassKind::LightBar => e.light_bar.is_active(),
            PassKind::Weathering => e.weathering.is_active(),
            PassKind::Binding => e.binding.is_active(),
        }
    }

    /// Run every enabled pass over `surface` in pipeline order.
    #[instrument(skip_all, fields(width = surface.width(), height = surface.height()))]
    pub fn run<R: Rng + ?Sized>(&self, surface: &mut Surface, rng: &mut R) -> PassReport {
        let mut report = PassReport::default();

        for pass in PassKind::ORDER {
            if !self.is_enabled(pass) {
                report.skipped.push(pass);
                continue;
            }
            match self.apply(pass, surface, rng) {
                Ok(()) => {
                    debug!(pass = pass.name(), "Pass applied");
                    report.applied.push(pass);
                }
                Err(err) => {
                    warn!(pass = pass.name(), error = %err, "Pass failed, skipping");
                    report.warnings.push(RenderWarning::EffectSkipped {
                        pass: pass.name().into(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            applied = report.applied.len(),
            failed = report.warnings.len(),
            "Post-processing complete"
        );
        report
    }

    fn apply<R: Rng + ?Sized>(&self, pass: PassKind, surface: &mut Surface, rng: &mut R) -> Result<()> {
        check_surface(surface)?;
        let e = &self.effects;
        match pass {
            PassKind::Shadow => {
                *surface = shadow::drop_shadow(surface, &e.shadow, self.scale)?;
                Ok(())
            }
            PassKind::Contrast => tone::contrast(surface, e.contrast.intensity),
            PassKind::ChromaticAberration => {
                tone::chromatic_aberration(surface, tone::chromatic_offset(e.chromatic_aberration.level()))
            }
            PassKind::Noise => tone::noise(surface, e.noise.level(), rng),
            PassKind::PaperGrain => {
                let texture = grain::GrainTexture::generate(rng);
                texture.multiply_onto(surface, e.paper_grain.level())
            }
            PassKind::LightBar => tone::light_bar(surface, e.light_bar.level()),
            PassKind::Weathering => wear::weathering(surface, e.weathering.level(), self.scale, rng),
            PassKind::Binding => wear::binding_holes(surface, self.scale),
        }
    }
}

fn check_surface(surface: &Surface) -> Result<()> {
    if surface.width() == 0 || surface.height() == 0 {
        return Err(InkwellError::ImageError("surface has no pixels".into()));
    }
    Ok(())
}
