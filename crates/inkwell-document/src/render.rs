// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page renderer — runs one captured page through layout, compositing, and
// post-processing.

use std::sync::Arc;

use image::RgbaImage;
use inkwell_core::config::RenderConfig;
use inkwell_core::error::{RenderWarning, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::assembler::Page;
use crate::effects::{PassReport, PostProcessor};
use crate::layout::{LayoutEngine, PageGeometry};
use crate::raster::Compositor;
use crate::typography::{BlockGlyphs, GlyphRasterizer, MathTypesetter, SymbolTypesetter};

/// One page's finished raster and everything recovered along the way.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_id: Uuid,
    /// Position of the page in its document.
    pub index: usize,
    pub image: RgbaImage,
    pub warnings: Vec<RenderWarning>,
    pub passes: PassReport,
}

/// Renders captured pages. Cheap to clone; the glyph and math services are
/// shared read-only between clones.
#[derive(Clone)]
pub struct PageRenderer {
    glyphs: Arc<dyn GlyphRasterizer>,
    math: Arc<dyn MathTypesetter>,
    config: RenderConfig,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PageRenderer {
    pub fn new(
        glyphs: Arc<dyn GlyphRasterizer>,
        math: Arc<dyn MathTypesetter>,
        config: RenderConfig,
    ) -> Self {
        Self {
            glyphs,
            math,
            config,
        }
    }

    /// A renderer using the font-free block glyphs and the built-in math
    /// typesetter.
    pub fn builtin(config: RenderConfig) -> Self {
        Self::new(
            Arc::new(BlockGlyphs::default()),
            Arc::new(SymbolTypesetter::default()),
            config,
        )
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The jitter generator for page `index`: `seed + index` when seeded,
    /// fresh OS entropy otherwise.
    pub fn rng_for(&self, index: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_os_rng(),
        }
    }

    /// Render one page. Only invalid configuration is an error; markup,
    /// formula, and effect problems come back as warnings.
    #[instrument(skip_all, fields(page = %page.id, index))]
    pub fn render(&self, page: &Page, index: usize) -> Result<RenderedPage> {
        self.config.validate()?;
        page.style.validate()?;

        let mut rng = self.rng_for(index);
        let geometry = PageGeometry::for_style(&page.style);

        let layout = LayoutEngine::new(self.glyphs.as_ref(), self.math.as_ref())
            .layout_page(&page.content, &page.style);

        let mut image = Compositor::new(self.glyphs.as_ref(), self.config.scale).composite(
            &layout.instructions,
            &page.style,
            &geometry,
            &page.effects,
            &mut rng,
        );

        let passes = PostProcessor::new(&page.effects, self.config.scale).run(&mut image, &mut rng);

        let mut warnings = layout.warnings;
        warnings.extend(passes.warnings.iter().cloned());
        for warning in &warnings {
            warn!(%warning, "Recovered while rendering");
        }

        info!(
            width = image.width(),
            height = image.height(),
            lines = layout.line_count,
            warnings = warnings.len(),
            "Page rendered"
        );

        Ok(RenderedPage {
            page_id: page.id,
            index,
            image,
            warnings,
            passes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::compile;
    use inkwell_core::config::{EffectConfig, StyleConfig};
    use inkwell_core::document::PageContent;

    fn page(markup: &str, effects: EffectConfig) -> Page {
        Page::capture(PageContent::main_only(compile(markup)), &StyleConfig::default(), &effects)
    }

    fn seeded(seed: u64) -> PageRenderer {
        PageRenderer::builtin(RenderConfig {
            scale: 1.0,
            seed: Some(seed),
            ..RenderConfig::default()
        })
    }

    #[test]
    fn rendered_page_is_page_size_times_scale() {
        let renderer = PageRenderer::builtin(RenderConfig {
            seed: Some(1),
            ..RenderConfig::default()
        });
        let rendered = renderer
            .render(&page("Hello", EffectConfig::disabled()), 0)
            .expect("render");
        assert_eq!(rendered.image.dimensions(), (1588, 2246));
        assert!(rendered.passes.is_untouched());
        assert!(rendered.warnings.is_empty());
    }

    #[test]
    fn seeded_renders_repeat_and_pages_differ() {
        let p = page("Dear diary, today I learned Rust.", EffectConfig::default());
        let a = seeded(7).render(&p, 0).expect("render");
        let b = seeded(7).render(&p, 0).expect("render");
        let c = seeded(7).render(&p, 1).expect("render");
        assert_eq!(a.image, b.image);
        assert_ne!(a.image, c.image);
    }

    #[test]
    fn shadow_grows_the_surface() {
        let mut effects = EffectConfig::disabled();
        effects.shadow = Default::default();
        let rendered = seeded(1).render(&page("x", effects), 0).expect("render");
        assert_eq!(rendered.image.dimensions(), (794 + 24, 1123 + 24));
        assert!(rendered.passes.was_applied(crate::effects::PassKind::Shadow));
    }

    #[test]
    fn bad_formula_becomes_a_warning() {
        let rendered = seeded(1)
            .render(&page(r"{latex: \nosuchthing}", EffectConfig::disabled()), 0)
            .expect("render");
        assert!(matches!(
            rendered.warnings.as_slice(),
            [RenderWarning::FormulaFallback { .. }]
        ));
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let renderer = PageRenderer::builtin(RenderConfig {
            scale: 0.0,
            ..RenderConfig::default()
        });
        assert!(renderer.render(&page("x", EffectConfig::disabled()), 0).is_err());
    }
}
