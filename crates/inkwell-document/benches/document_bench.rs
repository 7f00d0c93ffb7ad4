// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the inkwell-document pipeline: layout of a long
// page, and the post-processing passes over a full A4 surface.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use inkwell_core::config::{Effect, EffectConfig, StyleConfig};
use inkwell_document::{BlockGlyphs, LayoutEngine, PostProcessor, SymbolTypesetter, compile};
use rand::SeedableRng;
use rand::rngs::StdRng;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Lay out forty lines of mixed markup with the block glyph metrics, so the
/// measurement is word wrapping and math setting rather than font access.
fn bench_layout(c: &mut Criterion) {
    let line = "{b: Lecture notes}: the {i: integral} {latex: \\int_0^1 x^2 dx = \\frac{1}{3}} \
                converges, and {u: so does} the sum of {mark: every} term in the series.";
    let markup = vec![line; 40].join("\n");
    let tree = compile(&markup);
    let style = StyleConfig::default();
    let glyphs = BlockGlyphs::default();
    let math = SymbolTypesetter::default();

    c.bench_function("layout (40 lines)", |b| {
        b.iter(|| {
            let engine = LayoutEngine::new(&glyphs, &math);
            black_box(engine.layout(black_box(&tree), &style, 794.0, 1123.0));
        });
    });
}

/// Run the scanner preset with grain and weathering over a blank A4 page at
/// 1x scale.
fn bench_post_processing(c: &mut Criterion) {
    let page = RgbaImage::from_pixel(794, 1123, Rgba([255, 255, 255, 255]));
    let effects = EffectConfig {
        scanner: Effect::on(1.0),
        weathering: Effect::on(0.5),
        ..EffectConfig::default()
    };
    let processor = PostProcessor::new(&effects, 1.0);

    c.bench_function("post_processing (A4, scanner)", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| {
            let mut surface = black_box(page.clone());
            black_box(processor.run(&mut surface, &mut rng));
        });
    });
}

criterion_group!(benches, bench_layout, bench_post_processing);
criterion_main!(benches);
