// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end scenarios: markup in, pages out.

use image::{Rgba, RgbaImage};
use inkwell_core::config::{Effect, EffectConfig, RenderConfig, StyleConfig};
use inkwell_core::document::{Block, Inline, PageContent};
use inkwell_core::error::{AnomalyKind, InkwellError, RenderWarning};
use inkwell_document::effects::tone::chromatic_offset;
use inkwell_document::layout::{DrawInstruction, PageGeometry};
use inkwell_document::{
    BlockGlyphs, CancelToken, Compositor, DocumentAssembler, EditingSession, LayoutEngine, Page,
    PageRenderer, PassKind, PdfWriter, PostProcessor, SymbolTypesetter, TextMeasure, compile,
    compile_with_diagnostics,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn session(markup: &str, effects: EffectConfig) -> EditingSession {
    let mut session = EditingSession::new(StyleConfig::default(), effects);
    session.set_markup(markup);
    session
}

fn renderer(seed: Option<u64>) -> PageRenderer {
    PageRenderer::builtin(RenderConfig {
        scale: 1.0,
        seed,
        ..RenderConfig::default()
    })
}

/// Every effect that draws randomness switched off; shadow and contrast
/// stay on.
fn deterministic_effects() -> EffectConfig {
    EffectConfig {
        ink_flow: Effect::off(0.5),
        pen_pressure: Effect::off(0.4),
        noise: Effect::off(0.2),
        paper_grain: Effect::off(0.3),
        contrast: Effect::on(1.3),
        ..EffectConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Markup
// ---------------------------------------------------------------------------

/// `{b: hello}` compiles to one bold run.
#[test]
fn bold_command_compiles_to_a_single_bold_run() {
    let tree = compile("{b: hello}");
    let Block::Paragraph(paragraph) = &tree.blocks()[0] else {
        panic!("expected a paragraph, got {:?}", tree.blocks());
    };
    assert_eq!(paragraph.children.len(), 1);
    let run = paragraph.children[0].as_run().expect("run");
    assert_eq!(run.text, "hello");
    assert!(run.bold);
}

/// `{latex: x^2}` compiles to one inline math block.
#[test]
fn latex_command_compiles_to_inline_math() {
    let tree = compile("{latex: x^2}");
    assert_eq!(tree.len(), 1);
    let Block::Math(math) = &tree.blocks()[0] else {
        panic!("expected math, got {:?}", tree.blocks());
    };
    assert_eq!(math.formula, "x^2");
    assert!(math.inline);
}

/// Unknown commands keep their text and are reported.
#[test]
fn unknown_command_is_kept_and_reported() {
    let compiled = compile_with_diagnostics("see {sparkle: this}");
    assert!(compiled.tree.plain_text().contains("this"));
    assert!(matches!(
        compiled.anomalies.as_slice(),
        [RenderWarning::MarkupAnomaly { kind: AnomalyKind::UnknownCommand, line: 1, .. }]
    ));
}

/// Odd parameter values and runaway nesting still compile and render.
#[test]
fn hostile_markup_compiles_and_renders() {
    let huge_size = format!("{{b: big, font-size: {}}}", "9".repeat(40));
    let deep = format!("{}deep{}", "{i: ".repeat(2_000), "}".repeat(2_000));
    let deep_formula = format!("{{latex: {}x{}}}", "{".repeat(2_000), "}".repeat(2_000));
    let markup = [
        "{b: x, color: a\u{e9}xyz}",
        "{u: y, color: #\u{ff10}\u{ff10}}",
        huge_size.as_str(),
        deep.as_str(),
        deep_formula.as_str(),
    ]
    .join("\n");

    let compiled = compile_with_diagnostics(&markup);
    assert!(compiled.anomalies.iter().any(|a| matches!(
        a,
        RenderWarning::MarkupAnomaly { kind: AnomalyKind::TooDeeplyNested, line: 4, .. }
    )));
    let sizes: Vec<f32> = compiled
        .tree
        .blocks()
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(p) => Some(p.children.iter()),
            _ => None,
        })
        .flatten()
        .filter_map(|inline| inline.as_run()?.font_size)
        .collect();
    assert_eq!(sizes, vec![inkwell_core::MAX_FONT_SIZE]);

    let page = Page::capture(
        PageContent::main_only(compiled.tree),
        &StyleConfig::default(),
        &EffectConfig::disabled(),
    );
    let rendered = renderer(Some(5)).render(&page, 0).expect("render");
    assert!(rendered
        .warnings
        .iter()
        .any(|w| matches!(w, RenderWarning::FormulaFallback { .. })));
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A heading line and a body line give two laid-out lines, with the heading
/// bold at one and a half times the base size.
#[test]
fn heading_and_body_lay_out_on_two_lines() {
    let tree = compile("{heading: Title}\nBody text");
    assert_eq!(tree.len(), 2);
    let Block::Heading(heading) = &tree.blocks()[0] else {
        panic!("expected heading");
    };
    assert_eq!(heading.children, vec![Inline::Text(inkwell_core::Run::plain("Title"))]);
    let Block::Paragraph(body) = &tree.blocks()[1] else {
        panic!("expected paragraph");
    };
    assert_eq!(body.children, vec![Inline::Text(inkwell_core::Run::plain("Body text"))]);

    let style = StyleConfig::default();
    let glyphs = BlockGlyphs::default();
    let math = SymbolTypesetter::default();
    let out = LayoutEngine::new(&glyphs, &math).layout(&tree, &style, 794.0, 1123.0);
    assert_eq!(out.line_count, 2);

    let DrawInstruction::Glyphs(title) = &out.instructions[0] else {
        panic!("expected glyphs");
    };
    assert_eq!(title.text, "Title");
    assert_eq!(title.font.size, style.font_size * 1.5);
    assert!(title.font.bold);
}

/// No glyph run ends past the right margin by more than one character.
#[test]
fn wrapped_text_stays_inside_the_margin() {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20)
        + "Pneumonoultramicroscopicsilicovolcanoconiosis"
        + &"x".repeat(150)
        + " {b: bold words} and {i: italic ones} and {latex: a^2+b^2=c^2} too";
    let style = StyleConfig::default();
    let glyphs = BlockGlyphs::default();
    let math = SymbolTypesetter::default();
    let (width, height) = (794.0, 1123.0);
    let out = LayoutEngine::new(&glyphs, &math).layout(&compile(&text), &style, width, height);

    let limit = width - style.margins.right;
    let widest_char = glyphs.advance('W', &inkwell_document::typography::FontSpec::regular(style.font_size));
    assert!(out.line_count > 5);
    for instruction in &out.instructions {
        assert!(
            instruction.right() <= limit + widest_char + 0.01,
            "{instruction:?} ends at {}",
            instruction.right()
        );
        assert!(instruction.x() >= style.margins.left - 0.01);
    }
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

fn composited(markup: &str) -> RgbaImage {
    let style = StyleConfig::default();
    let glyphs = BlockGlyphs::default();
    let math = SymbolTypesetter::default();
    let geometry = PageGeometry::for_style(&style);
    let out = LayoutEngine::new(&glyphs, &math).layout_page(&PageContent::main_only(compile(markup)), &style);
    Compositor::new(&glyphs, 1.0).composite(
        &out.instructions,
        &style,
        &geometry,
        &EffectConfig::disabled(),
        &mut StdRng::seed_from_u64(0),
    )
}

/// With every effect off the pipeline returns the surface untouched and
/// never invokes a pass.
#[test]
fn disabled_pipeline_is_identity_and_short_circuits() {
    let raw = composited("{heading: Idle}\nNothing should change.");
    let mut surface = raw.clone();
    let report = PostProcessor::new(&EffectConfig::disabled(), 1.0)
        .run(&mut surface, &mut StdRng::seed_from_u64(9));
    assert_eq!(surface, raw);
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped.len(), PassKind::ORDER.len());
}

/// Chromatic aberration at 0.5 shifts channels by two pixels; on a white
/// page that changes nothing, but the pass still runs.
#[test]
fn chromatic_aberration_runs_on_a_white_page() {
    assert_eq!(chromatic_offset(0.5), 2);

    let white = RgbaImage::from_pixel(120, 80, Rgba([255, 255, 255, 255]));
    let run = |intensity: f32| {
        let effects = EffectConfig {
            chromatic_aberration: Effect::on(intensity),
            ..EffectConfig::disabled()
        };
        let mut surface = white.clone();
        let report = PostProcessor::new(&effects, 1.0).run(&mut surface, &mut StdRng::seed_from_u64(1));
        (surface, report)
    };
    let (shifted, report) = run(0.5);
    let (unshifted, idle) = run(0.0);
    assert!(report.was_applied(PassKind::ChromaticAberration));
    assert!(!idle.was_applied(PassKind::ChromaticAberration));
    assert_eq!(shifted, unshifted);
}

// ---------------------------------------------------------------------------
// Rendering and export
// ---------------------------------------------------------------------------

/// With randomized effects off, two unseeded renders are pixel-identical.
#[test]
fn renders_without_random_effects_are_deterministic() {
    let page = Page::capture(
        PageContent::main_only(compile("Same page {latex: \\alpha + \\beta}\n{u: twice}")),
        &StyleConfig::default(),
        &deterministic_effects(),
    );
    let a = renderer(None).render(&page, 0).expect("render");
    let b = renderer(None).render(&page, 3).expect("render");
    assert_eq!(a.image, b.image);
    assert!(a.passes.was_applied(PassKind::Shadow));
    assert!(a.passes.was_applied(PassKind::Contrast));
}

/// Adding a page, starting a new document, then exporting still yields
/// exactly one image built from the live content.
#[test]
fn export_after_new_document_captures_live_content() {
    let live = session("{center: Live}", EffectConfig::disabled());
    let mut assembler = DocumentAssembler::new();
    assembler.capture_page(&live);
    assembler.new_document();

    let rendered = assembler
        .render_document(&live, &renderer(Some(1)), &CancelToken::new())
        .expect("render");
    assert_eq!(rendered.len(), 1);

    let images: Vec<RgbaImage> = rendered.into_iter().map(|r| r.image).collect();
    let bytes = PdfWriter::new(inkwell_core::PageSize::A4)
        .create_from_images(&images)
        .expect("pdf");
    let doc = lopdf::Document::load_mem(&bytes).expect("parse pdf");
    assert_eq!(doc.get_pages().len(), 1);
}

/// A three-page document becomes a three-page PDF on disk.
#[test]
fn multi_page_pdf_has_one_page_per_capture() {
    let mut assembler = DocumentAssembler::new();
    for text in ["Monday", "Tuesday", "Wednesday"] {
        assembler.capture_page(&session(text, EffectConfig::disabled()));
    }
    let rendered = assembler
        .render_document(&session("", EffectConfig::disabled()), &renderer(Some(2)), &CancelToken::new())
        .expect("render");
    let images: Vec<RgbaImage> = rendered.into_iter().map(|r| r.image).collect();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("week.pdf");
    PdfWriter::new(inkwell_core::PageSize::Letter)
        .with_title("Week")
        .write_to_file(&images, &path)
        .expect("write");
    let doc = lopdf::Document::load(&path).expect("parse pdf");
    assert_eq!(doc.get_pages().len(), 3);
}

/// Exporting nothing is the one fatal outcome.
#[test]
fn empty_export_fails_without_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("none.pdf");
    let err = PdfWriter::new(inkwell_core::PageSize::A4)
        .write_to_file(&[], &path)
        .expect_err("nothing to export");
    assert!(matches!(err, InkwellError::NothingToExport(_)));
    assert!(!path.exists());
}

/// Side notes and a header render alongside the main region.
#[test]
fn page_regions_all_reach_the_surface() {
    let mut live = session("Main body", EffectConfig::disabled());
    live.set_header("{b: Chapter 1}");
    live.set_side_notes("note");
    let mut assembler = DocumentAssembler::new();
    assembler.capture_page(&live);
    let rendered = assembler
        .render_document(&live, &renderer(Some(3)), &CancelToken::new())
        .expect("render");
    let image = &rendered[0].image;

    let geometry = PageGeometry::for_style(&live.style);
    let inked = |frame: inkwell_document::layout::Frame| {
        (frame.top as u32..frame.bottom() as u32).any(|y| {
            (frame.left as u32..frame.right() as u32).any(|x| image.get_pixel(x, y).0[0] < 64)
        })
    };
    assert!(inked(geometry.header.expect("header")));
    assert!(inked(geometry.side.expect("side")));
    assert!(inked(geometry.main));
}
