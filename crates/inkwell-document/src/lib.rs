// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inkwell-document — The Inkwell rendering pipeline.
//
// Compiles markup into a document tree, lays it out on a page, draws it with
// per-character handwriting jitter, runs the paper and scanner effects, and
// exports the finished pages as PNG images or a paginated PDF.

pub mod assembler;
pub mod effects;
pub mod export;
pub mod layout;
pub mod markup;
pub mod pdf;
pub mod raster;
pub mod realism;
pub mod render;
pub mod typography;

// Re-export the primary types so callers can use `inkwell_document::PageRenderer` etc.
pub use assembler::{CancelToken, DocumentAssembler, EditingSession, LiveContent, Page};
pub use effects::{PassKind, PassReport, PostProcessor};
pub use export::{encode_png, export_pngs};
pub use layout::{LayoutEngine, LayoutOutput};
pub use markup::{Compiled, compile, compile_with_diagnostics};
pub use pdf::writer::PdfWriter;
pub use raster::Compositor;
pub use realism::{GlyphTransform, RealismModulator};
pub use render::{PageRenderer, RenderedPage};
pub use typography::{BlockGlyphs, FontGlyphs, GlyphRasterizer, MathTypesetter, SymbolTypesetter, TextMeasure};
