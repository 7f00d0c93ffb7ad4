// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout engine — greedy word wrap of a document tree into draw instructions.

use inkwell_core::config::StyleConfig;
use inkwell_core::document::{Block, DocumentTree, Inline, MathBlock, PageContent, Run, Script};
use inkwell_core::error::RenderWarning;
use inkwell_core::types::{Alignment, Color, MAX_FONT_SIZE, bounded_font_size};
use tracing::{debug, instrument, warn};

use super::geometry::{Frame, PageGeometry};
use super::instruction::{Decoration, DrawInstruction, GlyphRun, MathPlacement};
use crate::typography::{FontSpec, MathTypesetter, TextMeasure, TypesetError, TypesetFormula};

/// Heading size relative to the region's base size.
pub const HEADING_SCALE: f32 = 1.5;
/// Size of `small` runs relative to their surroundings.
pub const SMALL_SCALE: f32 = 0.8;
/// Baseline shift of super/subscripts as a fraction of the unscripted size.
pub const SCRIPT_SHIFT: f32 = 0.3;
/// Block formulas wider than this multiple of the line are scaled down to fit.
pub const MATH_OVERFLOW_TOLERANCE: f32 = 1.2;

/// Everything layout produced for a page or region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutOutput {
    pub instructions: Vec<DrawInstruction>,
    /// Lines laid out, including empty ones.
    pub line_count: usize,
    /// True when some region ran past its bottom edge.
    pub overflowed: bool,
    pub warnings: Vec<RenderWarning>,
}

/// A rectangle of the page plus the base text style used inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub frame: Frame,
    pub font_size: f32,
    pub ink: Color,
    pub align: Alignment,
}

impl Region {
    pub fn main(style: &StyleConfig, frame: Frame) -> Self {
        Self {
            name: "main",
            frame,
            font_size: style.font_size,
            ink: style.ink_color,
            align: Alignment::Left,
        }
    }

    pub fn header(style: &StyleConfig, frame: Frame) -> Self {
        Self {
            name: "header",
            frame,
            font_size: style.header.font_size,
            ink: style.header.ink_color,
            align: Alignment::Center,
        }
    }

    pub fn side_notes(style: &StyleConfig, frame: Frame) -> Self {
        Self {
            name: "side notes",
            frame,
            font_size: style.side_note.font_size,
            ink: style.side_note.ink_color,
            align: Alignment::Left,
        }
    }
}

/// Lays out document trees using a text measurer and a math typesetter.
pub struct LayoutEngine<'a, M: TextMeasure + ?Sized> {
    measure: &'a M,
    math: &'a dyn MathTypesetter,
}

impl<'a, M: TextMeasure + ?Sized> LayoutEngine<'a, M> {
    pub fn new(measure: &'a M, math: &'a dyn MathTypesetter) -> Self {
        Self { measure, math }
    }

    /// Lay out `tree` inside the style's margins of a `page_width` x
    /// `page_height` page.
    #[instrument(skip_all, fields(blocks = tree.len(), page_width, page_height))]
    pub fn layout(
        &self,
        tree: &DocumentTree,
        style: &StyleConfig,
        page_width: f32,
        page_height: f32,
    ) -> LayoutOutput {
        let frame = Frame::inside_margins(&style.margins, page_width, page_height);
        let mut out = LayoutOutput::default();
        self.layout_region(tree, style, &Region::main(style, frame), &mut out);
        debug!(lines = out.line_count, "Layout complete");
        out
    }

    /// Lay out all three regions of a page on the style's page preset.
    #[instrument(skip_all, fields(page_size = ?style.page_size))]
    pub fn layout_page(&self, content: &PageContent, style: &StyleConfig) -> LayoutOutput {
        let geometry = PageGeometry::for_style(style);
        let mut out = LayoutOutput::default();

        if let Some(frame) = geometry.header {
            self.layout_region(&content.header, style, &Region::header(style, frame), &mut out);
        }
        if let Some(frame) = geometry.side {
            self.layout_region(
                &content.side_notes,
                style,
                &Region::side_notes(style, frame),
                &mut out,
            );
        }
        self.layout_region(&content.main, style, &Region::main(style, geometry.main), &mut out);

        debug!(
            lines = out.line_count,
            instructions = out.instructions.len(),
            "Page layout complete"
        );
        out
    }

    /// Lay out one tree into `region`, appending to `out`. Line indices
    /// continue from whatever `out` already holds.
    pub fn layout_region(
        &self,
        tree: &DocumentTree,
        style: &StyleConfig,
        region: &Region,
        out: &mut LayoutOutput,
    ) {
        let mut flow = Flow {
            measure: self.measure,
            math: self.math,
            style,
            region,
            out,
            y: region.frame.top + region.font_size * style.line_height,
            overflowed: false,
            ctx: BlockContext::for_region(region),
            line: LineBuffer::default(),
            wrapped: false,
        };

        for block in tree.blocks() {
            match block {
                Block::Paragraph(paragraph) => {
                    flow.ctx = BlockContext {
                        align: paragraph.alignment.unwrap_or(region.align),
                        indent: finite_or_zero(paragraph.margin_left).max(0.0),
                        ..BlockContext::for_region(region)
                    };
                    flow.y += finite_or_zero(paragraph.margin_top);
                    flow.text_block(&paragraph.children);
                }
                Block::Heading(heading) => {
                    flow.ctx = BlockContext {
                        size: explicit_size(heading.font_size, region.font_size * HEADING_SCALE),
                        color: heading.color.unwrap_or(region.ink),
                        bold: true,
                        ..BlockContext::for_region(region)
                    };
                    flow.text_block(&heading.children);
                }
                Block::Math(math) => {
                    flow.ctx = BlockContext {
                        align: math.align.unwrap_or(region.align),
                        ..BlockContext::for_region(region)
                    };
                    flow.math_block(math);
                }
            }
            flow.y += style.letter_spacing;
        }
    }
}

/// A size set on a node, or `fallback` when it is missing or unusable.
/// Either way the result never exceeds [`MAX_FONT_SIZE`].
fn explicit_size(size: Option<f32>, fallback: f32) -> f32 {
    size.and_then(bounded_font_size)
        .unwrap_or(fallback)
        .min(MAX_FONT_SIZE)
}

fn finite_or_zero(value: Option<f32>) -> f32 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

// -- Flow state ---------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct BlockContext {
    size: f32,
    color: Color,
    bold: bool,
    align: Alignment,
    indent: f32,
}

impl BlockContext {
    fn for_region(region: &Region) -> Self {
        Self {
            size: region.font_size,
            color: region.ink,
            bold: false,
            align: region.align,
            indent: 0.0,
        }
    }
}

/// Resolved style of one run.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: FontSpec,
    color: Color,
    decoration: Decoration,
    /// Upward baseline shift.
    rise: f32,
    /// Size the line height is computed from (scripts do not shrink it).
    line_size: f32,
}

/// Instructions of the line being filled, positioned relative to the line's
/// start and its baseline.
#[derive(Debug, Default)]
struct LineBuffer {
    items: Vec<DrawInstruction>,
    width: f32,
    /// Width of trailing whitespace at the end of the line.
    trailing: f32,
    max_size: f32,
    /// Source child the last text item came from, so consecutive words merge.
    last_child: Option<usize>,
}

impl LineBuffer {
    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

struct Flow<'r, M: TextMeasure + ?Sized> {
    measure: &'r M,
    math: &'r dyn MathTypesetter,
    style: &'r StyleConfig,
    region: &'r Region,
    out: &'r mut LayoutOutput,
    /// Baseline of the next line.
    y: f32,
    overflowed: bool,
    ctx: BlockContext,
    line: LineBuffer,
    /// The current line started because the previous one was full.
    wrapped: bool,
}

impl<M: TextMeasure + ?Sized> Flow<'_, M> {
    fn avail(&self) -> f32 {
        (self.region.frame.width - self.ctx.indent).max(1.0)
    }

    fn text_block(&mut self, children: &[Inline]) {
        self.wrapped = false;
        for (index, child) in children.iter().enumerate() {
            match child {
                Inline::Text(run) => self.add_run(run, index),
                Inline::Math(math) => self.add_inline_math(math, index),
            }
        }
        self.flush_line(false);
    }

    fn text_style(&self, run: &Run) -> TextStyle {
        let mut base = explicit_size(run.font_size, self.ctx.size);
        if run.small {
            base *= SMALL_SCALE;
        }
        let (size, rise) = match run.script {
            Some(Script::Superscript) => (base * self.style.superscript_size, base * SCRIPT_SHIFT),
            Some(Script::Subscript) => (base * self.style.subscript_size, -base * SCRIPT_SHIFT),
            None => (base, 0.0),
        };
        TextStyle {
            font: FontSpec {
                size,
                bold: run.bold || self.ctx.bold,
                italic: run.italic,
            },
            color: run.color.unwrap_or(self.ctx.color),
            decoration: Decoration {
                underline: run.underline,
                strike: run.strike,
                highlight: run.highlight,
            },
            rise,
            line_size: base,
        }
    }

    fn add_run(&mut self, run: &Run, child: usize) {
        let style = self.text_style(run);
        self.add_text(&run.text, child, &style);
    }

    fn add_text(&mut self, text: &str, child: usize, style: &TextStyle) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.flush_line(false);
            }
            for word in piece.split_inclusive(' ') {
                self.add_word(word, child, style);
            }
        }
    }

    fn add_word(&mut self, word: &str, child: usize, style: &TextStyle) {
        let visible = word.trim_end_matches(' ');
        if visible.is_empty() && self.line.is_empty() && self.wrapped {
            return;
        }

        let visible_width = self.measure.measure(visible, &style.font);
        if !self.line.is_empty() && self.line.width + visible_width > self.avail() {
            self.flush_line(true);
            if visible.is_empty() {
                return;
            }
        }

        if visible_width > self.avail() {
            self.break_word(word, child, style);
            return;
        }

        let width = self.measure.measure(word, &style.font);
        self.append_text(word, width, width - visible_width, child, style);
    }

    /// Split a word that cannot fit on any line across as many lines as needed.
    fn break_word(&mut self, word: &str, child: usize, style: &TextStyle) {
        let mut chunk = String::new();
        let mut chunk_width = 0.0;
        for ch in word.chars() {
            let advance = self.measure.advance(ch, &style.font);
            if !chunk.is_empty() && ch != ' ' && chunk_width + advance > self.avail() {
                self.append_text(&chunk, chunk_width, 0.0, child, style);
                self.flush_line(true);
                chunk.clear();
                chunk_width = 0.0;
            }
            chunk.push(ch);
            chunk_width += advance;
        }
        if !chunk.is_empty() {
            let visible = self.measure.measure(chunk.trim_end_matches(' '), &style.font);
            self.append_text(&chunk, chunk_width, chunk_width - visible, child, style);
        }
    }

    fn append_text(&mut self, text: &str, width: f32, trailing: f32, child: usize, style: &TextStyle) {
        let line = &mut self.line;
        match line.items.last_mut() {
            Some(DrawInstruction::Glyphs(prev)) if line.last_child == Some(child) => {
                prev.text.push_str(text);
                prev.width += width;
            }
            _ => line.items.push(DrawInstruction::Glyphs(GlyphRun {
                text: text.to_string(),
                x: line.width,
                y: -style.rise,
                font: style.font,
                color: style.color,
                width,
                decoration: style.decoration,
                line: 0,
            })),
        }
        line.last_child = Some(child);
        line.width += width;
        line.trailing = trailing;
        line.max_size = line.max_size.max(style.line_size);
    }

    fn typeset(&self, formula: &str, display: bool, size: f32) -> Result<TypesetFormula, TypesetError> {
        let measure = self.measure;
        self.math
            .typeset(formula, display, size, &|ch, font| measure.advance(ch, font))
    }

    fn formula_fallback(&mut self, formula: &str, reason: &TypesetError) {
        warn!(formula, %reason, "Formula drawn as raw source");
        self.out.warnings.push(RenderWarning::FormulaFallback {
            formula: formula.to_string(),
            reason: reason.to_string(),
        });
    }

    fn fallback_style(&self, size: f32, color: Color) -> TextStyle {
        TextStyle {
            font: FontSpec {
                size,
                bold: self.ctx.bold,
                italic: false,
            },
            color,
            decoration: Decoration::default(),
            rise: 0.0,
            line_size: size,
        }
    }

    /// An inline formula is one unbreakable word padded by `math_spacing`.
    fn add_inline_math(&mut self, math: &MathBlock, child: usize) {
        let size = explicit_size(math.font_size, self.ctx.size);
        let color = math.color.unwrap_or(self.ctx.color);
        let typeset = match self.typeset(&math.formula, !math.inline, size) {
            Ok(typeset) => typeset,
            Err(reason) => {
                self.formula_fallback(&math.formula, &reason);
                let style = self.fallback_style(size, color);
                self.add_text(&math.formula, child, &style);
                return;
            }
        };

        let pad = self.style.math_spacing;
        if !self.line.is_empty() && self.line.width + typeset.width + 2.0 * pad > self.avail() {
            self.flush_line(true);
        }
        let fit = (self.avail() - 2.0 * pad).max(1.0);
        let scale = if typeset.width > fit {
            fit / typeset.width
        } else {
            1.0
        };
        let typeset = if scale < 1.0 { typeset.scaled(scale) } else { typeset };

        let line = &mut self.line;
        let width = typeset.width + 2.0 * pad;
        line.max_size = line.max_size.max(size * scale).max(typeset.height());
        line.items.push(DrawInstruction::Math(MathPlacement {
            formula: math.formula.clone(),
            inline: true,
            x: line.width + pad,
            y: 0.0,
            scale,
            color,
            font_size: size,
            align: self.ctx.align,
            typeset,
            line: 0,
        }));
        line.width += width;
        line.trailing = pad;
        line.last_child = None;
    }

    /// A formula on its own line. Formulas far wider than the line shrink to fit.
    fn math_block(&mut self, math: &MathBlock) {
        let size = explicit_size(math.font_size, self.ctx.size);
        let color = math.color.unwrap_or(self.ctx.color);
        self.wrapped = false;

        match self.typeset(&math.formula, !math.inline, size) {
            Ok(typeset) => {
                let avail = self.avail();
                let scale = if typeset.width > avail * MATH_OVERFLOW_TOLERANCE {
                    avail / typeset.width
                } else {
                    1.0
                };
                let typeset = if scale < 1.0 { typeset.scaled(scale) } else { typeset };
                let line = &mut self.line;
                line.width = typeset.width;
                line.max_size = (size * scale).max(typeset.height());
                line.items.push(DrawInstruction::Math(MathPlacement {
                    formula: math.formula.clone(),
                    inline: math.inline,
                    x: 0.0,
                    y: 0.0,
                    scale,
                    color,
                    font_size: size,
                    align: self.ctx.align,
                    typeset,
                    line: 0,
                }));
            }
            Err(reason) => {
                self.formula_fallback(&math.formula, &reason);
                let style = self.fallback_style(size, color);
                self.add_text(&math.formula, 0, &style);
            }
        }
        self.flush_line(false);
    }

    /// Place the buffered line at the current baseline and advance.
    fn flush_line(&mut self, wrapped: bool) {
        let mut line = std::mem::take(&mut self.line);
        self.wrapped = wrapped;

        let index = self.out.line_count;
        self.out.line_count += 1;
        let baseline = self.y;
        if baseline > self.region.frame.bottom() && !self.overflowed {
            self.overflowed = true;
            self.out.overflowed = true;
            warn!(region = self.region.name, "Content overflows its region");
            self.out.warnings.push(RenderWarning::ContentOverflow {
                region: self.region.name.to_string(),
            });
        }

        if let Some(DrawInstruction::Glyphs(last)) = line.items.last_mut() {
            let kept = last.text.trim_end_matches(' ').len();
            if kept < last.text.len() {
                last.text.truncate(kept);
                last.width = (last.width - line.trailing).max(0.0);
            }
            line.width -= line.trailing;
        } else if line.items.last().is_some() {
            line.width -= line.trailing;
        }

        let slack = (self.avail() - line.width).max(0.0);
        let dx = match self.ctx.align {
            Alignment::Left => 0.0,
            Alignment::Center => slack / 2.0,
            Alignment::Right => slack,
        };
        let origin = self.region.frame.left + self.ctx.indent + dx;
        self.out.instructions.extend(
            line.items
                .into_iter()
                .filter(|item| !matches!(item, DrawInstruction::Glyphs(run) if run.text.is_empty()))
                .map(|item| item.place(origin, baseline, index)),
        );

        let size = if line.max_size > 0.0 {
            line.max_size
        } else {
            self.ctx.size
        };
        self.y += size * self.style.line_height + self.style.word_spacing;
    }
}
