// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Draw instructions — the layout engine's output and the compositor's input.
// Coordinates are logical pixels; `y` is always a baseline.

use inkwell_core::types::{Alignment, Color};

use crate::typography::{FontSpec, TypesetFormula};

/// Line decorations carried by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoration {
    pub underline: bool,
    pub strike: bool,
    pub highlight: bool,
}

/// A stretch of text set in one style on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font: FontSpec,
    pub color: Color,
    /// Measured width of `text`.
    pub width: f32,
    pub decoration: Decoration,
    /// Index of the line on the page, shared by every run on that line.
    pub line: usize,
}

/// A typeset formula placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct MathPlacement {
    pub formula: String,
    pub inline: bool,
    pub x: f32,
    pub y: f32,
    /// Uniform scale already applied to `typeset` to fit the line.
    pub scale: f32,
    pub color: Color,
    /// Requested font size before scaling.
    pub font_size: f32,
    pub align: Alignment,
    pub typeset: TypesetFormula,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawInstruction {
    Glyphs(GlyphRun),
    Math(MathPlacement),
}

impl DrawInstruction {
    pub fn x(&self) -> f32 {
        match self {
            Self::Glyphs(run) => run.x,
            Self::Math(math) => math.x,
        }
    }

    pub fn y(&self) -> f32 {
        match self {
            Self::Glyphs(run) => run.y,
            Self::Math(math) => math.y,
        }
    }

    pub fn width(&self) -> f32 {
        match self {
            Self::Glyphs(run) => run.width,
            Self::Math(math) => math.typeset.width,
        }
    }

    /// Right edge of the instruction.
    pub fn right(&self) -> f32 {
        self.x() + self.width()
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Glyphs(run) => run.line,
            Self::Math(math) => math.line,
        }
    }

    fn shift(&mut self, dx: f32, y: f32, line: usize) {
        match self {
            Self::Glyphs(run) => {
                run.x += dx;
                run.y += y;
                run.line = line;
            }
            Self::Math(math) => {
                math.x += dx;
                math.y += y;
                math.line = line;
            }
        }
    }

    /// Move a line-relative instruction onto the page.
    pub(crate) fn place(mut self, dx: f32, baseline: f32, line: usize) -> Self {
        self.shift(dx, baseline, line);
        self
    }
}
