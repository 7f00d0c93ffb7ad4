// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — page geometry, word wrap, and draw instructions.

pub mod engine;
pub mod geometry;
pub mod instruction;

pub use engine::{LayoutEngine, LayoutOutput, Region};
pub use geometry::{Frame, PageGeometry};
pub use instruction::{Decoration, DrawInstruction, GlyphRun, MathPlacement};
