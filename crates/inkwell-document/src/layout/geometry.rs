// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry — where the header strip, side-note column, and main text
// area sit on a page, in logical pixels.

use inkwell_core::config::StyleConfig;
use inkwell_core::types::Margins;

/// Horizontal padding inside the header strip.
const HEADER_PAD_X: f32 = 20.0;
/// Vertical padding inside the header strip.
const HEADER_PAD_Y: f32 = 5.0;
/// Padding inside the side-note column.
const SIDE_PAD: f32 = 5.0;
/// Gap between the side-note rule and the main text.
const MAIN_PAD: f32 = 15.0;
/// Offset of the second line of a double rule.
pub const DOUBLE_RULE_GAP: f32 = 3.0;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// The area of a `width` x `height` page left inside `margins`.
    pub fn inside_margins(margins: &Margins, width: f32, height: f32) -> Self {
        Self {
            left: margins.left,
            top: margins.top,
            width: (width - margins.left - margins.right).max(0.0),
            height: (height - margins.top - margins.bottom).max(0.0),
        }
    }
}

/// The regions of one page plus the rules separating them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub header: Option<Frame>,
    pub side: Option<Frame>,
    pub main: Frame,
    /// Y of the header's lower rule, when the header is shown.
    pub header_rule_y: Option<f32>,
    /// X of the side column's right rule, when the column is shown.
    pub side_rule_x: Option<f32>,
}

impl PageGeometry {
    /// Geometry for the style's page preset.
    pub fn for_style(style: &StyleConfig) -> Self {
        let (w, h) = style.page_size.pixel_dimensions();
        Self::with_size(style, w as f32, h as f32)
    }

    /// Geometry for an arbitrary page size.
    pub fn with_size(style: &StyleConfig, width: f32, height: f32) -> Self {
        let margins = &style.margins;
        let show_header = style.show_margins && style.show_header_margin;
        let show_side = style.show_margins && style.show_side_margins;

        let header = show_header.then(|| Frame {
            left: HEADER_PAD_X,
            top: HEADER_PAD_Y,
            width: (width - 2.0 * HEADER_PAD_X).max(0.0),
            height: (style.header_height - 2.0 * HEADER_PAD_Y).max(0.0),
        });
        let header_rule_y = show_header.then_some(style.header_height);

        let content_top = if show_header {
            style.header_height + DOUBLE_RULE_GAP + HEADER_PAD_Y
        } else {
            margins.top
        };
        let content_bottom = (height - margins.bottom).max(content_top);

        let side_width = (width * style.side_note_width).floor();
        let side = show_side.then(|| Frame {
            left: SIDE_PAD,
            top: content_top,
            width: (side_width - 2.0 * SIDE_PAD).max(0.0),
            height: content_bottom - content_top,
        });
        let side_rule_x = show_side.then_some(side_width);

        let main_left = if show_side {
            side_width + DOUBLE_RULE_GAP + MAIN_PAD
        } else {
            margins.left
        };
        let main = Frame {
            left: main_left,
            top: content_top,
            width: (width - margins.right - main_left).max(0.0),
            height: content_bottom - content_top,
        };

        Self {
            width,
            height,
            header,
            side,
            main,
            header_rule_y,
            side_rule_x,
        }
    }
}
