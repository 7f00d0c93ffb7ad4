// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paper background — fill, ruling pattern, and margin rules.

use image::RgbaImage;
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use inkwell_core::config::StyleConfig;
use inkwell_core::types::{Color, Ruling};

use super::{mix, rgba};
use crate::layout::geometry::{DOUBLE_RULE_GAP, PageGeometry};

/// A blank sheet in the paper color.
pub fn blank_sheet(width: u32, height: u32, paper: Color) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), rgba(paper))
}

/// Paint the ruling and margin rules of `style` onto a fresh sheet.
/// `scale` converts logical pixels to surface pixels.
pub fn paint_paper(canvas: &mut RgbaImage, style: &StyleConfig, geometry: &PageGeometry, scale: f32) {
    let line_color = mix(style.paper_color, style.line_color, style.line_opacity);
    let stroke = scale.round().max(1.0) as u32;
    let (w, h) = canvas.dimensions();
    let spacing = style.line_spacing * scale;

    // Ruling starts below the header strip when there is one.
    let ruled_top = geometry
        .header_rule_y
        .map_or(0.0, |y| (y + DOUBLE_RULE_GAP) * scale);

    if spacing >= 1.0 {
        let rows = || {
            (1..)
                .map(move |k| k as f32 * spacing)
                .take_while(move |y| *y < h as f32)
                .filter(move |y| *y > ruled_top)
        };
        let columns = || (1..).map(move |k| k as f32 * spacing).take_while(move |x| *x < w as f32);

        match style.ruling {
            Ruling::Ruled => {
                for y in rows() {
                    hline(canvas, y, 0, w, stroke, line_color);
                }
            }
            Ruling::Grid => {
                for y in rows() {
                    hline(canvas, y, 0, w, stroke, line_color);
                }
                let top = ruled_top.round() as i32;
                for x in columns() {
                    let rect = Rect::at(x.round() as i32, top).of_size(stroke, (h as i32 - top).max(1) as u32);
                    draw_filled_rect_mut(canvas, rect, rgba(line_color));
                }
            }
            Ruling::Dotted => {
                let radius = stroke as i32;
                for y in rows() {
                    for x in columns() {
                        draw_filled_circle_mut(
                            canvas,
                            (x.round() as i32, y.round() as i32),
                            radius,
                            rgba(line_color),
                        );
                    }
                }
            }
            Ruling::None => {}
        }
    }

    // Double rules: a line at the boundary and a second one just past it.
    if let Some(y) = geometry.header_rule_y {
        for offset in [0.0, DOUBLE_RULE_GAP] {
            hline(canvas, (y + offset) * scale, 0, w, stroke, style.margin_color);
        }
    }
    if let Some(x) = geometry.side_rule_x {
        let top = geometry.header_rule_y.map_or(0.0, |y| (y + DOUBLE_RULE_GAP) * scale);
        for offset in [0.0, DOUBLE_RULE_GAP] {
            let left = ((x + offset) * scale).round() as i32;
            let top = top.round() as i32;
            let rect = Rect::at(left, top).of_size(stroke, (h as i32 - top).max(1) as u32);
            draw_filled_rect_mut(canvas, rect, rgba(style.margin_color));
        }
    }
}

fn hline(canvas: &mut RgbaImage, y: f32, x: u32, width: u32, stroke: u32, color: Color) {
    let rect = Rect::at(x as i32, y.round() as i32).of_size(width.max(1), stroke);
    draw_filled_rect_mut(canvas, rect, rgba(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(style: &StyleConfig) -> RgbaImage {
        let geometry = PageGeometry::for_style(style);
        let mut canvas = blank_sheet(geometry.width as u32, geometry.height as u32, style.paper_color);
        paint_paper(&mut canvas, style, &geometry, 1.0);
        canvas
    }

    #[test]
    fn blank_paper_is_uniform() {
        let style = StyleConfig::blank_paper();
        let canvas = painted(&style);
        assert!(canvas.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn ruled_lines_fall_on_the_spacing() {
        let style = StyleConfig {
            show_margins: false,
            ..StyleConfig::default()
        };
        let canvas = painted(&style);
        let expected = mix(style.paper_color, style.line_color, style.line_opacity);
        assert_eq!(canvas.get_pixel(100, 24).0, rgba(expected).0);
        assert_eq!(canvas.get_pixel(100, 36).0, [255, 255, 255, 255]);
    }

    #[test]
    fn margin_rules_use_margin_color() {
        let style = StyleConfig {
            ruling: Ruling::None,
            ..StyleConfig::default()
        };
        let canvas = painted(&style);
        let margin = rgba(style.margin_color).0;
        assert_eq!(canvas.get_pixel(400, 45).0, margin);
        assert_eq!(canvas.get_pixel(400, 48).0, margin);
        let side = (794.0f32 * 0.15).floor() as u32;
        assert_eq!(canvas.get_pixel(side, 600).0, margin);
        assert_eq!(canvas.get_pixel(side + 3, 600).0, margin);
        assert_eq!(canvas.get_pixel(side + 1, 600).0, [255, 255, 255, 255]);
    }
}
