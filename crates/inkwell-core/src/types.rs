// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core value types: page sizes, colors, alignment, ruling, margins.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Logical resolution the page presets are defined at.
pub const LOGICAL_DPI: f32 = 96.0;

/// Largest font size, in logical pixels, that text or math is drawn at.
pub const MAX_FONT_SIZE: f32 = 512.0;

/// A usable explicit font size. Non-finite and non-positive sizes are
/// dropped; oversized ones clamp to [`MAX_FONT_SIZE`].
pub fn bounded_font_size(size: f32) -> Option<f32> {
    (size.is_finite() && size > 0.0).then(|| size.min(MAX_FONT_SIZE))
}

/// Standard page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    A5,
    Executive,
}

impl PageSize {
    pub const ALL: [PageSize; 5] = [
        PageSize::A4,
        PageSize::Letter,
        PageSize::Legal,
        PageSize::A5,
        PageSize::Executive,
    ];

    /// Logical page size in pixels (width, height) at 96 DPI.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        match self {
            Self::A4 => (794, 1123),
            Self::Letter => (816, 1056),
            Self::Legal => (816, 1344),
            Self::A5 => (559, 794),
            Self::Executive => (696, 1008),
        }
    }

    /// Physical dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
            Self::A5 => (148.0, 210.0),
            Self::Executive => (184.15, 266.7),
        }
    }

    /// Parse a preset name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "a5" => Some(Self::A5),
            "executive" => Some(Self::Executive),
            _ => None,
        }
    }
}

/// An opaque sRGB color. Serialized as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb`, or the same without the leading `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::from_hex(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{raw}`")))
    }
}

/// Horizontal alignment of a paragraph or math block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Background line pattern printed on the paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ruling {
    #[default]
    Ruled,
    Grid,
    Dotted,
    None,
}

/// Page margins in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 30.0,
            bottom: 40.0,
            left: 30.0,
        }
    }
}
