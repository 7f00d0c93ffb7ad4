// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inkwell — Core types, configuration, and error definitions shared across all crates.

pub mod config;
pub mod document;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::{Effect, EffectConfig, InkwellConfig, RegionStyle, RenderConfig, ShadowEffect, StyleConfig};
pub use document::{
    Block, DocumentTree, Heading, Inline, MathBlock, PageContent, Paragraph, Run, Script,
};
pub use error::{InkwellError, RenderWarning};
pub use types::*;
