// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Inkwell.
//
// Only export-level failures are errors. Everything that can be recovered while
// producing a page (odd markup, a formula that will not typeset, a filter pass
// that cannot run) is reported as a `RenderWarning` alongside the output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Inkwell operations.
#[derive(Debug, Error)]
pub enum InkwellError {
    // -- Export errors --
    #[error("nothing to export: {0}")]
    NothingToExport(String),

    #[error("export cancelled after {completed} of {total} pages")]
    Cancelled { completed: usize, total: usize },

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("font could not be loaded: {0}")]
    Font(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Runtime --
    #[error("render task failed: {0}")]
    RenderTask(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InkwellError>;

/// What was odd about a markup fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// A `{` with no matching `}` before the end of the line.
    UnclosedBrace,
    /// A `}` with no opening `{`.
    StrayClosingBrace,
    /// A command name the compiler does not know.
    UnknownCommand,
    /// A command that needs content but had none.
    EmptyCommand,
    /// Commands nested deeper than the compiler follows; kept as literal text.
    TooDeeplyNested,
}

/// A recoverable problem encountered while producing a page.
///
/// Warnings never stop output; they are collected on the render result and
/// logged as they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderWarning {
    /// The markup compiler recovered from a malformed or unknown fragment.
    MarkupAnomaly {
        line: usize,
        fragment: String,
        kind: AnomalyKind,
    },
    /// A formula could not be typeset and was drawn as its raw source.
    FormulaFallback { formula: String, reason: String },
    /// A post-processing pass failed and was skipped.
    EffectSkipped { pass: String, reason: String },
    /// Laid-out content ran past the bottom of its region.
    ContentOverflow { region: String },
}

impl std::fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkupAnomaly {
                line,
                fragment,
                kind,
            } => write!(f, "line {line}: {kind:?} in `{fragment}`"),
            Self::FormulaFallback { formula, reason } => {
                write!(f, "formula `{formula}` drawn as text: {reason}")
            }
            Self::EffectSkipped { pass, reason } => write!(f, "{pass} pass skipped: {reason}"),
            Self::ContentOverflow { region } => write!(f, "{region} content overflows the page"),
        }
    }
}
