// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every export failure is mapped to plain English with a clear suggestion.
// Severity drives how a front end presents it.

use crate::error::InkwellError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again may work.
    Transient,
    /// The user must change something first (add content, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the same operation could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert an `InkwellError` into a `HumanError`.
pub fn humanize_error(err: &InkwellError) -> HumanError {
    match err {
        InkwellError::NothingToExport(_) => HumanError {
            message: "There's nothing to export yet.".into(),
            suggestion: "Write something on the page or add a page, then export again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        InkwellError::Cancelled { completed, total } => HumanError {
            message: "The export was cancelled.".into(),
            suggestion: format!(
                "{completed} of {total} pages were rendered before stopping. No file was written; start the export again when ready."
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        InkwellError::ImageError(_) => HumanError {
            message: "A page image couldn't be produced.".into(),
            suggestion: "Try a smaller render scale or a different page size.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        InkwellError::PdfError(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "Try exporting as PNG images instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        InkwellError::Font(detail) => HumanError {
            message: "The handwriting font couldn't be loaded.".into(),
            suggestion: format!("Check that the font file is a valid TrueType or OpenType font. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        InkwellError::Config(detail) => HumanError {
            message: "One of the settings isn't valid.".into(),
            suggestion: format!("Fix the setting and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        InkwellError::RenderTask(_) => HumanError {
            message: "Rendering stopped unexpectedly.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        InkwellError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Inkwell doesn't have permission to use that location.".into(),
                    suggestion: "Choose a different output folder or check its permissions.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        InkwellError::Serialization(_) => HumanError {
            message: "A settings or document file couldn't be read.".into(),
            suggestion: "Check that the file is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_export_is_action_required() {
        let human = humanize_error(&InkwellError::NothingToExport("no pages".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn cancellation_is_retriable_and_reports_progress() {
        let human = humanize_error(&InkwellError::Cancelled {
            completed: 2,
            total: 5,
        });
        assert!(human.retriable);
        assert!(human.suggestion.contains("2 of 5"));
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = InkwellError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn pdf_failure_is_permanent() {
        let human = humanize_error(&InkwellError::PdfError("bad image".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }
}
