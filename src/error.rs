/// Error handling for the engine.
///
/// Markdown input itself never produces an error: every byte of input folds
/// into some element, with paragraphs and raw text as the universal fallback.
/// The variants below cover the failure modes that remain.
use crate::source::Position;
use std::fmt;

/// Main error type for the engine.
#[derive(Debug)]
pub enum MarkdownError {
    /// A named extension could not be resolved or is malformed.
    Extension { message: String },

    /// No render method could be resolved for an element kind.
    Dispatch { kind: String },

    /// An internal invariant of the inline tokenizer was violated.
    /// Only raised for demonstrable bugs such as delimiter stack corruption.
    Invariant { position: Position, message: String },

    /// I/O related errors (CLI surface only; the core performs no I/O).
    Io { source: std::io::Error },
}

impl fmt::Display for MarkdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkdownError::Extension { message } => {
                write!(f, "Extension error: {}", message)
            }
            MarkdownError::Dispatch { kind } => {
                write!(f, "No render method for element kind '{}'", kind)
            }
            MarkdownError::Invariant { position, message } => {
                write!(
                    f,
                    "Inline parser invariant violated at line {}, column {}: {}",
                    position.line, position.column, message
                )
            }
            MarkdownError::Io { source } => {
                write!(f, "IO error: {}", source)
            }
        }
    }
}

impl std::error::Error for MarkdownError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkdownError::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MarkdownError {
    fn from(error: std::io::Error) -> Self {
        MarkdownError::Io { source: error }
    }
}

/// Convenience type alias for Results in the engine.
pub type Result<T> = std::result::Result<T, MarkdownError>;
