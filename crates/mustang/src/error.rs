//! Error types for template rendering.
//!
//! This module provides [`RenderError`], the single error type returned by every
//! rendering and inspection entry point. Syntax errors carry the offending tag
//! text and the 1-based line it starts on.
//!
//! Missing data is never an error: an unresolved name renders as an empty
//! string, an unresolved section is elided and an unknown partial expands to
//! nothing.

use thiserror::Error;

/// Error type for template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A close tag with no matching open tag, or a close tag that does not
    /// match the innermost open section.
    #[error("unbalanced section: \"{tag}\" on line {line}")]
    UnbalancedSection { tag: String, line: usize },

    /// A section open tag that is never closed.
    #[error("missing section end for \"{tag}\" on line {line}")]
    UnclosedSection { tag: String, line: usize },

    /// A set-delimiter tag whose body is malformed.
    #[error("invalid set-delimiter tag \"{tag}\" on line {line}")]
    InvalidDelimiters { tag: String, line: usize },

    /// An opening delimiter with no closing delimiter before end of input.
    #[error("unclosed tag \"{tag}\" on line {line}")]
    UnclosedTag { tag: String, line: usize },

    /// A token reached the interpreter that it has no handler for.
    #[error("unexpected token \"{tag}\" on line {line}")]
    UnexpectedToken { tag: String, line: usize },

    /// Template not found in the engine or registry.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Data could not be converted into a render value.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (e.g., reading a template from disk).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Returns the 1-based source line for syntax errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            RenderError::UnbalancedSection { line, .. }
            | RenderError::UnclosedSection { line, .. }
            | RenderError::InvalidDelimiters { line, .. }
            | RenderError::UnclosedTag { line, .. }
            | RenderError::UnexpectedToken { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Returns the offending tag text for syntax errors.
    pub fn tag(&self) -> Option<&str> {
        match self {
            RenderError::UnbalancedSection { tag, .. }
            | RenderError::UnclosedSection { tag, .. }
            | RenderError::InvalidDelimiters { tag, .. }
            | RenderError::UnclosedTag { tag, .. }
            | RenderError::UnexpectedToken { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Whether this error describes malformed template markup.
    pub fn is_syntax_error(&self) -> bool {
        self.line().is_some()
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
