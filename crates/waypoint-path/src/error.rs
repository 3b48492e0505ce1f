//! Error types for path templates.

use thiserror::Error;

/// Errors raised while compiling templates or building paths from them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The template compiled to an invalid regular expression.
    #[error("invalid path pattern {template:?}: {message}")]
    InvalidPattern {
        /// The offending template.
        template: String,
        /// Message from the regex engine.
        message: String,
    },

    /// A required parameter was not supplied to the builder.
    #[error("expected {name:?} to be {expected}")]
    MissingParam {
        /// Parameter name.
        name: String,
        /// `"a string"` or `"an array"`.
        expected: &'static str,
    },

    /// An array was supplied for a key that does not repeat.
    #[error("expected {0:?} to not repeat, but got array")]
    UnexpectedRepeat(String),

    /// An empty array was supplied for a required repeating key.
    #[error("expected {0:?} to not be empty")]
    EmptyRepeat(String),

    /// A supplied value does not satisfy the key's pattern.
    #[error("expected {name:?} to match {pattern:?}, but got {value:?}")]
    PatternMismatch {
        /// Parameter name.
        name: String,
        /// The key's regex pattern.
        pattern: String,
        /// The encoded value that failed.
        value: String,
    },
}

/// Result type alias for path operations.
pub type Result<T> = std::result::Result<T, PathError>;
