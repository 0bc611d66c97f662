//! Domain errors

use thiserror::Error;

/// Raised when identifier text does not match its grammar.
///
/// Format errors are local: they fail fast at parse time and never travel
/// over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Empty {kind}")]
    Empty { kind: &'static str },

    #[error("Invalid {kind} '{text}'")]
    Grammar { kind: &'static str, text: String },

    #[error("Invalid {kind} '{text}': expected at most {max} characters")]
    TooLong {
        kind: &'static str,
        text: String,
        max: usize,
    },

    #[error("Unknown country code '{0}'")]
    UnknownCountry(String),

    #[error("Inconsistent {kind} '{text}': {reason}")]
    Inconsistent {
        kind: &'static str,
        text: String,
        reason: &'static str,
    },
}

impl FormatError {
    pub(crate) fn grammar(kind: &'static str, text: impl Into<String>) -> Self {
        Self::Grammar {
            kind,
            text: text.into(),
        }
    }
}

/// Result type for identifier parsing
pub type FormatResult<T> = Result<T, FormatError>;
