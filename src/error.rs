//! Error values returned by the filter core.

/// Everything that can go wrong between filter source text and a verdict.
///
/// Values are comparable so callers can branch on a specific condition,
/// e.g. `err == FilterError::MalformedParenthesis`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unterminated quoted identifier starting at offset {offset}")]
    UnterminatedIdentifier { offset: usize },

    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("negative array index at offset {offset} is not supported")]
    NegativeIndex { offset: usize },

    #[error("unknown function '{name}' at offset {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("function {name} takes {expected} argument(s), got {found}")]
    Arity {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("malformed parenthesis")]
    MalformedParenthesis,

    #[error("compile error: {0}")]
    Compile(String),

    #[error("document decode error: {0}")]
    Decode(String),
}

impl FilterError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        FilterError::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// True for errors raised while parsing source text.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            FilterError::Syntax { .. }
                | FilterError::UnterminatedIdentifier { .. }
                | FilterError::UnterminatedString { .. }
                | FilterError::NegativeIndex { .. }
                | FilterError::UnknownFunction { .. }
                | FilterError::Arity { .. }
        )
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
