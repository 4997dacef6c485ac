//! Syntax errors raised while reading the document structure and function bodies
//!
//! Lexical failures surface through [`SyntaxError::Lexical`] so that callers
//! only deal with one diagnostic kind per stage.

use crate::lexical::LexerError;
use crate::logging::{codes, Code};
use crate::tokens::Token;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("{0}")]
    Lexical(#[from] LexerError),

    #[error("{message}")]
    UnexpectedToken { message: String, offset: usize },

    #[error("{message}")]
    MissingDelimiter { message: String, offset: usize },

    #[error("Unrecognized type: {name}")]
    UnrecognizedType { name: String, offset: usize },

    #[error("{message}")]
    Duplicate { message: String, offset: usize },

    #[error("{message}")]
    InvalidName { message: String, offset: usize },

    #[error("Unexpected end of document")]
    UnexpectedEnd { offset: usize },

    #[error("Too many {what} (max {limit})")]
    LimitExceeded {
        what: &'static str,
        limit: usize,
        offset: usize,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyntaxError {
    /// `Unexpected token: <token>`
    pub fn unexpected(token: &Token) -> Self {
        Self::UnexpectedToken {
            message: format!("Unexpected token: {}", token),
            offset: token.position,
        }
    }

    pub fn unexpected_message(message: impl Into<String>, offset: usize) -> Self {
        Self::UnexpectedToken {
            message: message.into(),
            offset,
        }
    }

    /// A required token is missing, e.g. `Expected ';'`
    pub fn expected(message: impl Into<String>, offset: usize) -> Self {
        Self::MissingDelimiter {
            message: message.into(),
            offset,
        }
    }

    pub fn unrecognized_type(name: impl Into<String>, offset: usize) -> Self {
        Self::UnrecognizedType {
            name: name.into(),
            offset,
        }
    }

    pub fn duplicate(message: impl Into<String>, offset: usize) -> Self {
        Self::Duplicate {
            message: message.into(),
            offset,
        }
    }

    pub fn invalid_name(message: impl Into<String>, offset: usize) -> Self {
        Self::InvalidName {
            message: message.into(),
            offset,
        }
    }

    /// Source offset the error is reported at
    pub fn position(&self) -> usize {
        match self {
            Self::Lexical(error) => error.offset(),
            Self::UnexpectedToken { offset, .. }
            | Self::MissingDelimiter { offset, .. }
            | Self::UnrecognizedType { offset, .. }
            | Self::Duplicate { offset, .. }
            | Self::InvalidName { offset, .. }
            | Self::UnexpectedEnd { offset }
            | Self::LimitExceeded { offset, .. } => *offset,
            Self::Internal(_) => 0,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Lexical(error) => error.error_code(),
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::MissingDelimiter { .. } => codes::syntax::MISSING_DELIMITER,
            Self::UnrecognizedType { .. } => codes::syntax::UNRECOGNIZED_TYPE,
            Self::Duplicate { .. } => codes::syntax::DUPLICATE_DECLARATION,
            Self::InvalidName { .. } => codes::syntax::INVALID_NAME,
            Self::UnexpectedEnd { .. } => codes::syntax::UNEXPECTED_END,
            Self::LimitExceeded { .. } => codes::syntax::NESTING_TOO_DEEP,
            Self::Internal(_) => codes::system::INTERNAL_ERROR,
        }
    }

    pub fn limit_exceeded(what: &'static str, limit: usize, offset: usize) -> Self {
        Self::LimitExceeded {
            what,
            limit,
            offset,
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::Lexical(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenKind;

    #[test]
    fn test_lexical_errors_keep_offset_and_code() {
        let err: SyntaxError = LexerError::InvalidEscape { offset: 9 }.into();
        assert!(err.is_lexical());
        assert_eq!(err.position(), 9);
        assert_eq!(err.error_code(), codes::lexical::INVALID_ESCAPE);
        assert_eq!(err.to_string(), "Unrecognized escape sequence");
    }

    #[test]
    fn test_unexpected_token_message() {
        let token = Token::new(TokenKind::CurlyBracketRight, 14);
        let err = SyntaxError::unexpected(&token);
        assert_eq!(err.to_string(), "Unexpected token: }");
        assert_eq!(err.position(), 14);
        assert_eq!(err.error_code(), codes::syntax::UNEXPECTED_TOKEN);
    }

    #[test]
    fn test_unrecognized_type_message() {
        let err = SyntaxError::unrecognized_type("a::color", 3);
        assert_eq!(err.to_string(), "Unrecognized type: a::color");
        assert_eq!(err.error_code(), codes::syntax::UNRECOGNIZED_TYPE);
    }

    #[test]
    fn test_limit_message() {
        let err = SyntaxError::limit_exceeded("parameters", 64, 20);
        assert_eq!(err.to_string(), "Too many parameters (max 64)");
        assert_eq!(err.error_code(), codes::syntax::NESTING_TOO_DEEP);
    }
}
