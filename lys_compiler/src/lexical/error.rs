use crate::config::constants::compile_time::lexical::*;
use crate::logging::codes;

/// Lexical analysis errors. Every variant carries the character offset it is reported at.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("Unrecognized character: {character}")]
    UnrecognizedCharacter { character: char, offset: usize },

    #[error("Unexpected end of document")]
    UnexpectedEnd { offset: usize },

    #[error("Unrecognized escape sequence")]
    InvalidEscape { offset: usize },

    #[error("Empty character")]
    EmptyCharacter { offset: usize },

    #[error("Too many characters")]
    TooManyCharacters { offset: usize },

    #[error("Expected bit length")]
    ExpectedBitLength { offset: usize },

    #[error("Bit length {bits} is not supported for integers.")]
    UnsupportedIntBits { bits: u64, offset: usize },

    #[error("Bit length {bits} is not supported for floats.")]
    UnsupportedFloatBits { bits: u64, offset: usize },

    #[error("Invalid hex number: expected digits after '0x'.")]
    MissingHexDigits { offset: usize },

    #[error("Invalid binary number: expected digits after '0b'.")]
    MissingBinaryDigits { offset: usize },

    #[error("Invalid float: integer or fractional part is required")]
    MissingFloatDigits { offset: usize },

    #[error("Invalid float: expected exponent after 'E'")]
    MissingExponent { offset: usize },

    #[error("Source too large: more than {MAX_SOURCE_SIZE} characters")]
    SourceTooLarge { offset: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize, offset: usize },

    #[error("Literal too long: {length} characters (max {limit})")]
    LiteralTooLong {
        length: usize,
        limit: usize,
        offset: usize,
    },

    #[error("Failed to read source: {message}")]
    Io { message: String, offset: usize },
}

impl LexerError {
    pub fn offset(&self) -> usize {
        match self {
            LexerError::UnrecognizedCharacter { offset, .. }
            | LexerError::UnexpectedEnd { offset }
            | LexerError::InvalidEscape { offset }
            | LexerError::EmptyCharacter { offset }
            | LexerError::TooManyCharacters { offset }
            | LexerError::ExpectedBitLength { offset }
            | LexerError::UnsupportedIntBits { offset, .. }
            | LexerError::UnsupportedFloatBits { offset, .. }
            | LexerError::MissingHexDigits { offset }
            | LexerError::MissingBinaryDigits { offset }
            | LexerError::MissingFloatDigits { offset }
            | LexerError::MissingExponent { offset }
            | LexerError::SourceTooLarge { offset }
            | LexerError::TooManyTokens { offset, .. }
            | LexerError::LiteralTooLong { offset, .. }
            | LexerError::Io { offset, .. } => *offset,
        }
    }

    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::UnrecognizedCharacter { .. } => codes::lexical::UNRECOGNIZED_CHARACTER,
            LexerError::UnexpectedEnd { .. } => codes::lexical::UNTERMINATED_LITERAL,
            LexerError::InvalidEscape { .. } => codes::lexical::INVALID_ESCAPE,
            LexerError::EmptyCharacter { .. } | LexerError::TooManyCharacters { .. } => {
                codes::lexical::INVALID_CHARACTER_LITERAL
            }
            LexerError::ExpectedBitLength { .. }
            | LexerError::UnsupportedIntBits { .. }
            | LexerError::UnsupportedFloatBits { .. } => codes::lexical::INVALID_BIT_LENGTH,
            LexerError::MissingHexDigits { .. }
            | LexerError::MissingBinaryDigits { .. }
            | LexerError::MissingFloatDigits { .. }
            | LexerError::MissingExponent { .. } => codes::lexical::INVALID_NUMBER,
            LexerError::SourceTooLarge { .. } => codes::lexical::SOURCE_TOO_LARGE,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
            LexerError::LiteralTooLong { .. } => codes::lexical::LITERAL_TOO_LONG,
            LexerError::Io { .. } => codes::system::IO_ERROR,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, LexerError::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_diagnostics() {
        let err = LexerError::UnsupportedIntBits {
            bits: 2048,
            offset: 3,
        };
        assert_eq!(
            err.to_string(),
            "Bit length 2048 is not supported for integers."
        );
        assert_eq!(err.offset(), 3);
        assert_eq!(err.error_code(), codes::lexical::INVALID_BIT_LENGTH);

        let err = LexerError::UnrecognizedCharacter {
            character: '#',
            offset: 0,
        };
        assert_eq!(err.to_string(), "Unrecognized character: #");
    }

    #[test]
    fn test_io_errors_use_system_code() {
        let err = LexerError::Io {
            message: "broken pipe".to_string(),
            offset: 10,
        };
        assert!(err.is_io());
        assert_eq!(err.error_code(), codes::system::IO_ERROR);
    }
}
