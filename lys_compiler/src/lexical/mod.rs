//! Lexical analysis for Lys source text
//!
//! The [`Tokenizer`] reads characters from a [`CharSource`] and produces
//! tokens on demand; the parser pulls them through a
//! [`TokenCursor`](crate::tokens::TokenCursor). [`tokenize_source`] drains a
//! whole source eagerly, which is what token dumps and tests want.

pub mod error;
pub mod source;
pub mod tokenizer;

use crate::config::constants::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::logging::codes;
use crate::tokens::{Token, TokenKind};
use crate::utils::Span;
use crate::{log_debug, log_error, log_success};
use std::io::BufRead;

pub use error::LexerError;
pub use source::{CharSource, ReaderCharSource, StringCharSource};
pub use tokenizer::{LexicalMetrics, Tokenizer};

// ============================================================================
// MODULE API
// ============================================================================

/// Tokenizer over an in-memory source
pub fn create_tokenizer(source: &str) -> Tokenizer<StringCharSource> {
    Tokenizer::new(StringCharSource::new(source))
}

/// Tokenizer streaming from a reader
pub fn create_reader_tokenizer<R: BufRead>(reader: R) -> Tokenizer<ReaderCharSource<R>> {
    Tokenizer::new(ReaderCharSource::new(reader))
}

/// Tokenize a whole source, including the final end-of-document token
pub fn tokenize_source(source: &str) -> Result<Vec<Token>, LexerError> {
    tokenize_source_with_preferences(source, LexicalPreferences::default())
}

pub fn tokenize_source_with_preferences(
    source: &str,
    preferences: LexicalPreferences,
) -> Result<Vec<Token>, LexerError> {
    let mut tokenizer = create_tokenizer(source);
    let mut tokens = Vec::new();

    log_debug!("Starting lexical analysis",
        "char_count" => source.chars().count(),
        "max_tokens_allowed" => MAX_TOKEN_COUNT
    );

    loop {
        let token = match tokenizer.read() {
            Ok(token) => token,
            Err(error) => {
                log_error!(error.error_code(), &error.to_string(),
                    span = Span::at(error.offset()),
                    "tokens_read" => tokens.len()
                );
                return Err(error);
            }
        };
        let done = token.kind == TokenKind::EndOfDocument;
        tokens.push(token);
        if done {
            break;
        }
    }

    if preferences.log_token_statistics {
        report_metrics(tokenizer.metrics());
    }

    Ok(tokens)
}

/// Emit a success event with the statistics of a finished run
pub fn report_metrics(metrics: &LexicalMetrics) {
    log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
        "tokens" => metrics.total_tokens,
        "names" => metrics.name_tokens,
        "literals" => metrics.literal_tokens,
        "operators" => metrics.operator_tokens,
        "comments" => metrics.comment_count,
        "replayed" => metrics.replayed_tokens
    );
}

// ============================================================================
// MODULE INITIALIZATION AND VALIDATION
// ============================================================================

/// Validate that every lexical error code is registered and the limits are usable
pub fn validate_tokenization() -> Result<(), String> {
    let test_codes = [
        codes::lexical::UNRECOGNIZED_CHARACTER,
        codes::lexical::UNTERMINATED_LITERAL,
        codes::lexical::INVALID_NUMBER,
        codes::lexical::INVALID_BIT_LENGTH,
        codes::lexical::INVALID_ESCAPE,
        codes::lexical::INVALID_CHARACTER_LITERAL,
        codes::lexical::SOURCE_TOO_LARGE,
        codes::lexical::TOO_MANY_TOKENS,
        codes::lexical::LITERAL_TOO_LONG,
    ];

    for code in &test_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    if MAX_TOKEN_COUNT == 0 {
        return Err("MAX_TOKEN_COUNT cannot be zero".to_string());
    }
    if MAX_NAME_LENGTH == 0 {
        return Err("MAX_NAME_LENGTH cannot be zero".to_string());
    }
    if MAX_PUSHBACK_DEPTH < 2 {
        return Err("MAX_PUSHBACK_DEPTH must allow the float probe to restore two characters".to_string());
    }

    Ok(())
}

// ============================================================================
// ANALYSIS HELPERS
// ============================================================================

/// Token distribution of a drained source
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenCounts {
    pub total: usize,
    pub names: usize,
    pub reserved_names: usize,
    pub integers: usize,
    pub floats: usize,
    pub strings: usize,
    pub symbols: usize,
}

pub fn get_token_counts(tokens: &[Token]) -> TokenCounts {
    let mut counts = TokenCounts::default();
    for token in tokens {
        if token.kind == TokenKind::EndOfDocument {
            continue;
        }
        counts.total += 1;
        match token.kind {
            TokenKind::Name => counts.names += 1,
            TokenKind::ReservedName => counts.reserved_names += 1,
            TokenKind::DecInt | TokenKind::HexInt | TokenKind::BinInt => counts.integers += 1,
            TokenKind::Float => counts.floats += 1,
            TokenKind::String => counts.strings += 1,
            _ => counts.symbols += 1,
        }
    }
    counts
}

/// One line per token: offset, kind and text
pub fn format_token_dump(tokens: &[Token]) -> String {
    let mut output = String::new();
    for token in tokens {
        output.push_str(&format!("{:>6}  {:<20} {}\n", token.position, format!("{:?}", token.kind), token));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_tokenize_source_ends_with_eof() {
        let tokens = tokenize_source("int8 main() { return 1; }").unwrap();
        assert_eq!(tokens.len(), 10);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfDocument));
    }

    #[test]
    fn test_tokenize_source_reports_offset() {
        let err = tokenize_source("x = \"abc").unwrap_err();
        assert_matches!(err, LexerError::UnexpectedEnd { offset: 8 });
    }

    #[test]
    fn test_reader_tokenizer_matches_string_tokenizer() {
        let source = "namespace a { void f() { x.y = .5; } }\n";
        let expected = tokenize_source(source).unwrap();

        let mut tokenizer = create_reader_tokenizer(std::io::Cursor::new(source));
        let mut actual = Vec::new();
        loop {
            let token = tokenizer.read().unwrap();
            let done = token.kind == TokenKind::EndOfDocument;
            actual.push(token);
            if done {
                break;
            }
        }
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_token_counts() {
        let tokens = tokenize_source("$(1) + f(2.0, \"s\", x)").unwrap();
        let counts = get_token_counts(&tokens);
        assert_eq!(counts.reserved_names, 1);
        assert_eq!(counts.integers, 1);
        assert_eq!(counts.floats, 1);
        assert_eq!(counts.strings, 1);
        assert_eq!(counts.names, 2);
        assert_eq!(counts.symbols, 7);
        assert_eq!(counts.total, 13);
    }

    #[test]
    fn test_token_dump_lists_offsets() {
        let tokens = tokenize_source("a;").unwrap();
        let dump = format_token_dump(&tokens);
        assert!(dump.contains("Name"));
        assert!(dump.contains("EndOfInstruction"));
        assert_eq!(dump.lines().count(), 3);
    }

    #[test]
    fn test_validate_tokenization() {
        assert!(validate_tokenization().is_ok());
    }
}
