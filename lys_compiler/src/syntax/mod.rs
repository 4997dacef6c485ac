//! Syntax analysis - token stream to lowered program
//!
//! The [`DocumentProcessor`] reads namespaces, type definitions and function
//! headers. Each function body goes through the [`Interpreter`], which lowers
//! statements and expressions straight into operation sequences; no syntax
//! tree is kept.

mod document;
mod error;
mod interpreter;
mod program;

pub use document::DocumentProcessor;
pub use error::{SyntaxError, SyntaxResult};
pub use interpreter::Interpreter;
pub use program::{Namespace, Program, UserFunction};

use crate::config::runtime::SyntaxPreferences;
use crate::lexical::{create_reader_tokenizer, create_tokenizer, LexerError};
use crate::logging::codes;
use crate::tokens::TokenSource;
use crate::types::builtin_types;
use crate::utils::Span;
use crate::{log_debug, log_error, log_success};
use std::io::BufRead;

/// Parse an in-memory document
pub fn parse_source(source: &str) -> SyntaxResult<Program> {
    parse_with_preferences(create_tokenizer(source), SyntaxPreferences::default())
}

/// Parse a document streamed from a reader
pub fn parse_reader<R: BufRead>(reader: R) -> SyntaxResult<Program> {
    parse_with_preferences(create_reader_tokenizer(reader), SyntaxPreferences::default())
}

pub fn parse_with_preferences<S>(source: S, preferences: SyntaxPreferences) -> SyntaxResult<Program>
where
    S: TokenSource<Error = LexerError>,
{
    log_debug!("Starting syntax analysis");

    let types = builtin_types().map_err(|error| SyntaxError::Internal(error.to_string()))?;
    let result = DocumentProcessor::new(source, types)
        .with_preferences(preferences)
        .read();

    match &result {
        Ok(program) => {
            log_success!(
                codes::success::PARSE_COMPLETE,
                "Syntax analysis completed successfully",
                "namespaces" => program.namespaces.len(),
                "functions" => program.function_count()
            );
        }
        Err(error) => {
            log_error!(error.error_code(), &error.to_string(),
                span = Span::at(error.position()),
                "stage" => "syntax"
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::format_operations;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_source_and_reader_agree() {
        let source = "namespace t { int32 twice(int32 x) { return x * 2; } }";
        let from_text = parse_source(source).unwrap();
        let from_reader = parse_reader(source.as_bytes()).unwrap();

        assert_eq!(from_text.function_count(), 1);
        let a: Vec<String> = from_text.functions().map(|f| format_operations(&f.body)).collect();
        let b: Vec<String> = from_reader
            .functions()
            .map(|f| format_operations(&f.body))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lexical_errors_surface_as_syntax_errors() {
        let error = parse_source("void f() { string s = \"open; }").unwrap_err();
        assert!(error.is_lexical());
        assert_matches!(error, SyntaxError::Lexical(_));
    }
}
