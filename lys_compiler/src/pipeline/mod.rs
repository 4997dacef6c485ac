//! Complete compilation of one unit: source -> tokens -> operations -> JavaScript
//!
//! The first diagnostic aborts the unit; there is no partial output.

mod error;

pub use error::PipelineError;

use crate::compiler::compile_with_preferences;
use crate::config::runtime::RuntimeConfig;
use crate::ir::format_operations;
use crate::lexical::{
    create_reader_tokenizer, create_tokenizer, format_token_dump,
    tokenize_source_with_preferences, LexerError,
};
use crate::logging::{self, codes};
use crate::syntax::{parse_with_preferences, SyntaxError};
use crate::tokens::TokenSource;
use crate::utils::SourceMap;
use crate::{log_debug, log_info, log_performance};
use std::fs;
use std::io::BufRead;
use std::path::Path;
use std::time::Instant;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Unit name used for in-memory sources
pub const MEMORY_UNIT: &str = "<memory>";

/// Compile an in-memory source with the preferences from the environment
pub fn compile_source(source: &str) -> PipelineResult<String> {
    compile_unit(MEMORY_UNIT, source, &RuntimeConfig::default())
}

pub fn compile_unit(name: &str, source: &str, config: &RuntimeConfig) -> PipelineResult<String> {
    logging::with_unit_context(name, source.chars().count(), || {
        run(name, create_tokenizer(source), config).inspect_err(|error| {
            if let Some(excerpt) = locate(source, error) {
                log_debug!("Diagnostic location", "excerpt" => excerpt);
            }
        })
    })
}

/// Line/column excerpt of the source at the error offset
pub fn locate(source: &str, error: &PipelineError) -> Option<String> {
    let offset = error.position()?;
    Some(SourceMap::new(source).format_excerpt(offset))
}

pub fn compile_file<P: AsRef<Path>>(path: P) -> PipelineResult<String> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|error| PipelineError::io(&name, error))?;
    compile_unit(&name, &source, &RuntimeConfig::default())
}

/// Compile a source streamed from `reader`, e.g. standard input
pub fn compile_reader<R: BufRead>(name: &str, reader: R, config: &RuntimeConfig) -> PipelineResult<String> {
    logging::with_unit_context(name, 0, || run(name, create_reader_tokenizer(reader), config))
}

fn run<S>(name: &str, source: S, config: &RuntimeConfig) -> PipelineResult<String>
where
    S: TokenSource<Error = LexerError>,
{
    let start = Instant::now();
    log_info!("Compiling unit", "unit" => name);

    let program = parse_with_preferences(source, config.syntax.clone())?;
    let parsed = start.elapsed();
    let output = compile_with_preferences(program, config.compiler.clone())?;

    log_performance!(codes::success::PIPELINE_COMPLETE, "Compilation pipeline completed",
        duration = start.elapsed(),
        "unit" => name,
        "parse_ms" => format!("{:.3}", parsed.as_secs_f64() * 1000.0),
        "bytes" => output.len()
    );
    Ok(output)
}

/// Token listing of a source, one token per line
pub fn dump_tokens(source: &str, config: &RuntimeConfig) -> PipelineResult<String> {
    let tokens = tokenize_source_with_preferences(source, config.lexical.clone())
        .map_err(SyntaxError::from)?;
    Ok(format_token_dump(&tokens))
}

/// Operations of every function, each block headed by the function signature
pub fn dump_operations(source: &str, config: &RuntimeConfig) -> PipelineResult<String> {
    let program = parse_with_preferences(create_tokenizer(source), config.syntax.clone())?;
    let mut dump = String::new();
    for function in program.functions() {
        dump.push_str(&format!(
            "// {} #{}\n",
            function.signature.describe(),
            function.signature.index
        ));
        dump.push_str(&format_operations(&function.body));
        dump.push('\n');
    }
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileError;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_masked_addition_end_to_end() {
        let output =
            compile_source("namespace t { int8 main() { int8 x = 3; return x + 2; } }").unwrap();
        assert!(output.starts_with("{\n\tt: {\n\t\t\"main#0\": function() {\n"));
        assert!(output.contains("\t\t\tvar x=(3|0);\n"));
        assert!(output.contains("\t\t\treturn (((x<<24>>24)+(2|0))<<24>>24);\n"));
        assert!(output.ends_with("\t},\n}\n"));
    }

    #[test]
    fn test_string_initializer_for_bool_fails_at_declaration() {
        let error = compile_source("void f() { bool b = 1 + \"s\"; }").unwrap_err();
        assert_eq!(error.exit_code(), 0x102);
        assert_matches!(
            &error,
            PipelineError::Compile(CompileError::Semantic { message, .. })
                if message == "Cannot convert string to bool"
        );
    }

    #[test]
    fn test_async_captures_only_free_variables() {
        let output = compile_source(
            "void f() { int32 x = 1; int32 y = 2; string s = \"a\"; async(0) { x = x + 1; } }",
        )
        .unwrap();
        assert!(output.contains("$vm.async((0|0), (function(x) { return function() {\n"));
        assert!(output.contains("\t\t\t(x=(((x|0)+(1|0))|0));\n"));
        assert!(output.contains("\t\t}; })(x));\n"));
    }

    #[test]
    fn test_first_compatible_overload_wins() {
        let output = compile_source(
            "void f(float32 a) { } void f(int32 a) { } void main() { f(1); }",
        )
        .unwrap();
        assert!(output.contains("$vm.user(\"f#0\")((1|0));"));
    }

    #[test]
    fn test_syntax_error_report() {
        let error = compile_source("void f() { int32 x = 1 }").unwrap_err();
        assert_eq!(error.exit_code(), 0x101);
        assert_eq!(error.position(), Some(23));
        assert_eq!(error.to_string(), "Syntax error at 23\nExpected ';'");
    }

    #[test]
    fn test_locate_points_at_offending_line() {
        let source = "void f() {\n\tint32 x = 1\n}";
        let error = compile_source(source).unwrap_err();
        let excerpt = locate(source, &error).unwrap();
        assert!(excerpt.starts_with("  --> 3:1\n"));
        assert!(excerpt.contains("3 | }\n"));
    }

    #[test]
    fn test_lexical_error_is_a_syntax_error() {
        let error = compile_source("void f() { string s = \"open; }").unwrap_err();
        assert_matches!(error, PipelineError::Syntax(SyntaxError::Lexical(_)));
    }

    #[test]
    fn test_compile_file_and_reader_agree() {
        let source = "namespace demo { float32 half(float32 v) { return v / 2; } }";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(source.as_bytes()).unwrap();

        let from_file = compile_file(file.path()).unwrap();
        let from_reader =
            compile_reader("<stdin>", source.as_bytes(), &RuntimeConfig::default()).unwrap();
        assert_eq!(from_file, from_reader);
        assert!(from_file.contains("return (v/(2|0));"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = compile_file(dir.path().join("absent.lys")).unwrap_err();
        assert_matches!(error, PipelineError::Io { .. });
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_dumps() {
        let config = RuntimeConfig::default();
        let tokens = dump_tokens("int32 x;", &config).unwrap();
        assert!(!tokens.is_empty());

        let operations = dump_operations("void f() { g(); }", &config).unwrap();
        assert!(operations.starts_with("// void f() #0\n"));
        assert!(operations.contains("LoadFunction g\nCall 0\nPop\n"));
    }
}
