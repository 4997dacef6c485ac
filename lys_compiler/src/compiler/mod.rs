//! Code generation - lowered program to a JavaScript object literal
//!
//! The [`JavascriptCompiler`] checks types while it generates code, so every
//! semantic diagnostic of the language is raised from here.

mod error;
mod javascript;
mod namespace;
mod scope;
mod stack;

pub use error::{CompileError, CompileResult};
pub use javascript::JavascriptCompiler;
pub use namespace::{NamespaceNode, NamespaceTree};
pub use scope::{ScopeArena, ScopeId, VariableSet};
pub use stack::{mask, StackElement};

use crate::config::runtime::CompilerPreferences;
use crate::log_error;
use crate::syntax::Program;
use crate::utils::Span;

/// Generate code for a parsed program with default preferences
pub fn compile_program(program: Program) -> CompileResult<String> {
    compile_with_preferences(program, CompilerPreferences::default())
}

pub fn compile_with_preferences(
    program: Program,
    preferences: CompilerPreferences,
) -> CompileResult<String> {
    let result = JavascriptCompiler::new(program)
        .with_preferences(preferences)
        .compile();

    if let Err(error) = &result {
        log_error!(error.error_code(), &error.to_string(),
            span = Span::at(error.position()),
            "stage" => "compile",
            "internal" => error.is_internal()
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;
    use assert_matches::assert_matches;

    #[test]
    fn test_compile_program() {
        let program = parse_source("namespace t { bool main() { return true; } }").unwrap();
        let output = compile_program(program).unwrap();
        assert!(output.starts_with("{\n\tt: {\n"));
        assert!(output.contains("return true;"));
    }

    #[test]
    fn test_compile_errors_are_semantic() {
        let program = parse_source("void f() { x++; }").unwrap();
        assert_matches!(
            compile_program(program),
            Err(CompileError::Semantic { offset: 11, .. })
        );
    }
}
