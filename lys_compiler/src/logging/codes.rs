//! Diagnostic codes of every compiler stage and their registered metadata
//!
//! Codes are grouped by stage: `ERR0xx` system, `E02x` lexical, `E04x`/`E05x`
//! syntax, `E06x` types, `E07x`/`E08x` code generation, `I0xx` success.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Stable identifier of a diagnostic or success event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a diagnostic code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const IO_ERROR: Code = Code::new("ERR003");
}

/// Lexical analysis error codes
pub mod lexical {
    use super::Code;

    pub const UNRECOGNIZED_CHARACTER: Code = Code::new("E020");
    pub const UNTERMINATED_LITERAL: Code = Code::new("E021");
    pub const INVALID_NUMBER: Code = Code::new("E022");
    pub const INVALID_BIT_LENGTH: Code = Code::new("E023");
    pub const INVALID_ESCAPE: Code = Code::new("E024");
    pub const INVALID_CHARACTER_LITERAL: Code = Code::new("E025");
    pub const SOURCE_TOO_LARGE: Code = Code::new("E026");
    pub const TOO_MANY_TOKENS: Code = Code::new("E027");
    pub const LITERAL_TOO_LONG: Code = Code::new("E028");
}

/// Syntax analysis error codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const MISSING_DELIMITER: Code = Code::new("E041");
    pub const UNRECOGNIZED_TYPE: Code = Code::new("E042");
    pub const DUPLICATE_DECLARATION: Code = Code::new("E043");
    pub const INVALID_NAME: Code = Code::new("E044");
    pub const UNEXPECTED_END: Code = Code::new("E045");
    pub const NESTING_TOO_DEEP: Code = Code::new("E046");
}

/// Type checking error codes raised during code generation
pub mod types {
    use super::Code;

    pub const OPERATOR_NOT_DEFINED: Code = Code::new("E060");
    pub const INCOMPATIBLE_TYPES: Code = Code::new("E061");
    pub const INVALID_CONDITION: Code = Code::new("E062");
    pub const UNRESOLVED_TYPE: Code = Code::new("E063");
}

/// Code generation error codes
pub mod compile {
    use super::Code;

    pub const UNRESOLVED_VARIABLE: Code = Code::new("E070");
    pub const UNRESOLVED_FUNCTION: Code = Code::new("E071");
    pub const DUPLICATE_VARIABLE: Code = Code::new("E072");
    pub const INVALID_ASSIGNMENT_TARGET: Code = Code::new("E073");
    pub const RETURN_TYPE_MISMATCH: Code = Code::new("E074");
    pub const INVALID_ASYNC_OPERAND: Code = Code::new("E076");
    pub const RESOURCE_LIMIT: Code = Code::new("E077");
    pub const MALFORMED_IR: Code = Code::new("E080");
}

/// Success and informational codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I010");
    pub const PARSE_COMPLETE: Code = Code::new("I020");
    pub const FUNCTION_COMPILED: Code = Code::new("I030");
    pub const COMPILATION_COMPLETE: Code = Code::new("I031");
    pub const PIPELINE_COMPLETE: Code = Code::new("I040");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

const REGISTRY_ENTRIES: &[ErrorMetadata] = &[
    // System errors
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        true,
        "Internal compiler invariant violated",
        "File a bug report with the source that triggered it",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        true,
        "System initialization failure",
        "Check the build profile and logging configuration",
    ),
    ErrorMetadata::new(
        "ERR003",
        "System",
        Severity::High,
        true,
        "Failed to read source or write output",
        "Check that the input is readable and the output stream is open",
    ),
    // Lexical errors
    ErrorMetadata::new(
        "E020",
        "Lexical",
        Severity::High,
        true,
        "Character not allowed in source text",
        "Remove the character or place it inside a string literal",
    ),
    ErrorMetadata::new(
        "E021",
        "Lexical",
        Severity::High,
        true,
        "String or character literal is not terminated",
        "Add the closing quote",
    ),
    ErrorMetadata::new(
        "E022",
        "Lexical",
        Severity::High,
        true,
        "Malformed numeric literal",
        "Check digits after 0x/0b prefixes and float exponents",
    ),
    ErrorMetadata::new(
        "E023",
        "Lexical",
        Severity::High,
        true,
        "Unsupported @bits suffix on a numeric literal",
        "Use 1-1024 bits for integers or a multiple of 8 in 8-256 for floats",
    ),
    ErrorMetadata::new(
        "E024",
        "Lexical",
        Severity::High,
        true,
        "Unrecognized escape sequence",
        "Use one of \\0 \\' \\\" \\\\ \\n \\r \\t",
    ),
    ErrorMetadata::new(
        "E025",
        "Lexical",
        Severity::High,
        true,
        "Character literal must contain exactly one character",
        "Use a string literal for longer text",
    ),
    ErrorMetadata::new(
        "E026",
        "Lexical",
        Severity::High,
        true,
        "Source text exceeds the configured size limit",
        "Split the program or rebuild with a larger max_source_size",
    ),
    ErrorMetadata::new(
        "E027",
        "Lexical",
        Severity::High,
        true,
        "Token count exceeds the configured limit",
        "Split the program or rebuild with a larger max_token_count",
    ),
    ErrorMetadata::new(
        "E028",
        "Lexical",
        Severity::Medium,
        true,
        "Literal or name exceeds the configured length limit",
        "Shorten the literal or name",
    ),
    // Syntax errors
    ErrorMetadata::new(
        "E040",
        "Syntax",
        Severity::High,
        true,
        "Token not valid at this position",
        "Check the statement structure around the reported offset",
    ),
    ErrorMetadata::new(
        "E041",
        "Syntax",
        Severity::High,
        true,
        "Expected delimiter is missing",
        "Add the missing bracket, brace or semicolon",
    ),
    ErrorMetadata::new(
        "E042",
        "Syntax",
        Severity::High,
        true,
        "Type name could not be resolved",
        "Declare the type with typedef before its first use",
    ),
    ErrorMetadata::new(
        "E043",
        "Syntax",
        Severity::Medium,
        true,
        "Duplicate field or parameter name",
        "Rename one of the duplicates",
    ),
    ErrorMetadata::new(
        "E044",
        "Syntax",
        Severity::Medium,
        true,
        "Invalid use of a reserved or qualified name",
        "Reserved names starting with '$' may only name functions",
    ),
    ErrorMetadata::new(
        "E045",
        "Syntax",
        Severity::High,
        true,
        "Source ended in the middle of a construct",
        "Complete the unfinished declaration or statement",
    ),
    ErrorMetadata::new(
        "E046",
        "Syntax",
        Severity::High,
        true,
        "Nesting exceeds the configured depth limit",
        "Flatten deeply nested expressions or blocks",
    ),
    // Type errors
    ErrorMetadata::new(
        "E060",
        "Types",
        Severity::High,
        true,
        "Operator is not defined for the operand types",
        "Convert one operand with a builtin conversion function",
    ),
    ErrorMetadata::new(
        "E061",
        "Types",
        Severity::High,
        true,
        "Value cannot be converted to the required type",
        "Check declared types against the assigned value",
    ),
    ErrorMetadata::new(
        "E062",
        "Types",
        Severity::High,
        true,
        "Condition is not a boolean value",
        "Compare the value explicitly, e.g. `x != 0`",
    ),
    ErrorMetadata::new(
        "E063",
        "Types",
        Severity::High,
        true,
        "Literal type is not registered",
        "Use a bit width the host runtime supports",
    ),
    // Compile errors
    ErrorMetadata::new(
        "E070",
        "Compile",
        Severity::High,
        true,
        "Variable is not declared in any enclosing scope",
        "Declare the variable before using it",
    ),
    ErrorMetadata::new(
        "E071",
        "Compile",
        Severity::High,
        true,
        "No function overload matches the call",
        "Check the function path, imports and argument types",
    ),
    ErrorMetadata::new(
        "E072",
        "Compile",
        Severity::Medium,
        true,
        "Variable name already declared in an enclosing scope",
        "Rename the variable",
    ),
    ErrorMetadata::new(
        "E073",
        "Compile",
        Severity::High,
        true,
        "Assignment target is not a variable or property",
        "Assign to a variable, field, index or property",
    ),
    ErrorMetadata::new(
        "E074",
        "Compile",
        Severity::High,
        true,
        "Returned value does not match the function signature",
        "Adjust the return statements or the declared return type",
    ),
    ErrorMetadata::new(
        "E076",
        "Compile",
        Severity::High,
        true,
        "Queue identifier or wait time has the wrong type",
        "Use an integer queue identifier and a numeric wait time",
    ),
    ErrorMetadata::new(
        "E077",
        "Compile",
        Severity::High,
        true,
        "Generated code exceeds a configured limit",
        "Split the program or rebuild with larger compiler limits",
    ),
    ErrorMetadata::new(
        "E080",
        "Compile",
        Severity::Critical,
        true,
        "Operation IR is malformed",
        "File a bug report; the parser produced an invalid operation sequence",
    ),
];

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, &'static ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, &'static ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        REGISTRY_ENTRIES
            .iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

/// Metadata registered for `code`, if any
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code).copied()
}

impl Code {
    pub fn metadata(&self) -> Option<&'static ErrorMetadata> {
        get_error_metadata(self.0)
    }

    /// `Unknown` for unregistered codes
    pub fn category(&self) -> &'static str {
        self.metadata().map_or("Unknown", |metadata| metadata.category)
    }

    pub fn severity(&self) -> Severity {
        self.metadata().map_or(Severity::Medium, |metadata| metadata.severity)
    }

    pub fn requires_halt(&self) -> bool {
        self.metadata().is_some_and(|metadata| metadata.requires_halt)
    }

    pub fn description(&self) -> Option<&'static str> {
        self.metadata().map(|metadata| metadata.description)
    }

    pub fn recommended_action(&self) -> Option<&'static str> {
        self.metadata().map(|metadata| metadata.recommended_action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_code_is_registered() {
        let codes = [
            system::INTERNAL_ERROR,
            system::IO_ERROR,
            lexical::UNRECOGNIZED_CHARACTER,
            lexical::INVALID_BIT_LENGTH,
            lexical::TOO_MANY_TOKENS,
            syntax::UNEXPECTED_TOKEN,
            syntax::NESTING_TOO_DEEP,
            types::OPERATOR_NOT_DEFINED,
            types::UNRESOLVED_TYPE,
            compile::UNRESOLVED_FUNCTION,
            compile::MALFORMED_IR,
        ];
        for code in codes {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "{} is not registered",
                code
            );
        }
    }

    #[test]
    fn test_registry_codes_are_unique() {
        assert_eq!(get_error_registry().len(), REGISTRY_ENTRIES.len());
    }

    #[test]
    fn test_unknown_code_defaults() {
        let unknown = Code::new("E999");
        assert_eq!(unknown.description(), None);
        assert_eq!(unknown.category(), "Unknown");
        assert_eq!(unknown.severity(), Severity::Medium);
        assert!(!unknown.requires_halt());
    }

    #[test]
    fn test_categories() {
        assert_eq!(lexical::INVALID_NUMBER.category(), "Lexical");
        assert_eq!(compile::UNRESOLVED_FUNCTION.category(), "Compile");
        assert_eq!(compile::MALFORMED_IR.severity(), Severity::Critical);
        assert!(compile::MALFORMED_IR.recommended_action().is_some());
    }
}
