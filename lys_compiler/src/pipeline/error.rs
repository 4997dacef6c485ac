use crate::compiler::CompileError;
use crate::config::constants::exit_codes;
use crate::logging::{codes, Code};
use crate::syntax::SyntaxError;

/// Failure of one compilation unit
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Syntax error at {}\n{0}", .0.position())]
    Syntax(#[from] SyntaxError),

    #[error("Compile error at {}\n{0}", .0.position())]
    Compile(#[from] CompileError),

    #[error("Failed to read {unit}: {source}")]
    Io {
        unit: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(unit: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            unit: unit.into(),
            source,
        }
    }

    /// Process status reported by `lysc`
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Syntax(SyntaxError::Internal(_)) => exit_codes::INTERNAL_FAILURE,
            Self::Syntax(_) => exit_codes::SYNTAX_ERROR,
            Self::Compile(error) if error.is_internal() => exit_codes::INTERNAL_FAILURE,
            Self::Compile(_) => exit_codes::COMPILE_ERROR,
            Self::Io { .. } => exit_codes::INTERNAL_FAILURE,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Syntax(error) => error.error_code(),
            Self::Compile(error) => error.error_code(),
            Self::Io { .. } => codes::system::IO_ERROR,
        }
    }

    /// Source offset of the diagnostic; `None` for I/O failures
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Syntax(error) => Some(error.position()),
            Self::Compile(error) => Some(error.position()),
            Self::Io { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_and_exit_codes() {
        let syntax: PipelineError = SyntaxError::expected("Expected ';'", 12).into();
        assert_eq!(syntax.to_string(), "Syntax error at 12\nExpected ';'");
        assert_eq!(syntax.exit_code(), 0x101);

        let compile: PipelineError =
            CompileError::new(codes::types::INCOMPATIBLE_TYPES, "Cannot convert string to bool", 30)
                .into();
        assert_eq!(compile.to_string(), "Compile error at 30\nCannot convert string to bool");
        assert_eq!(compile.exit_code(), 0x102);
        assert_eq!(compile.position(), Some(30));
    }

    #[test]
    fn test_internal_failures_exit_with_one() {
        let internal: PipelineError = CompileError::internal("Unexpected operation block", 0).into();
        assert_eq!(internal.exit_code(), 1);

        let io = PipelineError::io(
            "missing.lys",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(io.exit_code(), 1);
        assert_eq!(io.error_code(), codes::system::IO_ERROR);
        assert_eq!(io.position(), None);
    }
}
