//! Errors raised while generating code from the operation stream

use crate::logging::{codes, Code};

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// The program is well-formed but does not type check or resolve
    #[error("{message}")]
    Semantic {
        message: String,
        offset: usize,
        code: Code,
    },

    /// The operation stream violates a structural invariant of the IR
    #[error("Internal error: {message}")]
    Internal { message: String, offset: usize },
}

impl CompileError {
    pub fn new(code: Code, message: impl Into<String>, offset: usize) -> Self {
        Self::Semantic {
            message: message.into(),
            offset,
            code,
        }
    }

    pub fn internal(message: impl Into<String>, offset: usize) -> Self {
        Self::Internal {
            message: message.into(),
            offset,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Self::Semantic { offset, .. } | Self::Internal { offset, .. } => *offset,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Semantic { code, .. } => *code,
            Self::Internal { .. } => codes::compile::MALFORMED_IR,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_error_keeps_code() {
        let error = CompileError::new(
            codes::compile::UNRESOLVED_VARIABLE,
            "Cannot resolve variable: x",
            14,
        );
        assert_eq!(error.to_string(), "Cannot resolve variable: x");
        assert_eq!(error.position(), 14);
        assert_eq!(error.error_code(), codes::compile::UNRESOLVED_VARIABLE);
        assert!(!error.is_internal());
    }

    #[test]
    fn test_internal_error_is_malformed_ir() {
        let error = CompileError::internal("Unexpected operation block", 3);
        assert!(error.is_internal());
        assert_eq!(error.error_code(), codes::compile::MALFORMED_IR);
        assert_eq!(error.to_string(), "Internal error: Unexpected operation block");
    }
}
