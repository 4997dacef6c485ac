//! Shared source-location primitives used by the lexer, parser and code generator.

pub mod span;

pub use span::{SourceMap, Span};
