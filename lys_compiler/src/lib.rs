//! Compiler for the Lys scripting language
//!
//! A unit of source text is tokenized, lowered into a flat operation
//! sequence per function and translated into a JavaScript object literal
//! whose members are the functions of the program.

pub mod compiler;
pub mod config;
pub mod ir;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod syntax;
pub mod tokens;
pub mod types;
pub mod utils;

// Re-export key types for library consumers
pub use compiler::{CompileError, CompileResult};
pub use pipeline::{compile_file, compile_reader, compile_source, PipelineError, PipelineResult};
pub use syntax::{Program, SyntaxError};
