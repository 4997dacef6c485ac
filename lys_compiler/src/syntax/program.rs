//! Parsed program structure handed to the code generator

use crate::ir::OperationCollection;
use crate::types::{FunctionSignature, Type, TypeTable};

/// A user function with its lowered body
#[derive(Debug, Clone)]
pub struct UserFunction {
    pub signature: FunctionSignature,
    /// Offset of the return type token
    pub position: usize,
    pub body: OperationCollection,
}

/// Contents of one `namespace path { ... }` block, or of the document root
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub path: Vec<String>,
    pub functions: Vec<UserFunction>,
    /// Types declared by `typedef` directly inside this block
    pub type_definitions: Vec<(String, Type)>,
}

impl Namespace {
    pub fn new(path: Vec<String>) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.type_definitions.is_empty()
    }
}

/// Result of reading a whole document
#[derive(Debug, Clone)]
pub struct Program {
    /// Namespace blocks in the order they were opened; the root block comes first
    pub namespaces: Vec<Namespace>,
    /// Builtin types plus every `typedef` of the document
    pub types: TypeTable,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &UserFunction> {
        self.namespaces.iter().flat_map(|ns| ns.functions.iter())
    }

    pub fn function_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.functions.len()).sum()
    }
}
