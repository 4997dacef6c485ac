//! Operations of the intermediate representation
//!
//! A function body is lowered to a flat sequence of stack-machine operations.
//! Operands are pushed first and consumed by the operation that follows them;
//! blocks are delimited by `BeginScope`/`EndScope` and `BeginOpBlock`/`EndOpBlock`.

use crate::tokens::{RawFloat, RawInt};
use crate::types::{BinaryOperator, Type, UnaryOperator};
use std::fmt;

/// Literal value carried by [`OperationKind::LoadConstant`]
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(RawInt),
    Float(RawFloat),
    String(String),
    Bool(bool),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{}", value),
            Constant::String(text) => write!(f, "{:?}", text),
            Constant::Bool(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// Placeholder for an absent `else` branch
    NoOperation,
    Pop,
    Swap,
    BeginOpBlock,
    EndOpBlock,

    Binary(BinaryOperator),
    Unary(UnaryOperator),
    /// `=` when the operator is `None`, compound assignment otherwise
    Assign(Option<BinaryOperator>),
    Increment { prefix: bool },
    Decrement { prefix: bool },
    PropertyAccess(String),
    Index,
    /// Number of arguments on the stack above the function
    Call(usize),

    BeginScope,
    EndScope,
    If,
    For,
    While,
    DoWhile,

    LoadSymbol(String),
    LoadConstant(Constant),
    LoadUndefined,
    LoadFunction(Vec<String>),
    MakeList(usize),
    MakeVector(usize),

    CreateVariable { ty: Type, name: String },
    Return,
    ReturnValue,
    Import(Vec<String>),
    Async,
    AsyncWait,
    SyncAbort,
    SyncEnd,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::NoOperation => "NoOperation",
            OperationKind::Pop => "Pop",
            OperationKind::Swap => "Swap",
            OperationKind::BeginOpBlock => "BeginOpBlock",
            OperationKind::EndOpBlock => "EndOpBlock",
            OperationKind::Binary(_) => "Binary",
            OperationKind::Unary(_) => "Unary",
            OperationKind::Assign(_) => "Assign",
            OperationKind::Increment { .. } => "Increment",
            OperationKind::Decrement { .. } => "Decrement",
            OperationKind::PropertyAccess(_) => "PropertyAccess",
            OperationKind::Index => "Index",
            OperationKind::Call(_) => "Call",
            OperationKind::BeginScope => "BeginScope",
            OperationKind::EndScope => "EndScope",
            OperationKind::If => "If",
            OperationKind::For => "For",
            OperationKind::While => "While",
            OperationKind::DoWhile => "DoWhile",
            OperationKind::LoadSymbol(_) => "LoadSymbol",
            OperationKind::LoadConstant(_) => "LoadConstant",
            OperationKind::LoadUndefined => "LoadUndefined",
            OperationKind::LoadFunction(_) => "LoadFunction",
            OperationKind::MakeList(_) => "MakeList",
            OperationKind::MakeVector(_) => "MakeVector",
            OperationKind::CreateVariable { .. } => "CreateVariable",
            OperationKind::Return => "Return",
            OperationKind::ReturnValue => "ReturnValue",
            OperationKind::Import(_) => "Import",
            OperationKind::Async => "Async",
            OperationKind::AsyncWait => "AsyncWait",
            OperationKind::SyncAbort => "SyncAbort",
            OperationKind::SyncEnd => "SyncEnd",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            OperationKind::Binary(op) => write!(f, " {}", op.symbol()),
            OperationKind::Unary(op) => write!(f, " {}", op.symbol()),
            OperationKind::Assign(Some(op)) => write!(f, " {}=", op.symbol()),
            OperationKind::Assign(None) => write!(f, " ="),
            OperationKind::Increment { prefix } | OperationKind::Decrement { prefix } => {
                write!(f, " {}", if *prefix { "prefix" } else { "suffix" })
            }
            OperationKind::PropertyAccess(name) | OperationKind::LoadSymbol(name) => {
                write!(f, " {}", name)
            }
            OperationKind::Call(count)
            | OperationKind::MakeList(count)
            | OperationKind::MakeVector(count) => write!(f, " {}", count),
            OperationKind::LoadConstant(constant) => write!(f, " {}", constant),
            OperationKind::LoadFunction(path) | OperationKind::Import(path) => {
                write!(f, " {}", path.join("::"))
            }
            OperationKind::CreateVariable { ty, name } => write!(f, " {} {}", ty, name),
            _ => Ok(()),
        }
    }
}

/// One IR instruction and the source offset it was lowered from
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub position: usize,
}

impl Operation {
    pub fn new(kind: OperationKind, position: usize) -> Self {
        Self { kind, position }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  {}", self.position, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        let op = Operation::new(OperationKind::Assign(Some(BinaryOperator::LeftShift)), 7);
        assert_eq!(op.to_string(), "     7  Assign <<=");

        let op = Operation::new(
            OperationKind::CreateVariable {
                ty: Type::int(8),
                name: "x".to_string(),
            },
            0,
        );
        assert_eq!(op.kind.to_string(), "CreateVariable int8 x");

        let op = OperationKind::LoadConstant(Constant::String("a\"b".to_string()));
        assert_eq!(op.to_string(), "LoadConstant \"a\\\"b\"");
    }
}
