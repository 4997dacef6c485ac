//! Intermediate representation produced by the parser and consumed by the code generator

pub mod collection;
pub mod operation;

pub use collection::{Cursor, OperationCollection};
pub use operation::{Constant, Operation, OperationKind};

/// One operation per line, as printed by `lysc --ir`
pub fn format_operations(operations: &OperationCollection) -> String {
    let mut output = String::new();
    for operation in operations.iter() {
        output.push_str(&operation.to_string());
        output.push('\n');
    }
    output
}
