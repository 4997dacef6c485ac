//! Type system: type variants with their operator rules, the type table,
//! function signatures and the builtin catalog.

pub mod builtins;
pub mod signature;
pub mod table;
pub mod ty;

pub use builtins::{builtin_functions, builtin_types};
pub use signature::{FunctionSignature, Parameter};
pub use table::{qualify, TypeTable, TypeTableError, PATH_SEPARATOR};
pub use ty::{BinaryOperator, StructType, Type, TypeResult, UnaryOperator, Unsupported};
