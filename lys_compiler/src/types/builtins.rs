//! Types and functions the host runtime provides to every program

use super::{FunctionSignature, Parameter, Type, TypeTable, TypeTableError};

/// Namespace of the builtin math functions
pub const MATH_NAMESPACE: &[&str] = &["sys", "math"];

/// Namespace of the builtin logging functions
pub const LOG_NAMESPACE: &[&str] = &["sys", "log"];

const UNARY_MATH: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "exp", "log", "sqrt", "ceil", "floor", "abs",
];

const BINARY_MATH: &[&str] = &["min", "max", "pow", "atan2"];

/// Type table holding the primitive types and their aliases
pub fn builtin_types() -> Result<TypeTable, TypeTableError> {
    let mut table = TypeTable::new();

    for bits in 1..=32 {
        table.define(format!("int{}", bits), Type::int(bits))?;
        table.define(format!("uint{}", bits), Type::uint(bits))?;
    }
    for bits in [16, 24, 32] {
        table.define(format!("float{}", bits), Type::float(bits))?;
    }
    for dimension in 2..=16 {
        table.define(format!("vec{}", dimension), Type::Vector(dimension))?;
    }

    table.define("bool", Type::Bool)?;
    table.define("string", Type::String)?;
    table.define("led", Type::Led)?;

    table.alias("bit", "uint1")?;
    table.alias("byte", "uint8")?;
    table.alias("int", "int32")?;
    table.alias("float", "float32")?;

    Ok(table)
}

/// Builtin function catalog in registration order
pub fn builtin_functions() -> Vec<FunctionSignature> {
    let float32 = Type::float(32);
    let mut functions = Vec::new();

    for name in UNARY_MATH {
        functions.push(FunctionSignature::builtin(
            MATH_NAMESPACE,
            name,
            vec![Parameter::new("arg0", float32.clone())],
            Some(float32.clone()),
        ));
    }
    for name in BINARY_MATH {
        functions.push(FunctionSignature::builtin(
            MATH_NAMESPACE,
            name,
            vec![
                Parameter::new("arg0", float32.clone()),
                Parameter::new("arg1", float32.clone()),
            ],
            Some(float32.clone()),
        ));
    }
    functions.push(FunctionSignature::builtin(
        MATH_NAMESPACE,
        "random",
        Vec::new(),
        Some(float32.clone()),
    ));

    // Conversions
    let conversions = [
        ("int", Type::float(32), Type::int(32)),
        ("int", Type::String, Type::int(32)),
        ("float", Type::int(32), Type::float(32)),
        ("float", Type::String, Type::float(32)),
        ("string", Type::float(32), Type::String),
        ("string", Type::Bool, Type::String),
        ("string", Type::GenericVector, Type::String),
    ];
    for (name, from, to) in conversions {
        functions.push(FunctionSignature::builtin(
            &[],
            name,
            vec![Parameter::new("val", from)],
            Some(to),
        ));
    }

    functions.push(FunctionSignature::builtin(
        &[],
        "rgb",
        vec![
            Parameter::new("obj", Type::Led),
            Parameter::new("r", float32.clone()),
            Parameter::new("g", float32.clone()),
            Parameter::new("b", float32),
        ],
        None,
    ));

    for name in ["info", "error"] {
        functions.push(FunctionSignature::builtin(
            LOG_NAMESPACE,
            name,
            vec![Parameter::new("msg", Type::String)],
            None,
        ));
    }

    // Lowered to the led accessor hook rather than a builtin call
    functions.push(FunctionSignature::builtin(
        &[],
        "$",
        vec![Parameter::new("id", Type::int(32))],
        Some(Type::Led),
    ));

    functions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types() {
        let table = builtin_types().unwrap();
        assert_eq!(table.get("uint1"), Some(&Type::uint(1)));
        assert_eq!(table.get("int32"), Some(&Type::int(32)));
        assert_eq!(table.get("float24"), Some(&Type::float(24)));
        assert_eq!(table.get("float8"), None);
        assert_eq!(table.get("vec16"), Some(&Type::Vector(16)));
        assert_eq!(table.get("vec1"), None);
        assert_eq!(table.get("byte"), Some(&Type::uint(8)));
        assert_eq!(table.get("int"), Some(&Type::int(32)));
        assert_eq!(table.get("led"), Some(&Type::Led));
        // 64 integers, 3 floats, 15 vectors, 3 others, 4 aliases
        assert_eq!(table.len(), 89);
    }

    #[test]
    fn test_builtin_functions() {
        let functions = builtin_functions();
        assert!(functions.iter().all(|f| f.is_builtin));

        let sqrt = functions.iter().find(|f| f.name == "sqrt").unwrap();
        assert_eq!(sqrt.namespace, vec!["sys", "math"]);
        assert_eq!(sqrt.parameters.len(), 1);

        let strings = functions.iter().filter(|f| f.name == "string").count();
        assert_eq!(strings, 3);

        let led = functions.iter().find(|f| f.name == "$").unwrap();
        assert!(led.namespace.is_empty());
        assert_eq!(led.return_type, Some(Type::Led));
    }
}
