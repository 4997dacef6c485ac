//! Static types of the Lys language
//!
//! Every operator is resolved per operand type. A combination without an
//! explicit rule is [`Unsupported`]; nothing is coerced silently. The one
//! catch-all is `+`: whenever either side is a `string` and no narrower rule
//! applies, the result is a `string`.

use std::fmt;
use std::sync::Arc;

/// A user-defined record type (`typedef name = { field: type, ... };`)
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<(String, Type)>,
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Bool,
    String,
    Int { bits: u32, unsigned: bool },
    Float { bits: u32 },
    Array(Box<Type>),
    Vector(u32),
    /// Matches any vector; only used as a parameter type
    GenericVector,
    Struct(Arc<StructType>),
    /// A function path that has not been resolved to a signature yet
    Function(Vec<String>),
    /// Host-controlled output element with `r`, `g` and `b` properties
    Led,
}

/// Operator has no rule for the given operand types
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation not supported")]
pub struct Unsupported;

pub type TypeResult = Result<Type, Unsupported>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    LogicalAnd,
    LogicalOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    MoreThan,
    MoreThanEqual,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::BitwiseAnd => "&",
            Self::BitwiseOr => "|",
            Self::BitwiseXor => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::MoreThan => ">",
            Self::MoreThanEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    LogicalNot,
    BitwiseNot,
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::LogicalNot => "!",
            Self::BitwiseNot => "~",
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

impl Type {
    pub fn int(bits: u32) -> Self {
        Type::Int {
            bits,
            unsigned: false,
        }
    }

    pub fn uint(bits: u32) -> Self {
        Type::Int {
            bits,
            unsigned: true,
        }
    }

    pub fn float(bits: u32) -> Self {
        Type::Float { bits }
    }

    pub fn array_of(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. })
    }

    pub fn is_numeric(&self) -> bool {
        self.is_int() || self.is_float()
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    /// Name of the type as written in source and in diagnostics
    pub fn identifier(&self) -> String {
        match self {
            Type::Bool => "bool".to_string(),
            Type::String => "string".to_string(),
            Type::Int { bits, unsigned } => {
                format!("{}int{}", if *unsigned { "u" } else { "" }, bits)
            }
            Type::Float { bits } => format!("float{}", bits),
            Type::Array(element) => format!("{}[]", element.identifier()),
            Type::Vector(dimension) => format!("vec{}", dimension),
            Type::GenericVector => "vec?".to_string(),
            Type::Struct(def) => def.name.clone(),
            Type::Function(_) => "[function]".to_string(),
            Type::Led => "led".to_string(),
        }
    }

    /// Whether a value of this type may be stored where `target` is expected
    pub fn can_cast_to(&self, target: &Type) -> bool {
        match (self, target) {
            (Type::Function(_), _) => false,
            (Type::Int { .. }, Type::Int { .. } | Type::Float { .. }) => true,
            (Type::Float { .. }, Type::Float { .. }) => true,
            (Type::Vector(_), Type::Vector(_) | Type::GenericVector) => true,
            (Type::Array(element), Type::Array(target_element)) => {
                element.can_cast_to(target_element)
            }
            (Type::Struct(a), Type::Struct(b)) => a.name == b.name,
            (Type::Bool, Type::Bool)
            | (Type::String, Type::String)
            | (Type::GenericVector, Type::GenericVector)
            | (Type::Led, Type::Led) => true,
            _ => false,
        }
    }

    pub fn binary(&self, op: BinaryOperator, other: &Type) -> TypeResult {
        use BinaryOperator as Op;
        let specific = match op {
            Op::Plus | Op::Minus => self.additive(other),
            Op::Times => self.multiplicative(other),
            Op::Divide => self.divide(other),
            Op::Modulo => match (self, other) {
                (Type::Int { .. }, Type::Int { .. }) => Ok(self.clone()),
                (Type::Float { .. }, Type::Int { .. } | Type::Float { .. }) => Ok(self.clone()),
                _ => Err(Unsupported),
            },
            Op::LogicalAnd | Op::LogicalOr => match (self, other) {
                (Type::Bool, Type::Bool) => Ok(Type::Bool),
                _ => Err(Unsupported),
            },
            Op::BitwiseAnd | Op::BitwiseOr | Op::BitwiseXor => match (self, other) {
                (Type::Int { bits, .. }, Type::Int { bits: other_bits, .. })
                    if other_bits <= bits =>
                {
                    Ok(self.clone())
                }
                _ => Err(Unsupported),
            },
            Op::LeftShift | Op::RightShift => match (self, other) {
                (Type::Int { .. }, Type::Int { .. }) => Ok(self.clone()),
                _ => Err(Unsupported),
            },
            Op::Equal | Op::NotEqual => self.equality(other),
            Op::LessThan | Op::LessThanEqual | Op::MoreThan | Op::MoreThanEqual => {
                if self.is_numeric() && other.is_numeric() {
                    Ok(Type::Bool)
                } else {
                    Err(Unsupported)
                }
            }
        };

        match specific {
            Err(Unsupported)
                if op == Op::Plus && (*self == Type::String || *other == Type::String) =>
            {
                Ok(Type::String)
            }
            result => result,
        }
    }

    pub fn unary(&self, op: UnaryOperator) -> TypeResult {
        match (op, self) {
            (UnaryOperator::LogicalNot, Type::Bool) => Ok(Type::Bool),
            (UnaryOperator::BitwiseNot, Type::Int { .. }) => Ok(self.clone()),
            (
                UnaryOperator::Plus | UnaryOperator::Minus,
                Type::Int { .. } | Type::Float { .. } | Type::Vector(_),
            ) => Ok(self.clone()),
            _ => Err(Unsupported),
        }
    }

    /// Result of `self[index]`
    pub fn index(&self, index: &Type) -> TypeResult {
        match (self, index) {
            (Type::String, Type::Int { .. }) => Ok(Type::uint(32)),
            (Type::Vector(_), _) => Ok(Type::float(32)),
            (Type::Array(element), Type::Int { .. }) => Ok((**element).clone()),
            _ => Err(Unsupported),
        }
    }

    /// Result of `self.name`
    pub fn property(&self, name: &str) -> TypeResult {
        match self {
            Type::Struct(def) => def.field(name).cloned().ok_or(Unsupported),
            Type::Led if matches!(name, "r" | "g" | "b") => Ok(Type::float(32)),
            _ => Err(Unsupported),
        }
    }

    fn additive(&self, other: &Type) -> TypeResult {
        match (self, other) {
            (Type::Int { .. }, Type::Int { .. }) => Ok(self.clone()),
            (Type::Int { .. }, Type::Float { .. }) => Ok(other.clone()),
            (Type::Float { .. }, Type::Int { .. }) => Ok(self.clone()),
            (Type::Float { .. }, Type::Float { .. }) => Ok(self.wider_float(other)),
            (Type::Vector(a), Type::Vector(b)) if a == b => Ok(self.clone()),
            _ => Err(Unsupported),
        }
    }

    fn multiplicative(&self, other: &Type) -> TypeResult {
        match (self, other) {
            (Type::Int { .. }, Type::Int { .. }) => Ok(self.clone()),
            (Type::Int { .. }, Type::Float { .. } | Type::Vector(_)) => Ok(other.clone()),
            (Type::Float { .. }, Type::Int { .. }) => Ok(self.clone()),
            (Type::Float { .. }, Type::Float { .. }) => Ok(self.wider_float(other)),
            (Type::Float { .. }, Type::Vector(_)) => Ok(other.clone()),
            (Type::Vector(_), Type::Int { .. } | Type::Float { .. }) => Ok(self.clone()),
            // Dot product
            (Type::Vector(a), Type::Vector(b)) if a == b => Ok(Type::float(32)),
            _ => Err(Unsupported),
        }
    }

    fn divide(&self, other: &Type) -> TypeResult {
        match (self, other) {
            (Type::Int { .. }, Type::Int { .. }) => Ok(self.clone()),
            (Type::Int { .. }, Type::Float { .. }) => Ok(other.clone()),
            (Type::Float { .. }, Type::Int { .. }) => Ok(self.clone()),
            (Type::Float { .. }, Type::Float { .. }) => Ok(self.wider_float(other)),
            (Type::Vector(_), Type::Int { .. } | Type::Float { .. }) => Ok(self.clone()),
            _ => Err(Unsupported),
        }
    }

    fn equality(&self, other: &Type) -> TypeResult {
        match (self, other) {
            (a, b) if a.is_numeric() && b.is_numeric() => Ok(Type::Bool),
            (Type::Bool, Type::Bool) | (Type::String, Type::String) => Ok(Type::Bool),
            (Type::Vector(a), Type::Vector(b)) if a == b => Ok(Type::Bool),
            _ => Err(Unsupported),
        }
    }

    /// The left float unless the right one is strictly wider
    fn wider_float(&self, other: &Type) -> Type {
        match (self, other) {
            (Type::Float { bits }, Type::Float { bits: other_bits }) if bits < other_bits => {
                other.clone()
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BinaryOperator as Op;

    fn point() -> Type {
        Type::Struct(Arc::new(StructType {
            name: "point".to_string(),
            fields: vec![("x".to_string(), Type::int(32)), ("y".to_string(), Type::int(32))],
        }))
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(Type::uint(8).identifier(), "uint8");
        assert_eq!(Type::array_of(Type::float(32)).identifier(), "float32[]");
        assert_eq!(Type::GenericVector.identifier(), "vec?");
        assert_eq!(Type::Function(vec!["f".into()]).identifier(), "[function]");
        assert_eq!(point().identifier(), "point");
    }

    #[test]
    fn test_integer_arithmetic_keeps_left_width() {
        let result = Type::int(8).binary(Op::Plus, &Type::int(32)).unwrap();
        assert_eq!(result, Type::int(8));
        let result = Type::uint(16).binary(Op::LeftShift, &Type::int(32)).unwrap();
        assert_eq!(result, Type::uint(16));
    }

    #[test]
    fn test_float_promotion_widens() {
        assert_eq!(
            Type::int(8).binary(Op::Times, &Type::float(16)).unwrap(),
            Type::float(16)
        );
        assert_eq!(
            Type::float(16).binary(Op::Plus, &Type::float(32)).unwrap(),
            Type::float(32)
        );
        assert_eq!(
            Type::float(32).binary(Op::Minus, &Type::int(8)).unwrap(),
            Type::float(32)
        );
    }

    #[test]
    fn test_string_plus_accepts_anything() {
        assert_eq!(
            Type::int(32).binary(Op::Plus, &Type::String).unwrap(),
            Type::String
        );
        assert_eq!(
            Type::String.binary(Op::Plus, &Type::Bool).unwrap(),
            Type::String
        );
        assert_eq!(Type::String.binary(Op::Minus, &Type::String), Err(Unsupported));
        assert_eq!(Type::Bool.binary(Op::Plus, &Type::Bool), Err(Unsupported));
    }

    #[test]
    fn test_bitwise_requires_narrower_right_operand() {
        assert!(Type::int(32).binary(Op::BitwiseAnd, &Type::uint(8)).is_ok());
        assert_eq!(
            Type::uint(8).binary(Op::BitwiseOr, &Type::int(32)),
            Err(Unsupported)
        );
        assert_eq!(Type::float(32).binary(Op::BitwiseXor, &Type::float(32)), Err(Unsupported));
    }

    #[test]
    fn test_vector_rules() {
        let v3 = Type::Vector(3);
        assert_eq!(v3.binary(Op::Plus, &Type::Vector(3)).unwrap(), v3);
        assert_eq!(v3.binary(Op::Plus, &Type::Vector(2)), Err(Unsupported));
        assert_eq!(v3.binary(Op::Times, &Type::Vector(3)).unwrap(), Type::float(32));
        assert_eq!(Type::int(32).binary(Op::Times, &v3).unwrap(), v3);
        assert_eq!(v3.binary(Op::Divide, &Type::float(32)).unwrap(), v3);
        assert_eq!(v3.binary(Op::Equal, &Type::Vector(3)).unwrap(), Type::Bool);
        assert_eq!(v3.unary(UnaryOperator::Minus).unwrap(), v3);
        assert_eq!(v3.index(&Type::int(32)).unwrap(), Type::float(32));
    }

    #[test]
    fn test_modulo_rules() {
        assert!(Type::int(32).binary(Op::Modulo, &Type::int(8)).is_ok());
        assert!(Type::float(32).binary(Op::Modulo, &Type::int(8)).is_ok());
        assert_eq!(Type::int(32).binary(Op::Modulo, &Type::float(32)), Err(Unsupported));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            Type::int(8).binary(Op::LessThan, &Type::float(32)).unwrap(),
            Type::Bool
        );
        assert_eq!(Type::String.binary(Op::Equal, &Type::String).unwrap(), Type::Bool);
        assert_eq!(Type::String.binary(Op::LessThan, &Type::String), Err(Unsupported));
        assert_eq!(Type::Bool.binary(Op::LogicalAnd, &Type::Bool).unwrap(), Type::Bool);
        assert_eq!(Type::Bool.unary(UnaryOperator::LogicalNot).unwrap(), Type::Bool);
        assert_eq!(Type::int(8).unary(UnaryOperator::LogicalNot), Err(Unsupported));
    }

    #[test]
    fn test_index_and_property() {
        assert_eq!(Type::String.index(&Type::int(32)).unwrap(), Type::uint(32));
        assert_eq!(
            Type::array_of(Type::Bool).index(&Type::uint(8)).unwrap(),
            Type::Bool
        );
        assert_eq!(Type::array_of(Type::Bool).index(&Type::String), Err(Unsupported));
        assert_eq!(point().property("y").unwrap(), Type::int(32));
        assert_eq!(point().property("z"), Err(Unsupported));
        assert_eq!(Type::Led.property("g").unwrap(), Type::float(32));
        assert_eq!(Type::Led.property("a"), Err(Unsupported));
    }

    #[test]
    fn test_casts() {
        assert!(Type::uint(8).can_cast_to(&Type::int(32)));
        assert!(Type::int(8).can_cast_to(&Type::float(16)));
        assert!(!Type::float(32).can_cast_to(&Type::int(32)));
        assert!(Type::Vector(4).can_cast_to(&Type::GenericVector));
        assert!(!Type::GenericVector.can_cast_to(&Type::Vector(4)));
        assert!(Type::array_of(Type::int(8)).can_cast_to(&Type::array_of(Type::float(32))));
        assert!(point().can_cast_to(&point()));
        assert!(!Type::Function(vec![]).can_cast_to(&Type::Function(vec![])));
        assert!(!Type::Bool.can_cast_to(&Type::String));
    }
}
