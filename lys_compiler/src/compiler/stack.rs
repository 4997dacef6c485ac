//! Value stack entries of the code generator

use super::error::{CompileError, CompileResult};
use crate::logging::codes;
use crate::types::Type;

/// Generated expression together with its static type
#[derive(Debug, Clone, PartialEq)]
pub struct StackElement {
    /// `None` for values without code of their own, e.g. a function reference
    pub code: Option<String>,
    /// `None` for the result of a void call
    pub ty: Option<Type>,
    /// Plain storage location: `x`, `s.field` or `a[i]`
    pub is_variable: bool,
    /// Getter/setter pair on a host object: `obj.prop_r`
    pub is_property: bool,
}

impl StackElement {
    pub fn value(code: impl Into<String>, ty: Type) -> Self {
        Self {
            code: Some(code.into()),
            ty: Some(ty),
            is_variable: false,
            is_property: false,
        }
    }

    pub fn variable(code: impl Into<String>, ty: Type) -> Self {
        Self {
            is_variable: true,
            ..Self::value(code, ty)
        }
    }

    pub fn property(code: impl Into<String>, ty: Type) -> Self {
        Self {
            is_property: true,
            ..Self::value(code, ty)
        }
    }

    pub fn function(path: Vec<String>) -> Self {
        Self {
            code: None,
            ty: Some(Type::Function(path)),
            is_variable: false,
            is_property: false,
        }
    }

    /// Result of a call; `None` for void functions
    pub fn call(code: String, ty: Option<Type>) -> Self {
        Self {
            code: Some(code),
            ty,
            is_variable: false,
            is_property: false,
        }
    }

    /// Code that names the storage location, unmasked
    pub fn raw(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    /// Code that reads the value: properties go through their getter and
    /// integers are wrapped to their declared width.
    pub fn read(&self) -> String {
        let code = if self.is_property {
            format!("{}()", self.raw())
        } else {
            self.raw().to_string()
        };
        match &self.ty {
            Some(Type::Int { bits, unsigned }) => mask(&code, *bits, *unsigned),
            _ => code,
        }
    }

    /// Code for an expression statement; the value is discarded, so it is
    /// not masked
    pub fn discarded(&self) -> String {
        if self.is_property {
            format!("{}()", self.raw())
        } else {
            self.raw().to_string()
        }
    }

    /// Type of a value used as an operand
    pub fn operand_type(&self, offset: usize) -> CompileResult<&Type> {
        self.ty.as_ref().ok_or_else(|| {
            CompileError::new(
                codes::types::INCOMPATIBLE_TYPES,
                "Function call does not return a value",
                offset,
            )
        })
    }
}

/// Wrap `code` so that it evaluates to an integer of the given width
pub fn mask(code: &str, bits: u32, unsigned: bool) -> String {
    match (unsigned, bits) {
        (true, 32) => format!("({}>>>0)", code),
        (true, _) => format!("({}&{})", code, (1u64 << bits) - 1),
        (false, 32) => format!("({}|0)", code),
        (false, _) => format!("({}<<{}>>{})", code, 32 - bits, 32 - bits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_mask_per_width() {
        assert_eq!(mask("x", 8, true), "(x&255)");
        assert_eq!(mask("x", 1, true), "(x&1)");
        assert_eq!(mask("x", 32, true), "(x>>>0)");
        assert_eq!(mask("x", 8, false), "(x<<24>>24)");
        assert_eq!(mask("x", 32, false), "(x|0)");
    }

    #[test]
    fn test_reads_are_masked_by_declared_type() {
        let cases = [
            (Type::uint(8), "(v&255)"),
            (Type::uint(32), "(v>>>0)"),
            (Type::int(8), "(v<<24>>24)"),
            (Type::int(32), "(v|0)"),
            (Type::uint(16), "(v&65535)"),
            (Type::int(1), "(v<<31>>31)"),
        ];
        for (ty, expected) in cases {
            assert_eq!(StackElement::variable("v", ty.clone()).read(), expected);
            assert_eq!(StackElement::value("v", ty).read(), expected);
        }
        assert_eq!(StackElement::variable("v", Type::float(32)).read(), "v");
    }

    #[test]
    fn test_property_read_goes_through_getter() {
        let element = StackElement::property("obj.prop_r", Type::float(32));
        assert_eq!(element.read(), "obj.prop_r()");
        assert_eq!(element.raw(), "obj.prop_r");
    }

    #[test]
    fn test_variable_read_is_masked() {
        let element = StackElement::variable("x", Type::int(8));
        assert_eq!(element.read(), "(x<<24>>24)");
        assert_eq!(element.raw(), "x");
    }

    #[test]
    fn test_discarded_value_is_not_masked() {
        let element = StackElement::value("(x=(2|0))", Type::int(8));
        assert_eq!(element.discarded(), "(x=(2|0))");
    }

    #[test]
    fn test_void_result_is_not_an_operand() {
        let element = StackElement::call("f()".to_string(), None);
        assert_matches!(
            element.operand_type(7),
            Err(CompileError::Semantic { offset: 7, .. })
        );
        assert_eq!(element.read(), "f()");
    }
}
