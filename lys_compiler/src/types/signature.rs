use super::Type;

/// A named, typed function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Callable signature of a user or builtin function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// Name as invoked in source code
    pub name: String,
    pub is_builtin: bool,
    /// Distinguishes same-named functions within one namespace
    pub index: usize,
    pub parameters: Vec<Parameter>,
    /// `None` for `void`
    pub return_type: Option<Type>,
    pub namespace: Vec<String>,
}

impl FunctionSignature {
    /// Builtin signature; the index is assigned on registration
    pub fn builtin(
        namespace: &[&str],
        name: &str,
        parameters: Vec<Parameter>,
        return_type: Option<Type>,
    ) -> Self {
        Self {
            name: name.to_string(),
            is_builtin: true,
            index: 0,
            parameters,
            return_type,
            namespace: namespace.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Key of the function inside its namespace object, e.g. `main#0`
    pub fn key(&self) -> String {
        format!("{}#{}", self.name, self.index)
    }

    /// Whether arguments of the given types can be passed to this function
    pub fn accepts(&self, arguments: &[Type]) -> bool {
        self.parameters.len() == arguments.len()
            && self
                .parameters
                .iter()
                .zip(arguments)
                .all(|(param, arg)| arg.can_cast_to(&param.ty))
    }

    /// Human-readable header, e.g. `int8 t::main(int8 x)`
    pub fn describe(&self) -> String {
        let ret = self
            .return_type
            .as_ref()
            .map(Type::identifier)
            .unwrap_or_else(|| "void".to_string());
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut path = self.namespace.clone();
        path.push(self.name.clone());
        format!("{} {}({})", ret, path.join("::"), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_castable_arguments() {
        let sig = FunctionSignature::builtin(
            &["sys", "math"],
            "pow",
            vec![
                Parameter::new("arg0", Type::float(32)),
                Parameter::new("arg1", Type::float(32)),
            ],
            Some(Type::float(32)),
        );
        assert!(sig.accepts(&[Type::int(8), Type::float(16)]));
        assert!(!sig.accepts(&[Type::int(8)]));
        assert!(!sig.accepts(&[Type::String, Type::float(32)]));
    }

    #[test]
    fn test_key_and_description() {
        let mut sig = FunctionSignature::builtin(
            &["sys", "log"],
            "info",
            vec![Parameter::new("msg", Type::String)],
            None,
        );
        sig.index = 2;
        assert_eq!(sig.key(), "info#2");
        assert_eq!(sig.describe(), "void sys::log::info(string msg)");
    }
}
