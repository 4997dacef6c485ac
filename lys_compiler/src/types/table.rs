//! Namespace-qualified type registry

use super::Type;
use std::collections::HashMap;

/// Path separator between namespace segments
pub const PATH_SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeTableError {
    #[error("Type '{0}' is already defined")]
    AlreadyDefined(String),

    #[error("Type '{0}' is not defined")]
    NotDefined(String),
}

/// Maps a full type path (`ns::sub::name`) to its type. A path is defined once.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: HashMap<String, Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, path: &str) -> bool {
        self.types.contains_key(path)
    }

    pub fn lookup(&self, path: &str) -> Result<&Type, TypeTableError> {
        self.types
            .get(path)
            .ok_or_else(|| TypeTableError::NotDefined(path.to_string()))
    }

    pub fn get(&self, path: &str) -> Option<&Type> {
        self.types.get(path)
    }

    pub fn define(&mut self, path: impl Into<String>, ty: Type) -> Result<(), TypeTableError> {
        let path = path.into();
        if self.types.contains_key(&path) {
            return Err(TypeTableError::AlreadyDefined(path));
        }
        self.types.insert(path, ty);
        Ok(())
    }

    /// Register `alias` as a second name for an existing path
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<(), TypeTableError> {
        let ty = self.lookup(target)?.clone();
        self.define(alias, ty)
    }

    /// Resolve `name` as seen from inside `namespace`: the innermost
    /// enclosing namespace is tried first, then each parent up to the root.
    pub fn resolve_in(&self, name: &str, namespace: &[String]) -> Option<&Type> {
        (0..=namespace.len())
            .rev()
            .find_map(|depth| self.types.get(&qualify(&namespace[..depth], name)))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Join a namespace path and a name with `::`
pub fn qualify(namespace: &[String], name: &str) -> String {
    if namespace.is_empty() {
        return name.to_string();
    }
    let mut path = namespace.join(PATH_SEPARATOR);
    path.push_str(PATH_SEPARATOR);
    path.push_str(name);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ns(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_define_once() {
        let mut table = TypeTable::new();
        table.define("bool", Type::Bool).unwrap();
        assert_matches!(
            table.define("bool", Type::String),
            Err(TypeTableError::AlreadyDefined(path)) if path == "bool"
        );
        assert_eq!(table.lookup("bool").unwrap(), &Type::Bool);
        assert_matches!(table.lookup("text"), Err(TypeTableError::NotDefined(_)));
    }

    #[test]
    fn test_alias_shares_type() {
        let mut table = TypeTable::new();
        table.define("uint8", Type::uint(8)).unwrap();
        table.alias("byte", "uint8").unwrap();
        assert_eq!(table.get("byte"), Some(&Type::uint(8)));
        assert!(table.alias("word", "uint16").is_err());
    }

    #[test]
    fn test_resolution_walks_outward() {
        let mut table = TypeTable::new();
        table.define("color", Type::Bool).unwrap();
        table.define("a::color", Type::String).unwrap();
        table.define("a::b::depth", Type::int(8)).unwrap();

        assert_eq!(table.resolve_in("color", &ns(&["a", "b"])), Some(&Type::String));
        assert_eq!(table.resolve_in("color", &ns(&["x"])), Some(&Type::Bool));
        assert_eq!(table.resolve_in("depth", &ns(&["a", "b"])), Some(&Type::int(8)));
        assert_eq!(table.resolve_in("depth", &ns(&["a"])), None);
        assert_eq!(table.resolve_in("b::depth", &ns(&["a"])), Some(&Type::int(8)));
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify(&[], "x"), "x");
        assert_eq!(qualify(&ns(&["a", "b"]), "x"), "a::b::x");
    }
}
