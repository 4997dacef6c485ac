//! Lexical scopes of one function body
//!
//! Scopes live in an arena and refer to their parent by index. A scope sees
//! the variables and imports of every enclosing scope.

use crate::types::Type;

pub type ScopeId = usize;

#[derive(Debug, Default)]
struct Frame {
    parent: Option<ScopeId>,
    depth: usize,
    variables: VariableSet,
    imports: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct ScopeArena {
    frames: Vec<Frame>,
}

impl ScopeArena {
    /// Arena holding only the function scope, id `0`
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        0
    }

    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let depth = self.frames.get(parent).map_or(0, |frame| frame.depth + 1);
        self.frames.push(Frame {
            parent: Some(parent),
            depth,
            ..Default::default()
        });
        self.frames.len() - 1
    }

    /// Nesting level below the function scope
    pub fn depth(&self, scope: ScopeId) -> usize {
        self.frames.get(scope).map_or(0, |frame| frame.depth)
    }

    pub fn declare(&mut self, scope: ScopeId, name: &str, ty: Type) {
        if let Some(frame) = self.frames.get_mut(scope) {
            frame.variables.add(name, ty);
        }
    }

    /// Type of the innermost visible variable called `name`
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Type> {
        self.chain(scope)
            .find_map(|frame| frame.variables.get(name))
    }

    pub fn has_variable(&self, scope: ScopeId, name: &str) -> bool {
        self.lookup(scope, name).is_some()
    }

    pub fn import(&mut self, scope: ScopeId, path: Vec<String>) {
        if let Some(frame) = self.frames.get_mut(scope) {
            if !frame.imports.contains(&path) {
                frame.imports.push(path);
            }
        }
    }

    /// Visible imports, innermost scope first, without duplicates
    pub fn imports(&self, scope: ScopeId) -> Vec<&[String]> {
        let mut visible: Vec<&[String]> = Vec::new();
        for frame in self.chain(scope) {
            for path in &frame.imports {
                if !visible.contains(&path.as_slice()) {
                    visible.push(path);
                }
            }
        }
        visible
    }

    fn chain(&self, scope: ScopeId) -> impl Iterator<Item = &Frame> {
        let mut next = Some(scope);
        std::iter::from_fn(move || {
            let frame = self.frames.get(next?)?;
            next = frame.parent;
            Some(frame)
        })
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Variables keyed by name, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSet {
    entries: Vec<(String, Type)>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the variable unless one with the same name is present
    pub fn add(&mut self, name: &str, ty: Type) {
        if !self.contains(name) {
            self.entries.push((name.to_string(), ty));
        }
    }

    pub fn extend(&mut self, other: &VariableSet) {
        for (name, ty) in &other.entries {
            self.add(name, ty.clone());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, ty)| ty)
    }

    /// Entries of `self` whose name does not occur in `other`
    pub fn difference(&self, other: &VariableSet) -> VariableSet {
        VariableSet {
            entries: self
                .entries
                .iter()
                .filter(|(name, _)| !other.contains(name))
                .cloned()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.entries.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut scopes = ScopeArena::new();
        let root = scopes.root();
        scopes.declare(root, "x", Type::int(8));
        let inner = scopes.child(root);
        scopes.declare(inner, "y", Type::Bool);

        assert_eq!(scopes.lookup(inner, "x"), Some(&Type::int(8)));
        assert!(scopes.has_variable(inner, "y"));
        assert!(!scopes.has_variable(root, "y"));
        assert_eq!(scopes.depth(inner), 1);
    }

    #[test]
    fn test_sibling_scopes_are_isolated() {
        let mut scopes = ScopeArena::new();
        let root = scopes.root();
        let first = scopes.child(root);
        scopes.declare(first, "tmp", Type::Bool);
        let second = scopes.child(root);
        assert!(!scopes.has_variable(second, "tmp"));
    }

    #[test]
    fn test_imports_innermost_first_without_duplicates() {
        let mut scopes = ScopeArena::new();
        let root = scopes.root();
        scopes.import(root, path(&["sys", "math"]));
        let inner = scopes.child(root);
        scopes.import(inner, path(&["sys", "log"]));
        scopes.import(inner, path(&["sys", "math"]));
        scopes.import(inner, path(&["sys", "log"]));

        let imports = scopes.imports(inner);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0], ["sys", "log"]);
        assert_eq!(imports[1], ["sys", "math"]);
    }

    #[test]
    fn test_variable_set_difference_keeps_order() {
        let mut used = VariableSet::new();
        used.add("b", Type::Bool);
        used.add("a", Type::int(32));
        used.add("c", Type::String);
        used.add("b", Type::String);
        let mut created = VariableSet::new();
        created.add("a", Type::int(32));

        let free = used.difference(&created);
        let names: Vec<&str> = free.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "c"]);
        assert_eq!(free.get("b"), Some(&Type::Bool));
    }
}
