//! Namespace tree used for function resolution and output layout

use crate::syntax::{Namespace, UserFunction};
use crate::types::{FunctionSignature, Type};

#[derive(Debug, Clone, Default)]
pub struct NamespaceNode {
    pub name: String,
    pub builtins: Vec<FunctionSignature>,
    pub functions: Vec<UserFunction>,
    pub children: Vec<NamespaceNode>,
}

impl NamespaceNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// No user function in this node or any descendant
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.children.iter().all(NamespaceNode::is_empty)
    }

    pub fn child(&self, name: &str) -> Option<&NamespaceNode> {
        self.children.iter().find(|child| child.name == name)
    }

    fn child_mut_or_insert(&mut self, name: &str) -> &mut NamespaceNode {
        let index = match self.children.iter().position(|child| child.name == name) {
            Some(index) => index,
            None => {
                self.children.push(NamespaceNode::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Builtins first, then user functions
    fn signatures(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.builtins
            .iter()
            .chain(self.functions.iter().map(|function| &function.signature))
    }
}

/// Root of all namespaces of a program, with builtins registered next to
/// user functions
#[derive(Debug, Clone, Default)]
pub struct NamespaceTree {
    pub root: NamespaceNode,
}

impl NamespaceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree holding the functions of every namespace block; reopened
    /// namespaces are merged.
    pub fn from_namespaces(namespaces: Vec<Namespace>) -> Self {
        let mut tree = Self::new();
        for namespace in namespaces {
            let node = tree.node_mut_or_insert(&namespace.path);
            node.functions.extend(namespace.functions);
        }
        tree
    }

    /// Registers a builtin; its index counts the same-named builtins
    /// already present in the target namespace.
    pub fn add_builtin(&mut self, mut signature: FunctionSignature) {
        let path = signature.namespace.clone();
        let node = self.node_mut_or_insert(&path);
        signature.index = node
            .builtins
            .iter()
            .filter(|existing| existing.name == signature.name)
            .count();
        node.builtins.push(signature);
    }

    pub fn find<'a, I>(&self, path: I) -> Option<&NamespaceNode>
    where
        I: IntoIterator<Item = &'a String>,
    {
        path.into_iter()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// First signature accepting `arguments`. Candidates are gathered from
    /// every enclosing namespace of `context` (innermost first) and then
    /// from every import, each combined with the namespace part of `call_path`.
    pub fn resolve_function(
        &self,
        context: &[String],
        call_path: &[String],
        imports: &[&[String]],
        arguments: &[Type],
    ) -> Option<&FunctionSignature> {
        let (name, prefix) = call_path.split_last()?;

        let enclosing = (0..=context.len())
            .rev()
            .filter_map(|depth| self.find(context[..depth].iter().chain(prefix)));
        let imported = imports
            .iter()
            .filter_map(|import| self.find(import.iter().chain(prefix)));

        enclosing
            .chain(imported)
            .flat_map(NamespaceNode::signatures)
            .filter(|signature| &signature.name == name)
            .find(|signature| signature.accepts(arguments))
    }

    fn node_mut_or_insert(&mut self, path: &[String]) -> &mut NamespaceNode {
        let mut node = &mut self.root;
        for segment in path {
            node = node.child_mut_or_insert(segment);
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;
    use crate::types::{builtin_functions, Parameter};

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn tree_for(source: &str) -> NamespaceTree {
        let program = parse_source(source).unwrap();
        let mut tree = NamespaceTree::from_namespaces(program.namespaces);
        for builtin in builtin_functions() {
            tree.add_builtin(builtin);
        }
        tree
    }

    #[test]
    fn test_builtin_overloads_get_consecutive_indices() {
        let tree = tree_for("");
        let root = &tree.root;
        let conversions: Vec<usize> = root
            .builtins
            .iter()
            .filter(|sig| sig.name == "string")
            .map(|sig| sig.index)
            .collect();
        assert_eq!(conversions, [0, 1, 2]);
        assert!(tree.root.is_empty());
    }

    #[test]
    fn test_reopened_namespaces_merge() {
        let tree = tree_for("namespace a { void f() { } } namespace a { void g() { } }");
        let node = tree.find(&path(&["a"])).unwrap();
        assert_eq!(node.functions.len(), 2);
        assert!(!tree.root.is_empty());
    }

    #[test]
    fn test_resolve_prefers_innermost_namespace() {
        let tree = tree_for(
            "namespace a { void f() { } namespace b { void f() { } void main() { } } }",
        );
        let found = tree
            .resolve_function(&path(&["a", "b"]), &path(&["f"]), &[], &[])
            .unwrap();
        assert_eq!(found.namespace, path(&["a", "b"]));

        let outer = tree
            .resolve_function(&path(&["a", "b"]), &path(&["a", "f"]), &[], &[])
            .unwrap();
        assert_eq!(outer.namespace, path(&["a"]));
    }

    #[test]
    fn test_resolve_through_import_and_overloads() {
        let tree = tree_for("");
        let import = path(&["sys", "math"]);
        let imports = [import.as_slice()];

        let abs = tree
            .resolve_function(&[], &path(&["abs"]), &imports, &[Type::int(8)])
            .unwrap();
        assert_eq!(abs.key(), "abs#0");

        let string = tree
            .resolve_function(&[], &path(&["string"]), &[], &[Type::Bool])
            .unwrap();
        assert_eq!(string.key(), "string#1");

        assert!(tree
            .resolve_function(&[], &path(&["abs"]), &[], &[Type::int(8)])
            .is_none());
    }

    #[test]
    fn test_argument_mismatch_does_not_resolve() {
        let mut tree = NamespaceTree::new();
        tree.add_builtin(FunctionSignature::builtin(
            &["x"],
            "f",
            vec![Parameter::new("s", Type::String)],
            None,
        ));
        assert!(tree
            .resolve_function(&[], &path(&["x", "f"]), &[], &[Type::Bool])
            .is_none());
        assert!(tree
            .resolve_function(&[], &path(&["x", "f"]), &[], &[Type::String])
            .is_some());
    }
}
