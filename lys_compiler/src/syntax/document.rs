//! Document-level reader: namespaces, type definitions and function headers
//!
//! Function bodies are handed to the [`Interpreter`] as they are reached, so
//! the whole document is read in a single pass over the token stream.

use super::error::{SyntaxError, SyntaxResult};
use super::interpreter::{read_name_path, Interpreter};
use super::program::{Namespace, Program, UserFunction};
use crate::config::constants::compile_time::syntax::{
    MAX_FUNCTION_PARAMETERS, MAX_NAMESPACE_DEPTH,
};
use crate::config::runtime::SyntaxPreferences;
use crate::ir::OperationCollection;
use crate::lexical::LexerError;
use crate::log_info;
use crate::tokens::{TokenCursor, TokenKind, TokenSource};
use crate::types::{
    qualify, FunctionSignature, Parameter, StructType, Type, TypeTable, PATH_SEPARATOR,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Reads a whole document into a [`Program`]
pub struct DocumentProcessor<S: TokenSource<Error = LexerError>> {
    cursor: TokenCursor<S>,
    types: TypeTable,
    /// Next overload index per (namespace path, function name)
    overloads: HashMap<(Vec<String>, String), usize>,
    preferences: SyntaxPreferences,
}

impl<S: TokenSource<Error = LexerError>> DocumentProcessor<S> {
    /// `types` is the table user type definitions are added to, normally
    /// [`builtin_types`](crate::types::builtin_types)
    pub fn new(source: S, types: TypeTable) -> Self {
        Self {
            cursor: TokenCursor::new(source),
            types,
            overloads: HashMap::new(),
            preferences: SyntaxPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: SyntaxPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn read(mut self) -> SyntaxResult<Program> {
        self.advance()?;
        let mut namespaces = Vec::new();
        self.read_block(Vec::new(), &mut namespaces)?;

        if !self.cursor.is(TokenKind::EndOfDocument) {
            return Err(SyntaxError::unexpected(self.cursor.current()));
        }
        Ok(Program {
            namespaces,
            types: self.types,
        })
    }

    fn advance(&mut self) -> SyntaxResult<()> {
        self.cursor.advance()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> SyntaxResult<()> {
        if !self.cursor.is(kind) {
            return Err(SyntaxError::expected(message, self.cursor.position()));
        }
        self.advance()
    }

    /// Read `name` and return it with its offset
    fn expect_name(&mut self, message: &str) -> SyntaxResult<(String, usize)> {
        let token = self.cursor.current();
        let name = match token.text() {
            Some(text) if token.is(TokenKind::Name) => (text.to_string(), token.position),
            _ => return Err(SyntaxError::expected(message, token.position)),
        };
        self.advance()?;
        Ok(name)
    }

    /// Contents of the root or of one namespace block, up to its `}`. The
    /// block itself is recorded before any nested block.
    fn read_block(&mut self, path: Vec<String>, out: &mut Vec<Namespace>) -> SyntaxResult<()> {
        let index = out.len();
        out.push(Namespace::new(path.clone()));

        while !self
            .cursor
            .is_any(&[TokenKind::CurlyBracketRight, TokenKind::EndOfDocument])
        {
            if self.cursor.is_word("namespace") {
                self.read_namespace(&path, out)?;
            } else if self.cursor.is_word("typedef") {
                let definition = self.read_typedef(&path)?;
                out[index].type_definitions.push(definition);
            } else {
                let function = self.read_function(&path)?;
                out[index].functions.push(function);
            }
        }
        Ok(())
    }

    fn read_namespace(&mut self, parent: &[String], out: &mut Vec<Namespace>) -> SyntaxResult<()> {
        let position = self.cursor.position();
        self.advance()?;

        let mut path = parent.to_vec();
        path.extend(read_name_path(&mut self.cursor, false)?.0);
        if path.len() > MAX_NAMESPACE_DEPTH {
            return Err(SyntaxError::limit_exceeded(
                "nested namespaces",
                MAX_NAMESPACE_DEPTH,
                position,
            ));
        }

        self.expect(TokenKind::CurlyBracketLeft, "Expected '{'")?;
        self.read_block(path, out)?;
        self.expect(TokenKind::CurlyBracketRight, "Expected '}'")
    }

    /// `typedef name = type;` or `typedef name = { field: type, ... };`
    fn read_typedef(&mut self, namespace: &[String]) -> SyntaxResult<(String, Type)> {
        self.advance()?;
        let (name, position) = self.expect_name("Expected type identifier")?;
        self.expect(TokenKind::Assign, "Expected '='")?;

        let ty = if self.cursor.is(TokenKind::Name) {
            self.read_type_reference(namespace, "Expected type identifier")?
        } else if self.cursor.is(TokenKind::CurlyBracketLeft) {
            let fields = self.read_fields(namespace)?;
            Type::Struct(Arc::new(StructType {
                name: qualify(namespace, &name),
                fields,
            }))
        } else {
            return Err(SyntaxError::expected(
                "Expected '{' or a type.",
                self.cursor.position(),
            ));
        };
        self.expect(TokenKind::EndOfInstruction, "Expected ';'")?;

        self.types
            .define(qualify(namespace, &name), ty.clone())
            .map_err(|error| SyntaxError::duplicate(error.to_string(), position))?;
        Ok((name, ty))
    }

    fn read_fields(&mut self, namespace: &[String]) -> SyntaxResult<Vec<(String, Type)>> {
        let mut fields: Vec<(String, Type)> = Vec::new();
        loop {
            self.advance()?;
            let (field, position) = self.expect_name("Expected field name")?;
            if fields.iter().any(|(existing, _)| *existing == field) {
                return Err(SyntaxError::duplicate(
                    format!("Duplicate field: {}", field),
                    position,
                ));
            }
            self.expect(TokenKind::Colon, "Expected ':'")?;
            let ty = self.read_type_reference(namespace, "Expected type identifier")?;
            fields.push((field, ty));

            if !self.cursor.is(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CurlyBracketRight, "Expected '}'")?;
        Ok(fields)
    }

    /// `path::to::type` followed by any number of `[]`
    fn read_type_reference(&mut self, namespace: &[String], missing: &str) -> SyntaxResult<Type> {
        let position = self.cursor.position();
        if !self.cursor.is(TokenKind::Name) {
            return Err(SyntaxError::expected(missing, position));
        }
        let (path, _) = read_name_path(&mut self.cursor, false)?;
        let name = path.join(PATH_SEPARATOR);
        let mut ty = self
            .types
            .resolve_in(&name, namespace)
            .cloned()
            .ok_or_else(|| SyntaxError::unrecognized_type(name, position))?;

        while self.cursor.is(TokenKind::SquareBracketLeft) {
            self.advance()?;
            self.expect(TokenKind::SquareBracketRight, "Expected ']'")?;
            ty = Type::array_of(ty);
        }
        Ok(ty)
    }

    fn read_function(&mut self, namespace: &[String]) -> SyntaxResult<UserFunction> {
        let position = self.cursor.position();
        let return_type = if self.cursor.is_word("void") {
            self.advance()?;
            None
        } else {
            Some(self.read_type_reference(namespace, "Expected function return type")?)
        };
        let (name, _) = self.expect_name("Expected function name")?;
        self.expect(TokenKind::BracketLeft, "Expected '('")?;
        let parameters = self.read_parameters(namespace)?;
        self.expect(TokenKind::CurlyBracketLeft, "Expected '{'")?;

        let counter = self
            .overloads
            .entry((namespace.to_vec(), name.clone()))
            .or_insert(0);
        let signature = FunctionSignature {
            name,
            is_builtin: false,
            index: *counter,
            parameters,
            return_type,
            namespace: namespace.to_vec(),
        };
        *counter += 1;

        if self.preferences.log_function_headers {
            log_info!("Read function header",
                "function" => signature.describe(),
                "offset" => position
            );
        }

        let mut body = OperationCollection::new();
        {
            let mut interpreter = Interpreter::new(&mut self.cursor, &self.types, namespace);
            while !interpreter.at_body_end() {
                body.append_all(interpreter.statement()?);
            }
        }
        self.expect(TokenKind::CurlyBracketRight, "Expected '}'")?;

        Ok(UserFunction {
            signature,
            position,
            body,
        })
    }

    /// Parameter list after `(`, consuming the closing `)`
    fn read_parameters(&mut self, namespace: &[String]) -> SyntaxResult<Vec<Parameter>> {
        let mut parameters: Vec<Parameter> = Vec::new();
        if self.cursor.is(TokenKind::BracketRight) {
            self.advance()?;
            return Ok(parameters);
        }

        loop {
            let ty = self.read_type_reference(namespace, "Expected argument type")?;
            let (name, position) = self.expect_name("Expected argument name")?;
            if parameters.iter().any(|p| p.name == name) {
                return Err(SyntaxError::duplicate(
                    format!("Duplicate argument name '{}'.", name),
                    position,
                ));
            }
            if parameters.len() == MAX_FUNCTION_PARAMETERS {
                return Err(SyntaxError::limit_exceeded(
                    "parameters",
                    MAX_FUNCTION_PARAMETERS,
                    position,
                ));
            }
            parameters.push(Parameter::new(name, ty));

            if self.cursor.is(TokenKind::BracketRight) {
                self.advance()?;
                return Ok(parameters);
            }
            self.expect(TokenKind::Comma, "Expected ',' or ')'")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::create_tokenizer;
    use crate::types::builtin_types;
    use assert_matches::assert_matches;

    fn read(source: &str) -> SyntaxResult<Program> {
        DocumentProcessor::new(create_tokenizer(source), builtin_types().unwrap()).read()
    }

    #[test]
    fn test_empty_document() {
        let program = read("").unwrap();
        assert_eq!(program.namespaces.len(), 1);
        assert!(program.namespaces[0].is_root());
        assert_eq!(program.function_count(), 0);
    }

    #[test]
    fn test_functions_and_overloads() {
        let program = read(
            "namespace t { void f(int8 a) { } void f(string s) { } int32 g() { return 1; } }",
        )
        .unwrap();
        assert_eq!(program.namespaces.len(), 2);

        let keys: Vec<String> = program.functions().map(|f| f.signature.key()).collect();
        assert_eq!(keys, vec!["f#0", "f#1", "g#0"]);

        let g = program.functions().nth(2).unwrap();
        assert_eq!(g.signature.return_type, Some(Type::int(32)));
        assert_eq!(g.signature.namespace, vec!["t"]);
        assert_eq!(g.body.len(), 2);
    }

    #[test]
    fn test_overload_index_spans_reopened_namespaces() {
        let program = read("namespace a { void f() { } } namespace a { void f() { } }").unwrap();
        let keys: Vec<String> = program.functions().map(|f| f.signature.key()).collect();
        assert_eq!(keys, vec!["f#0", "f#1"]);
    }

    #[test]
    fn test_namespace_order_is_parent_first() {
        let program = read("namespace a { namespace b { } void f() { } } namespace c::d { }").unwrap();
        let paths: Vec<String> = program
            .namespaces
            .iter()
            .map(|ns| ns.path.join("::"))
            .collect();
        assert_eq!(paths, vec!["", "a", "a::b", "c::d"]);
    }

    #[test]
    fn test_typedefs() {
        let program = read(
            "namespace gfx { typedef point = { x: float, y: float }; typedef points = point[]; }",
        )
        .unwrap();
        let point = program.types.get("gfx::point").unwrap();
        assert!(point.is_struct());
        assert_eq!(point.property("y").unwrap(), Type::float(32));
        assert_eq!(
            program.types.get("gfx::points"),
            Some(&Type::array_of(point.clone()))
        );
        assert_eq!(program.namespaces[1].type_definitions.len(), 2);
    }

    #[test]
    fn test_typedef_visible_in_bodies() {
        let program = read("typedef counter = uint8; void main() { counter c = 1; }").unwrap();
        let main = program.functions().next().unwrap();
        assert_eq!(main.body.len(), 2);
    }

    #[test]
    fn test_header_errors() {
        assert_matches!(
            read("void f(int8 a, int8 a) { }"),
            Err(SyntaxError::Duplicate { message, offset: 20 }) if message == "Duplicate argument name 'a'."
        );
        assert_matches!(
            read("typedef p = { x: int, x: int };"),
            Err(SyntaxError::Duplicate { message, .. }) if message == "Duplicate field: x"
        );
        assert_matches!(
            read("colour f() { }"),
            Err(SyntaxError::UnrecognizedType { name, offset: 0 }) if name == "colour"
        );
        assert_matches!(
            read("namespace a { void f() { }"),
            Err(SyntaxError::MissingDelimiter { message, .. }) if message == "Expected '}'"
        );
        assert_matches!(read("}"), Err(SyntaxError::UnexpectedToken { .. }));
        assert_matches!(
            read("typedef t = int; typedef t = bool;"),
            Err(SyntaxError::Duplicate { .. })
        );
    }

    #[test]
    fn test_body_without_closing_brace() {
        assert_matches!(
            read("void f() { int a = 1;"),
            Err(SyntaxError::MissingDelimiter { message, .. }) if message == "Expected '}'"
        );
    }
}
