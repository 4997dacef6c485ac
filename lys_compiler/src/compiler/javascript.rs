//! JavaScript code generator
//!
//! Every function body is replayed operation by operation against a value
//! stack. Operands become [`StackElement`]s holding generated code and a
//! static type; statements are written to the output as soon as they are
//! complete. The result is one object literal whose keys are namespace
//! segments and `"name#index"` function entries.

use super::error::{CompileError, CompileResult};
use super::namespace::{NamespaceNode, NamespaceTree};
use super::scope::{ScopeArena, ScopeId, VariableSet};
use super::stack::StackElement;
use crate::config::constants::compile_time::compiler::{
    MAX_OUTPUT_SIZE, MAX_SCOPE_DEPTH, MAX_STACK_DEPTH,
};
use crate::config::constants::literals::{DEFAULT_FLOAT_TYPE, DEFAULT_INT_TYPE, DEFAULT_UINT_TYPE};
use crate::config::constants::runtime_hooks::{
    ASYNC, BUILTIN, COPY, LED, LED_ACCESSOR_NAME, SYNC, TEMP_PREFIX, USER, VECTOR,
};
use crate::config::runtime::CompilerPreferences;
use crate::ir::{Constant, Cursor, OperationKind};
use crate::logging::codes;
use crate::syntax::{Program, UserFunction};
use crate::tokens::{RawFloat, RawInt};
use crate::types::{
    builtin_functions, BinaryOperator, StructType, Type, TypeTable, UnaryOperator,
};
use crate::{log_debug, log_success};

const INDENT: &str = "\t";

pub struct JavascriptCompiler {
    tree: NamespaceTree,
    types: TypeTable,
    preferences: CompilerPreferences,
}

impl JavascriptCompiler {
    /// Takes ownership of the parsed program and registers the builtin
    /// functions next to the user functions.
    pub fn new(program: Program) -> Self {
        let Program { namespaces, types } = program;
        let mut tree = NamespaceTree::from_namespaces(namespaces);
        for builtin in builtin_functions() {
            tree.add_builtin(builtin);
        }
        Self {
            tree,
            types,
            preferences: CompilerPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: CompilerPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn compile(&self) -> CompileResult<String> {
        log_debug!("Starting code generation");

        let mut output = String::from("{\n");
        let mut temporaries = 0;
        let functions = self.write_namespace(&self.tree.root, INDENT, &mut temporaries, &mut output)?;
        output.push_str("}\n");

        log_success!(
            codes::success::COMPILATION_COMPLETE,
            "Code generation completed successfully",
            "functions" => functions,
            "bytes" => output.len()
        );
        Ok(output)
    }

    /// Writes child namespaces, then the functions of `node`. Returns the
    /// number of functions written.
    fn write_namespace(
        &self,
        node: &NamespaceNode,
        indent: &str,
        temporaries: &mut usize,
        out: &mut String,
    ) -> CompileResult<usize> {
        let mut written = 0;
        for child in node.children.iter().filter(|child| !child.is_empty()) {
            out.push_str(&format!("{}{}: {{\n", indent, child.name));
            written += self.write_namespace(child, &deeper(indent), temporaries, out)?;
            out.push_str(&format!("{}}},\n", indent));
        }
        for function in &node.functions {
            self.write_function(function, indent, temporaries, out)?;
            written += 1;
        }
        Ok(written)
    }

    fn write_function(
        &self,
        function: &UserFunction,
        indent: &str,
        temporaries: &mut usize,
        out: &mut String,
    ) -> CompileResult<()> {
        let signature = &function.signature;
        if self.preferences.annotate_source_offsets {
            out.push_str(&format!("{}// offset {}\n", indent, function.position));
        }
        let parameters = signature
            .parameters
            .iter()
            .map(|parameter| parameter.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{}\"{}\": function({}) {{\n",
            indent,
            signature.key(),
            parameters
        ));

        let mut generator = FunctionGenerator {
            tree: &self.tree,
            types: &self.types,
            function,
            scopes: ScopeArena::new(),
            temporaries: *temporaries,
            hoisted: Vec::new(),
        };
        generator.generate(&deeper(indent), out)?;
        *temporaries = generator.temporaries;

        out.push_str(&format!("{}}},\n", indent));

        if out.len() > MAX_OUTPUT_SIZE {
            return Err(CompileError::new(
                codes::compile::RESOURCE_LIMIT,
                format!("Generated output exceeds {} bytes", MAX_OUTPUT_SIZE),
                function.position,
            ));
        }
        if self.preferences.log_function_summaries {
            log_success!(
                codes::success::FUNCTION_COMPILED,
                "Compiled function",
                "function" => signature.describe(),
                "operations" => function.body.len(),
                "offset" => function.position
            );
        }
        Ok(())
    }
}

fn deeper(indent: &str) -> String {
    format!("{}{}", indent, INDENT)
}

/// Operation that ends the sequence being compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Body,
    Scope,
    OperationBlock,
}

/// What a compiled operation sequence tells its enclosing sequence
#[derive(Debug, Default)]
struct ScopeResult {
    /// Set once every path through the sequence returns
    return_type: Option<Type>,
    /// Value left by an operation block
    value: Option<StackElement>,
    used: VariableSet,
    created: VariableSet,
}

impl ScopeResult {
    fn merge_variables(&mut self, other: &ScopeResult) {
        self.used.extend(&other.used);
        self.created.extend(&other.created);
    }
}

/// State of one operation sequence being compiled
struct Block<'i> {
    scope: ScopeId,
    indent: &'i str,
    /// Statements of a `for` header are written without terminator
    for_init: bool,
    terminator: Terminator,
    stack: Vec<StackElement>,
    result: ScopeResult,
}

impl<'i> Block<'i> {
    fn new(scope: ScopeId, indent: &'i str, terminator: Terminator) -> Self {
        Self {
            scope,
            indent,
            for_init: false,
            terminator,
            stack: Vec::new(),
            result: ScopeResult::default(),
        }
    }

    fn for_init(scope: ScopeId) -> Self {
        Self {
            for_init: true,
            ..Self::new(scope, "", Terminator::Scope)
        }
    }

    fn push(&mut self, element: StackElement, position: usize) -> CompileResult<()> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(CompileError::new(
                codes::compile::RESOURCE_LIMIT,
                format!("Expression is too complex (max {} operands)", MAX_STACK_DEPTH),
                position,
            ));
        }
        self.stack.push(element);
        Ok(())
    }

    fn pop(&mut self, position: usize) -> CompileResult<StackElement> {
        self.stack
            .pop()
            .ok_or_else(|| CompileError::internal("Instruction stack is empty", position))
    }

    /// The top `count` elements in push order
    fn pop_many(&mut self, count: usize, position: usize) -> CompileResult<Vec<StackElement>> {
        if self.stack.len() < count {
            return Err(CompileError::internal(
                format!("Expected {} values on the instruction stack", count),
                position,
            ));
        }
        Ok(self.stack.split_off(self.stack.len() - count))
    }

    /// Writes `code` as a statement; inside a `for` header the header
    /// supplies the separator
    fn statement(&self, out: &mut String, code: &str) {
        if self.for_init {
            out.push_str(code);
        } else {
            line(out, self.indent, &format!("{};", code));
        }
    }
}

fn line(out: &mut String, indent: &str, code: &str) {
    out.push_str(indent);
    out.push_str(code);
    out.push('\n');
}

struct FunctionGenerator<'c> {
    tree: &'c NamespaceTree,
    types: &'c TypeTable,
    function: &'c UserFunction,
    scopes: ScopeArena,
    /// Counter for `tmp$N` names, shared by the whole document
    temporaries: usize,
    /// Temporaries declared at the top of the function body
    hoisted: Vec<String>,
}

impl<'c> FunctionGenerator<'c> {
    fn generate(&mut self, indent: &str, out: &mut String) -> CompileResult<()> {
        let function = self.function;
        if !function.body.is_balanced() {
            return Err(CompileError::internal(
                format!("Unbalanced scopes in the body of {}", function.signature.describe()),
                function.position,
            ));
        }
        let root = self.scopes.root();
        for parameter in &function.signature.parameters {
            self.scopes.declare(root, &parameter.name, parameter.ty.clone());
        }

        let mut cursor = function.body.cursor();
        let mut body = String::new();
        let result = self.compile_scope(&mut cursor, Block::new(root, indent, Terminator::Body), &mut body)?;
        self.verify_return_type(result.return_type)?;

        if !self.hoisted.is_empty() {
            line(out, indent, &format!("var {};", self.hoisted.join(", ")));
        }
        out.push_str(&body);
        Ok(())
    }

    fn verify_return_type(&self, actual: Option<Type>) -> CompileResult<()> {
        let message = match (actual, &self.function.signature.return_type) {
            (None, Some(_)) => "Function does not return a value",
            (Some(_), None) => "Function must not return a value",
            (Some(actual), Some(declared)) if !actual.can_cast_to(declared) => {
                "Function return value does not match definition"
            }
            _ => return Ok(()),
        };
        Err(CompileError::new(
            codes::compile::RETURN_TYPE_MISMATCH,
            message,
            self.function.position,
        ))
    }

    fn compile_scope(
        &mut self,
        cursor: &mut Cursor<'c>,
        mut block: Block<'_>,
        out: &mut String,
    ) -> CompileResult<ScopeResult> {
        if self.scopes.depth(block.scope) > MAX_SCOPE_DEPTH {
            let position = cursor.current().map_or(self.function.position, |op| op.position);
            return Err(CompileError::new(
                codes::compile::RESOURCE_LIMIT,
                format!("Too many nested scopes (max {})", MAX_SCOPE_DEPTH),
                position,
            ));
        }

        while cursor.next() {
            let Some(operation) = cursor.current() else {
                break;
            };
            let position = operation.position;

            match &operation.kind {
                OperationKind::NoOperation | OperationKind::LoadUndefined => {}
                OperationKind::Pop => {
                    let element = block.pop(position)?;
                    block.statement(out, &element.discarded());
                }
                OperationKind::Swap => {
                    let top = block.pop(position)?;
                    let below = block.pop(position)?;
                    block.stack.push(top);
                    block.stack.push(below);
                }
                OperationKind::BeginOpBlock => {
                    return Err(CompileError::internal("Unexpected operation block", position));
                }
                OperationKind::EndOpBlock => {
                    self.expect_terminator(&block, Terminator::OperationBlock, position)?;
                    if block.stack.len() > 1 {
                        return Err(CompileError::internal(
                            "Instruction stack should contain exactly one element at end of operation block",
                            position,
                        ));
                    }
                    block.result.value = block.stack.pop();
                    return Ok(block.result);
                }
                OperationKind::EndScope => {
                    self.expect_terminator(&block, Terminator::Scope, position)?;
                    if !block.stack.is_empty() {
                        return Err(CompileError::internal(
                            "Instruction stack should be empty at end of scope",
                            position,
                        ));
                    }
                    return Ok(block.result);
                }

                OperationKind::Binary(op) => self.binary(&mut block, *op, position)?,
                OperationKind::Unary(op) => self.unary(&mut block, *op, position)?,
                OperationKind::Assign(op) => self.assign(&mut block, *op, position)?,
                OperationKind::Increment { prefix } => {
                    self.step(&mut block, "++", *prefix, position)?
                }
                OperationKind::Decrement { prefix } => {
                    self.step(&mut block, "--", *prefix, position)?
                }
                OperationKind::PropertyAccess(name) => {
                    self.property_access(&mut block, name, position)?
                }
                OperationKind::Index => self.index(&mut block, position)?,
                OperationKind::Call(count) => self.call(&mut block, *count, position)?,

                OperationKind::BeginScope => {
                    line(out, block.indent, "{");
                    let child = self.scopes.child(block.scope);
                    let indent = deeper(block.indent);
                    let inner =
                        self.compile_scope(cursor, Block::new(child, &indent, Terminator::Scope), out)?;
                    line(out, block.indent, "}");
                    block.result.merge_variables(&inner);
                    if block.result.return_type.is_none() {
                        block.result.return_type = inner.return_type;
                    }
                }
                OperationKind::If => self.if_statement(cursor, &mut block, position, out)?,
                OperationKind::For => self.for_statement(cursor, &mut block, position, out)?,
                OperationKind::While => self.while_statement(cursor, &mut block, position, out)?,
                OperationKind::DoWhile => {
                    self.do_while_statement(cursor, &mut block, position, out)?
                }

                OperationKind::LoadSymbol(name) => {
                    let ty = self.scopes.lookup(block.scope, name).cloned().ok_or_else(|| {
                        CompileError::new(
                            codes::compile::UNRESOLVED_VARIABLE,
                            format!("Cannot resolve variable: {}", name),
                            position,
                        )
                    })?;
                    block.result.used.add(name, ty.clone());
                    block.push(StackElement::variable(name.as_str(), ty), position)?;
                }
                OperationKind::LoadConstant(constant) => {
                    let element = self.constant(constant, position)?;
                    block.push(element, position)?;
                }
                OperationKind::LoadFunction(path) => {
                    block.push(StackElement::function(path.clone()), position)?;
                }
                OperationKind::MakeList(count) => self.make_list(&mut block, *count, position)?,
                OperationKind::MakeVector(count) => {
                    self.make_vector(&mut block, *count, position)?
                }

                OperationKind::CreateVariable { ty, name } => {
                    let has_value = !matches!(cursor.peek_previous(), Some(OperationKind::LoadUndefined));
                    self.create_variable(&mut block, ty, name, has_value, position, out)?;
                }
                OperationKind::Return => {
                    if self.function.signature.return_type.is_some() {
                        return Err(CompileError::new(
                            codes::compile::RETURN_TYPE_MISMATCH,
                            "The function requires a value to be returned",
                            position,
                        ));
                    }
                    line(out, block.indent, "return;");
                }
                OperationKind::ReturnValue => self.return_value(&mut block, position, out)?,
                OperationKind::Import(path) => self.scopes.import(block.scope, path.clone()),
                OperationKind::Async => self.async_statement(cursor, &mut block, position, out)?,
                OperationKind::AsyncWait => self.async_wait(&mut block, position, out)?,
                OperationKind::SyncAbort => self.sync(&mut block, false, position, out)?,
                OperationKind::SyncEnd => self.sync(&mut block, true, position, out)?,
            }
        }

        let position = self.function.body.last().map_or(self.function.position, |op| op.position);
        if block.terminator != Terminator::Body {
            return Err(CompileError::internal("Unexpected end of operations", position));
        }
        if !block.stack.is_empty() {
            return Err(CompileError::internal(
                "Instruction stack should be empty at end of function",
                position,
            ));
        }
        Ok(block.result)
    }

    fn expect_terminator(
        &self,
        block: &Block<'_>,
        found: Terminator,
        position: usize,
    ) -> CompileResult<()> {
        if block.terminator == found {
            Ok(())
        } else {
            Err(CompileError::internal(
                format!("Unexpected end of {:?}", found),
                position,
            ))
        }
    }

    /// Advance onto the opening operation of a nested sequence
    fn expect_next(
        cursor: &mut Cursor<'c>,
        expected: &OperationKind,
        message: &str,
        position: usize,
    ) -> CompileResult<()> {
        let found = cursor.next() && cursor.current().map(|op| &op.kind) == Some(expected);
        if found {
            Ok(())
        } else {
            Err(CompileError::internal(message, position))
        }
    }

    fn binary(&mut self, block: &mut Block<'_>, op: BinaryOperator, position: usize) -> CompileResult<()> {
        let right = block.pop(position)?;
        let left = block.pop(position)?;
        let left_type = left.operand_type(position)?;
        let right_type = right.operand_type(position)?;
        let ty = left_type.binary(op, right_type).map_err(|_| {
            CompileError::new(
                codes::types::OPERATOR_NOT_DEFINED,
                format!(
                    "Operator {} not defined on {} and {}",
                    op.symbol(),
                    left_type,
                    right_type
                ),
                position,
            )
        })?;

        let (a, b) = (left.read(), right.read());
        let both_vectors = left_type.is_vector() && right_type.is_vector();
        let code = if ty.is_vector() || both_vectors {
            vector_operation(op, both_vectors, &a, &b, position)?
        } else if op == BinaryOperator::Divide && ty.is_int() {
            format!("Math.floor(({}/{}))", a, b)
        } else {
            format!("({}{}{})", a, op.symbol(), b)
        };
        block.push(StackElement::value(code, ty), position)
    }

    fn unary(&mut self, block: &mut Block<'_>, op: UnaryOperator, position: usize) -> CompileResult<()> {
        let operand = block.pop(position)?;
        let operand_type = operand.operand_type(position)?;
        let ty = operand_type.unary(op).map_err(|_| {
            CompileError::new(
                codes::types::OPERATOR_NOT_DEFINED,
                format!("Operator {} not defined on {}", op.symbol(), operand_type),
                position,
            )
        })?;

        let code = match (ty.is_vector(), op) {
            (true, UnaryOperator::Plus) => operand.read(),
            (true, UnaryOperator::Minus) => format!("{}.negate({})", VECTOR, operand.read()),
            (true, _) => {
                return Err(CompileError::internal(
                    format!("Operator {} has no vector form", op.symbol()),
                    position,
                ))
            }
            (false, _) => format!("({}{})", op.symbol(), operand.read()),
        };
        block.push(StackElement::value(code, ty), position)
    }

    fn assign(
        &mut self,
        block: &mut Block<'_>,
        op: Option<BinaryOperator>,
        position: usize,
    ) -> CompileResult<()> {
        let target = block.pop(position)?;
        let value = block.pop(position)?;
        if !target.is_variable && !target.is_property {
            return Err(CompileError::new(
                codes::compile::INVALID_ASSIGNMENT_TARGET,
                "Cannot assign a value to non-variable/non-property",
                position,
            ));
        }
        let target_type = target.operand_type(position)?;
        let value_type = value.operand_type(position)?;

        let result_type = match op {
            None => value_type.clone(),
            Some(op) => target_type.binary(op, value_type).map_err(|_| {
                CompileError::new(
                    codes::types::OPERATOR_NOT_DEFINED,
                    format!(
                        "Operator {}= not defined on {} and {}",
                        op.symbol(),
                        target_type,
                        value_type
                    ),
                    position,
                )
            })?,
        };
        if !result_type.can_cast_to(target_type) {
            return Err(CompileError::new(
                codes::types::INCOMPATIBLE_TYPES,
                format!("Cannot cast {} to {}", result_type, target_type),
                position,
            ));
        }

        let raw = target.raw();
        let assigned = value.read();
        let code = match op {
            None if target.is_property => format!("{}({})", raw, assigned),
            None => format!("({}={})", raw, assigned),
            Some(op) if target.is_property => {
                // The object expression is evaluated once; the temporary is
                // declared at the top of the function
                let (object, property) = raw.rsplit_once('.').ok_or_else(|| {
                    CompileError::internal(format!("Malformed property access: {}", raw), position)
                })?;
                let temporary = format!("{}{}", TEMP_PREFIX, self.temporaries);
                self.temporaries += 1;
                let code = format!(
                    "({t}={}, {t}.{p}({t}.{p}(){}{}))",
                    object,
                    op.symbol(),
                    assigned,
                    t = temporary,
                    p = property
                );
                self.hoisted.push(temporary);
                code
            }
            Some(op) => {
                let current = target.read();
                if result_type.is_vector() {
                    let expression = vector_operation(op, false, &current, &assigned, position)?;
                    format!("({}={})", raw, expression)
                } else if op == BinaryOperator::Divide && result_type.is_int() {
                    format!("({}=Math.floor({}/{}))", raw, current, assigned)
                } else {
                    format!("({}={}{}{})", raw, current, op.symbol(), assigned)
                }
            }
        };
        block.push(StackElement::value(code, result_type), position)
    }

    /// `++` and `--`, prefix or suffix
    fn step(&mut self, block: &mut Block<'_>, symbol: &str, prefix: bool, position: usize) -> CompileResult<()> {
        let target = block.pop(position)?;
        let verb = if symbol == "++" { "increment" } else { "decrement" };
        let message = if target.is_property {
            Some(format!("Cannot {} properties", verb))
        } else if !target.is_variable {
            Some(format!("Cannot {} a non-variable", verb))
        } else if !target.ty.as_ref().is_some_and(Type::is_int) {
            Some(format!("Cannot {} a non-integer variable", verb))
        } else {
            None
        };
        if let Some(message) = message {
            return Err(CompileError::new(
                codes::compile::INVALID_ASSIGNMENT_TARGET,
                message,
                position,
            ));
        }

        let ty = target.operand_type(position)?.clone();
        let code = if prefix {
            format!("({}{})", symbol, target.raw())
        } else {
            format!("({}{})", target.raw(), symbol)
        };
        block.push(StackElement::value(code, ty), position)
    }

    fn property_access(&mut self, block: &mut Block<'_>, name: &str, position: usize) -> CompileResult<()> {
        let object = block.pop(position)?;
        let object_type = object.operand_type(position)?;
        let ty = object_type.property(name).map_err(|_| {
            CompileError::new(
                codes::types::OPERATOR_NOT_DEFINED,
                format!("Property {} is not defined on {}", name, object_type),
                position,
            )
        })?;
        let element = if object_type.is_struct() {
            StackElement::variable(format!("{}.{}", object.read(), name), ty)
        } else {
            StackElement::property(format!("{}.prop_{}", object.read(), name), ty)
        };
        block.push(element, position)
    }

    fn index(&mut self, block: &mut Block<'_>, position: usize) -> CompileResult<()> {
        let index = block.pop(position)?;
        let object = block.pop(position)?;
        let object_type = object.operand_type(position)?;
        let index_type = index.operand_type(position)?;
        let ty = object_type.index(index_type).map_err(|_| {
            CompileError::new(
                codes::types::OPERATOR_NOT_DEFINED,
                format!("Cannot index {} using {}", object_type, index_type),
                position,
            )
        })?;
        let element = if *object_type == Type::String {
            StackElement::value(format!("{}.charCodeAt({})", object.read(), index.read()), ty)
        } else {
            StackElement::variable(format!("{}[{}]", object.read(), index.read()), ty)
        };
        block.push(element, position)
    }

    fn call(&mut self, block: &mut Block<'_>, count: usize, position: usize) -> CompileResult<()> {
        let arguments = block.pop_many(count, position)?;
        let callee = block.pop(position)?;
        let path = match &callee.ty {
            Some(Type::Function(path)) => path,
            _ => {
                return Err(CompileError::new(
                    codes::types::INCOMPATIBLE_TYPES,
                    "Only functions can be called",
                    position,
                ))
            }
        };
        let argument_types = arguments
            .iter()
            .map(|argument| argument.operand_type(position).cloned())
            .collect::<CompileResult<Vec<_>>>()?;

        let imports = self.scopes.imports(block.scope);
        let signature = self
            .tree
            .resolve_function(&self.function.signature.namespace, path, &imports, &argument_types)
            .ok_or_else(|| {
                CompileError::new(
                    codes::compile::UNRESOLVED_FUNCTION,
                    format!("Could not resolve function {}", path.join("::")),
                    position,
                )
            })?;

        let arguments = arguments.iter().map(copied).collect::<Vec<_>>().join(",");
        let code = if signature.is_builtin
            && signature.namespace.is_empty()
            && signature.name == LED_ACCESSOR_NAME
        {
            format!("{}({})", LED, arguments)
        } else {
            let hook = if signature.is_builtin { BUILTIN } else { USER };
            let mut address: Vec<String> = signature
                .namespace
                .iter()
                .map(|segment| format!("\"{}\"", segment))
                .collect();
            address.push(format!("\"{}\"", signature.key()));
            format!("{}({})({})", hook, address.join(","), arguments)
        };
        block.push(StackElement::call(code, signature.return_type.clone()), position)
    }

    fn if_statement(
        &mut self,
        cursor: &mut Cursor<'c>,
        block: &mut Block<'_>,
        position: usize,
        out: &mut String,
    ) -> CompileResult<()> {
        let condition = block.pop(position)?;
        if condition.ty != Some(Type::Bool) {
            return Err(CompileError::new(
                codes::types::INVALID_CONDITION,
                "If-statement expects a boolean value as its condition",
                position,
            ));
        }
        line(out, block.indent, &format!("if ({}) {{", condition.read()));

        let indent = deeper(block.indent);
        Self::expect_next(cursor, &OperationKind::BeginScope, "Expected scope after if-statement", position)?;
        let child = self.scopes.child(block.scope);
        let then_branch =
            self.compile_scope(cursor, Block::new(child, &indent, Terminator::Scope), out)?;
        line(out, block.indent, "}");
        block.result.merge_variables(&then_branch);

        if !cursor.next() {
            return Err(CompileError::internal("Unexpected end of operations after if-statement", position));
        }
        let else_branch = match cursor.current().map(|op| &op.kind) {
            Some(OperationKind::NoOperation) => None,
            Some(OperationKind::BeginScope) => {
                line(out, block.indent, "else {");
                let child = self.scopes.child(block.scope);
                let inner =
                    self.compile_scope(cursor, Block::new(child, &indent, Terminator::Scope), out)?;
                line(out, block.indent, "}");
                block.result.merge_variables(&inner);
                Some(inner)
            }
            other => {
                let found = other.map(ToString::to_string).unwrap_or_default();
                return Err(CompileError::internal(
                    format!("Unexpected operation after if-statement: {}", found),
                    position,
                ));
            }
        };

        let both_return = then_branch.return_type.is_some()
            && else_branch.is_some_and(|branch| branch.return_type.is_some());
        if both_return && block.result.return_type.is_none() {
            block.result.return_type = self.function.signature.return_type.clone();
        }
        Ok(())
    }

    /// Compiles the operation block the cursor sits on and returns the
    /// condition code, or `None` for an empty block
    fn condition(
        &mut self,
        cursor: &mut Cursor<'c>,
        block: &mut Block<'_>,
        message: &str,
        position: usize,
        out: &mut String,
    ) -> CompileResult<Option<String>> {
        let result = self.compile_scope(cursor, Block::new(block.scope, "", Terminator::OperationBlock), out)?;
        block.result.merge_variables(&result);
        match result.value {
            None => Ok(None),
            Some(value) if value.ty == Some(Type::Bool) => Ok(Some(value.read())),
            Some(_) => Err(CompileError::new(
                codes::types::INVALID_CONDITION,
                message,
                position,
            )),
        }
    }

    fn for_statement(
        &mut self,
        cursor: &mut Cursor<'c>,
        block: &mut Block<'_>,
        position: usize,
        out: &mut String,
    ) -> CompileResult<()> {
        // Header and body share one scope
        let body_scope = self.scopes.child(block.scope);
        out.push_str(&format!("{}for (", block.indent));

        Self::expect_next(cursor, &OperationKind::BeginScope, "Expected scope after for-statement", position)?;
        let init = self.compile_scope(cursor, Block::for_init(body_scope), out)?;
        block.result.merge_variables(&init);
        out.push_str("; ");

        let mut header = Block::new(body_scope, "", Terminator::OperationBlock);
        Self::expect_next(
            cursor,
            &OperationKind::BeginOpBlock,
            "Expected operation block after for-statement",
            position,
        )?;
        let condition = self.condition(
            cursor,
            &mut header,
            "Expected boolean value for for-condition",
            position,
            out,
        )?;
        out.push_str(&condition.unwrap_or_default());
        out.push_str("; ");

        Self::expect_next(
            cursor,
            &OperationKind::BeginOpBlock,
            "Expected operation block after for-statement",
            position,
        )?;
        let step = self.compile_scope(cursor, Block::new(body_scope, "", Terminator::OperationBlock), out)?;
        header.result.merge_variables(&step);
        if let Some(value) = step.value {
            out.push_str(&value.discarded());
        }
        out.push_str(") {\n");
        block.result.merge_variables(&header.result);

        Self::expect_next(cursor, &OperationKind::BeginScope, "Expected scope after for-statement", position)?;
        let indent = deeper(block.indent);
        let body = self.compile_scope(cursor, Block::new(body_scope, &indent, Terminator::Scope), out)?;
        line(out, block.indent, "}");
        block.result.merge_variables(&body);
        Ok(())
    }

    fn while_statement(
        &mut self,
        cursor: &mut Cursor<'c>,
        block: &mut Block<'_>,
        position: usize,
        out: &mut String,
    ) -> CompileResult<()> {
        out.push_str(&format!("{}while (", block.indent));
        Self::expect_next(
            cursor,
            &OperationKind::BeginOpBlock,
            "Expected operation block after while-statement",
            position,
        )?;
        let condition = self
            .condition(cursor, block, "Expected boolean value for while-condition", position, out)?
            .ok_or_else(|| CompileError::internal("Missing while-condition", position))?;
        out.push_str(&format!("{}) {{\n", condition));

        Self::expect_next(cursor, &OperationKind::BeginScope, "Expected scope after while-statement", position)?;
        let child = self.scopes.child(block.scope);
        let indent = deeper(block.indent);
        let body = self.compile_scope(cursor, Block::new(child, &indent, Terminator::Scope), out)?;
        line(out, block.indent, "}");
        block.result.merge_variables(&body);
        Ok(())
    }

    fn do_while_statement(
        &mut self,
        cursor: &mut Cursor<'c>,
        block: &mut Block<'_>,
        position: usize,
        out: &mut String,
    ) -> CompileResult<()> {
        line(out, block.indent, "do {");
        Self::expect_next(cursor, &OperationKind::BeginScope, "Expected scope after do-statement", position)?;
        let child = self.scopes.child(block.scope);
        let indent = deeper(block.indent);
        let body = self.compile_scope(cursor, Block::new(child, &indent, Terminator::Scope), out)?;
        line(out, block.indent, "}");
        block.result.merge_variables(&body);

        out.push_str(&format!("{}while (", block.indent));
        Self::expect_next(
            cursor,
            &OperationKind::BeginOpBlock,
            "Expected operation block after do-statement",
            position,
        )?;
        let condition = self
            .condition(cursor, block, "Expected boolean value for do-condition", position, out)?
            .ok_or_else(|| CompileError::internal("Missing do-condition", position))?;
        out.push_str(&format!("{});\n", condition));
        Ok(())
    }

    fn constant(&self, constant: &Constant, position: usize) -> CompileResult<StackElement> {
        match constant {
            Constant::Bool(value) => Ok(StackElement::value(value.to_string(), Type::Bool)),
            Constant::String(text) => {
                let literal = serde_json::to_string(text)
                    .map_err(|error| CompileError::internal(error.to_string(), position))?;
                Ok(StackElement::value(literal, Type::String))
            }
            Constant::Int(value) => {
                let ty = self.resolve_type(&integer_type_name(value), position)?;
                Ok(StackElement::value(value.target_text(), ty))
            }
            Constant::Float(value) => {
                let ty = self.resolve_type(&float_type_name(value), position)?;
                Ok(StackElement::value(value.target_text(), ty))
            }
        }
    }

    fn resolve_type(&self, name: &str, position: usize) -> CompileResult<Type> {
        self.types.lookup(name).cloned().map_err(|_| {
            CompileError::new(
                codes::types::UNRESOLVED_TYPE,
                format!("Cannot resolve type: {}", name),
                position,
            )
        })
    }

    fn make_list(&mut self, block: &mut Block<'_>, count: usize, position: usize) -> CompileResult<()> {
        let elements = block.pop_many(count, position)?;
        let mut common: Option<Type> = None;
        for element in &elements {
            let ty = element.operand_type(position)?;
            common = match common {
                None => Some(ty.clone()),
                Some(current) if current.can_cast_to(ty) => Some(ty.clone()),
                Some(current) if ty.can_cast_to(&current) => Some(current),
                Some(_) => {
                    return Err(CompileError::new(
                        codes::types::INCOMPATIBLE_TYPES,
                        "Incompatible types in array",
                        position,
                    ))
                }
            };
        }
        let element_type = common.ok_or_else(|| {
            CompileError::new(
                codes::types::INCOMPATIBLE_TYPES,
                "Cannot infer the element type of an empty list",
                position,
            )
        })?;
        let code = format!("[{}]", join_read(&elements));
        block.push(StackElement::value(code, Type::array_of(element_type)), position)
    }

    fn make_vector(&mut self, block: &mut Block<'_>, count: usize, position: usize) -> CompileResult<()> {
        let elements = block.pop_many(count, position)?;
        let float32 = Type::float(32);
        for element in &elements {
            if !element.operand_type(position)?.can_cast_to(&float32) {
                return Err(CompileError::new(
                    codes::types::INCOMPATIBLE_TYPES,
                    "Vector element must be floating point numbers",
                    position,
                ));
            }
        }
        let code = format!("[{}]", join_read(&elements));
        let dimension = u32::try_from(count)
            .map_err(|_| CompileError::internal("Vector dimension out of range", position))?;
        block.push(StackElement::value(code, Type::Vector(dimension)), position)
    }

    fn create_variable(
        &mut self,
        block: &mut Block<'_>,
        ty: &Type,
        name: &str,
        has_value: bool,
        position: usize,
        out: &mut String,
    ) -> CompileResult<()> {
        if self.scopes.has_variable(block.scope, name) {
            return Err(CompileError::new(
                codes::compile::DUPLICATE_VARIABLE,
                format!("A variable with this identifier already exists: {}", name),
                position,
            ));
        }

        let mut code = format!("var {}", name);
        if has_value {
            let value = block.pop(position)?;
            let value_type = value.operand_type(position)?;
            if !value_type.can_cast_to(ty) {
                return Err(CompileError::new(
                    codes::types::INCOMPATIBLE_TYPES,
                    format!("Cannot convert {} to {}", value_type, ty),
                    position,
                ));
            }
            code.push('=');
            code.push_str(&copied(&value));
        } else if let Type::Struct(definition) = ty {
            code.push('=');
            code.push_str(&default_struct(definition));
        }

        self.scopes.declare(block.scope, name, ty.clone());
        block.result.used.add(name, ty.clone());
        block.result.created.add(name, ty.clone());
        block.statement(out, &code);
        Ok(())
    }

    fn return_value(&mut self, block: &mut Block<'_>, position: usize, out: &mut String) -> CompileResult<()> {
        if block.stack.len() != 1 {
            return Err(CompileError::internal(
                "Instruction stack should contain exactly one element at RETURN operation",
                position,
            ));
        }
        let value = block.pop(position)?;
        let declared = self.function.signature.return_type.as_ref().ok_or_else(|| {
            CompileError::new(
                codes::compile::RETURN_TYPE_MISMATCH,
                "The function does not allow values to be returned",
                position,
            )
        })?;
        let value_type = value.operand_type(position)?;
        if !value_type.can_cast_to(declared) {
            return Err(CompileError::new(
                codes::types::INCOMPATIBLE_TYPES,
                format!("Cannot convert {} to {}", value_type, declared),
                position,
            ));
        }
        line(out, block.indent, &format!("return {};", value.read()));
        if block.result.return_type.is_none() {
            block.result.return_type = Some(value_type.clone());
        }
        Ok(())
    }

    /// `async(q) body`: the body becomes a closure over copies of the
    /// variables it reads from enclosing scopes.
    fn async_statement(
        &mut self,
        cursor: &mut Cursor<'c>,
        block: &mut Block<'_>,
        position: usize,
        out: &mut String,
    ) -> CompileResult<()> {
        let queue = block.pop(position)?;
        require_async_id(&queue, position)?;

        Self::expect_next(cursor, &OperationKind::BeginScope, "Expected scope after async-statement", position)?;
        let child = self.scopes.child(block.scope);
        let indent = deeper(block.indent);
        let mut body = String::new();
        let inner = self.compile_scope(cursor, Block::new(child, &indent, Terminator::Scope), &mut body)?;

        let captured = inner.used.difference(&inner.created);
        let names = captured
            .iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", ");
        let values = captured
            .iter()
            .map(|(name, ty)| {
                if ty.is_struct() {
                    format!("{}({})", COPY, name)
                } else {
                    name.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        line(
            out,
            block.indent,
            &format!(
                "{}({}, (function({}) {{ return function() {{",
                ASYNC,
                queue.read(),
                names
            ),
        );
        out.push_str(&body);
        line(out, block.indent, &format!("}}; }})({}));", values));

        block.result.used.extend(&captured);
        Ok(())
    }

    fn async_wait(&mut self, block: &mut Block<'_>, position: usize, out: &mut String) -> CompileResult<()> {
        let time = block.pop(position)?;
        let queue = block.pop(position)?;
        require_async_id(&queue, position)?;
        if !time.operand_type(position)?.can_cast_to(&Type::float(32)) {
            return Err(CompileError::new(
                codes::compile::INVALID_ASYNC_OPERAND,
                "Async waiting time must be a number (float/int)",
                position,
            ));
        }
        line(
            out,
            block.indent,
            &format!("{}({}, {});", ASYNC, queue.read(), time.read()),
        );
        Ok(())
    }

    fn sync(&mut self, block: &mut Block<'_>, completed: bool, position: usize, out: &mut String) -> CompileResult<()> {
        let queue = block.pop(position)?;
        if !queue.ty.as_ref().is_some_and(Type::is_int) {
            return Err(CompileError::new(
                codes::compile::INVALID_ASYNC_OPERAND,
                "Async identifier must be an integer",
                position,
            ));
        }
        line(
            out,
            block.indent,
            &format!("{}({}, {});", SYNC, queue.read(), completed),
        );
        Ok(())
    }
}

fn require_async_id(queue: &StackElement, position: usize) -> CompileResult<()> {
    if queue.operand_type(position)?.can_cast_to(&Type::int(32)) {
        Ok(())
    } else {
        Err(CompileError::new(
            codes::compile::INVALID_ASYNC_OPERAND,
            "Async identifier must be an integer",
            position,
        ))
    }
}

fn vector_operation(
    op: BinaryOperator,
    both_vectors: bool,
    a: &str,
    b: &str,
    position: usize,
) -> CompileResult<String> {
    let method = match op {
        BinaryOperator::Plus => "plus",
        BinaryOperator::Minus => "minus",
        BinaryOperator::Times if both_vectors => "scalarProduct",
        BinaryOperator::Times => "times",
        BinaryOperator::Divide => "divide",
        BinaryOperator::Equal => "equal",
        BinaryOperator::NotEqual => "notEqual",
        _ => {
            return Err(CompileError::internal(
                format!("Operator {} has no vector form", op.symbol()),
                position,
            ))
        }
    };
    Ok(format!("{}.{}({},{})", VECTOR, method, a, b))
}

/// Struct values are deep-copied whenever they are bound to new storage
fn copied(element: &StackElement) -> String {
    if element.ty.as_ref().is_some_and(Type::is_struct) {
        format!("{}({})", COPY, element.read())
    } else {
        element.read()
    }
}

fn join_read(elements: &[StackElement]) -> String {
    elements
        .iter()
        .map(StackElement::read)
        .collect::<Vec<_>>()
        .join(",")
}

/// `{inner:{...},field:null}`; nested structs come first
fn default_struct(definition: &StructType) -> String {
    let nested = definition.fields.iter().filter_map(|(name, ty)| match ty {
        Type::Struct(inner) => Some(format!("{}:{}", name, default_struct(inner))),
        _ => None,
    });
    let plain = definition
        .fields
        .iter()
        .filter(|(_, ty)| !ty.is_struct())
        .map(|(name, _)| format!("{}:null", name));
    format!("{{{}}}", nested.chain(plain).collect::<Vec<_>>().join(","))
}

fn integer_type_name(value: &RawInt) -> String {
    match (value.unsigned, value.bits) {
        (false, 0) => DEFAULT_INT_TYPE.to_string(),
        (true, 0) => DEFAULT_UINT_TYPE.to_string(),
        (true, bits) => format!("uint{}", bits),
        (false, bits) => format!("int{}", bits),
    }
}

fn float_type_name(value: &RawFloat) -> String {
    match value.bits {
        0 => DEFAULT_FLOAT_TYPE.to_string(),
        bits => format!("float{}", bits),
    }
}
