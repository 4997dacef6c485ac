//! Lowers function-body statements and expressions into operation sequences
//!
//! Expressions come out in postfix order: operands first, then the operator
//! that consumes them. Statements that introduce structure (scopes, branches,
//! loops) emit marker operations which the code generator matches up again.
//!
//! Declarations are recognized speculatively: the cursor takes a checkpoint,
//! tries to read `type[]* name`, and reverts to parse an expression when the
//! words turn out not to name a type.

use super::error::{SyntaxError, SyntaxResult};
use crate::config::constants::compile_time::syntax::{
    MAX_EXPRESSION_DEPTH, MAX_FUNCTION_PARAMETERS, MAX_STATEMENT_DEPTH,
};
use crate::ir::{Constant, OperationCollection, OperationKind};
use crate::lexical::LexerError;
use crate::tokens::{TokenCursor, TokenKind, TokenSource, TokenValue};
use crate::types::{BinaryOperator, Type, TypeTable, UnaryOperator, PATH_SEPARATOR};

type OperatorTable = &'static [(TokenKind, BinaryOperator)];

// Binary precedence levels, loosest first
const LOGICAL_OR: OperatorTable = &[(TokenKind::LogicalOr, BinaryOperator::LogicalOr)];
const LOGICAL_AND: OperatorTable = &[(TokenKind::LogicalAnd, BinaryOperator::LogicalAnd)];
const BITWISE_OR: OperatorTable = &[(TokenKind::BitwiseOr, BinaryOperator::BitwiseOr)];
const BITWISE_XOR: OperatorTable = &[(TokenKind::BitwiseXor, BinaryOperator::BitwiseXor)];
const BITWISE_AND: OperatorTable = &[(TokenKind::BitwiseAnd, BinaryOperator::BitwiseAnd)];
const EQUALITY: OperatorTable = &[
    (TokenKind::Equal, BinaryOperator::Equal),
    (TokenKind::NotEqual, BinaryOperator::NotEqual),
];
const RELATIONAL: OperatorTable = &[
    (TokenKind::LessThan, BinaryOperator::LessThan),
    (TokenKind::LessThanEqual, BinaryOperator::LessThanEqual),
    (TokenKind::MoreThan, BinaryOperator::MoreThan),
    (TokenKind::MoreThanEqual, BinaryOperator::MoreThanEqual),
];
const SHIFT: OperatorTable = &[
    (TokenKind::LeftShift, BinaryOperator::LeftShift),
    (TokenKind::RightShift, BinaryOperator::RightShift),
];
const ADDITIVE: OperatorTable = &[
    (TokenKind::Plus, BinaryOperator::Plus),
    (TokenKind::Minus, BinaryOperator::Minus),
];
const MULTIPLICATIVE: OperatorTable = &[
    (TokenKind::Times, BinaryOperator::Times),
    (TokenKind::Divide, BinaryOperator::Divide),
    (TokenKind::Modulo, BinaryOperator::Modulo),
];

fn binary_operator(table: OperatorTable, kind: TokenKind) -> Option<BinaryOperator> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map(|(_, operator)| *operator)
}

/// `Some(None)` for plain `=`, `Some(Some(op))` for compound assignment
fn assignment_operator(kind: TokenKind) -> Option<Option<BinaryOperator>> {
    let operator = match kind {
        TokenKind::Assign => None,
        TokenKind::AssignPlus => Some(BinaryOperator::Plus),
        TokenKind::AssignMinus => Some(BinaryOperator::Minus),
        TokenKind::AssignTimes => Some(BinaryOperator::Times),
        TokenKind::AssignDivide => Some(BinaryOperator::Divide),
        TokenKind::AssignModulo => Some(BinaryOperator::Modulo),
        TokenKind::AssignLeftShift => Some(BinaryOperator::LeftShift),
        TokenKind::AssignRightShift => Some(BinaryOperator::RightShift),
        TokenKind::AssignBitwiseAnd => Some(BinaryOperator::BitwiseAnd),
        TokenKind::AssignBitwiseOr => Some(BinaryOperator::BitwiseOr),
        TokenKind::AssignBitwiseXor => Some(BinaryOperator::BitwiseXor),
        _ => return None,
    };
    Some(operator)
}

/// Read `name (:: name)*`. Returns the segments and whether the last one is a
/// reserved (`$`) name; reserved names are only accepted when `allow_reserved`
/// is set, and never before a `::`.
pub(super) fn read_name_path<S>(
    cursor: &mut TokenCursor<S>,
    allow_reserved: bool,
) -> SyntaxResult<(Vec<String>, bool)>
where
    S: TokenSource<Error = LexerError>,
{
    let mut path = Vec::new();
    let mut reserved_at: Option<usize> = None;

    loop {
        if let Some(offset) = reserved_at {
            return Err(SyntaxError::invalid_name(
                "Illegal namespace name: '$' characters not allowed",
                offset,
            ));
        }

        let token = cursor.current();
        let reserved = token.is(TokenKind::ReservedName);
        let name = match token.text() {
            Some(text) if token.is(TokenKind::Name) || (allow_reserved && reserved) => {
                text.to_string()
            }
            _ => {
                return Err(SyntaxError::expected(
                    "Expected namespace name",
                    token.position,
                ))
            }
        };
        reserved_at = reserved.then_some(token.position);
        path.push(name);

        cursor.advance()?;
        if !cursor.is(TokenKind::DoubleColon) {
            return Ok((path, reserved_at.is_some()));
        }
        cursor.advance()?;
    }
}

/// Statement and expression reader for one function body
pub struct Interpreter<'a, S: TokenSource<Error = LexerError>> {
    cursor: &'a mut TokenCursor<S>,
    types: &'a TypeTable,
    /// Namespace the function is declared in, for type lookup
    namespace: &'a [String],
    expression_depth: usize,
    statement_depth: usize,
}

impl<'a, S: TokenSource<Error = LexerError>> Interpreter<'a, S> {
    pub fn new(
        cursor: &'a mut TokenCursor<S>,
        types: &'a TypeTable,
        namespace: &'a [String],
    ) -> Self {
        Self {
            cursor,
            types,
            namespace,
            expression_depth: 0,
            statement_depth: 0,
        }
    }

    /// Whether the cursor sits on the `}` closing the body, or ran out of input
    pub fn at_body_end(&self) -> bool {
        self.cursor
            .is_any(&[TokenKind::CurlyBracketRight, TokenKind::EndOfDocument])
    }

    fn position(&self) -> usize {
        self.cursor.position()
    }

    fn advance(&mut self) -> SyntaxResult<()> {
        self.cursor.advance()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> SyntaxResult<()> {
        if !self.cursor.is(kind) {
            return Err(SyntaxError::expected(message, self.position()));
        }
        self.advance()
    }

    fn expect_word(&mut self, word: &str, message: &str) -> SyntaxResult<()> {
        if !self.cursor.is_word(word) {
            return Err(SyntaxError::expected(message, self.position()));
        }
        self.advance()
    }

    fn nested_statement(
        &mut self,
        offset: usize,
        parse: impl FnOnce(&mut Self) -> SyntaxResult<OperationCollection>,
    ) -> SyntaxResult<OperationCollection> {
        if self.statement_depth >= MAX_STATEMENT_DEPTH {
            return Err(SyntaxError::limit_exceeded(
                "nested statements",
                MAX_STATEMENT_DEPTH,
                offset,
            ));
        }
        self.statement_depth += 1;
        let result = parse(self);
        self.statement_depth -= 1;
        result
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Read one statement: a braced block, a control statement or a
    /// `;`-terminated statement
    pub fn statement(&mut self) -> SyntaxResult<OperationCollection> {
        if self.cursor.is(TokenKind::CurlyBracketLeft) {
            self.block()
        } else {
            self.control_statement()
        }
    }

    fn block(&mut self) -> SyntaxResult<OperationCollection> {
        let start = self.position();
        self.nested_statement(start, |this| {
            this.advance()?;
            let mut operations = OperationCollection::single(OperationKind::BeginScope, start);
            while !this.cursor.is(TokenKind::CurlyBracketRight) {
                if this.cursor.is(TokenKind::EndOfDocument) {
                    return Err(SyntaxError::UnexpectedEnd {
                        offset: this.position(),
                    });
                }
                operations.append_all(this.statement()?);
            }
            operations.push(OperationKind::EndScope, this.position());
            this.advance()?;
            Ok(operations)
        })
    }

    /// Body of a control statement. A single statement without braces still
    /// gets its own scope.
    fn scoped_body(&mut self) -> SyntaxResult<OperationCollection> {
        if self.cursor.is(TokenKind::CurlyBracketLeft) {
            return self.block();
        }
        let start = self.position();
        self.nested_statement(start, |this| {
            let mut operations = OperationCollection::single(OperationKind::BeginScope, start);
            operations.append_all(this.control_statement()?);
            operations.push(OperationKind::EndScope, start);
            Ok(operations)
        })
    }

    fn control_statement(&mut self) -> SyntaxResult<OperationCollection> {
        if self.cursor.is_word("if") {
            self.if_statement()
        } else if self.cursor.is_word("for") {
            self.for_statement()
        } else if self.cursor.is_word("while") {
            self.while_statement()
        } else if self.cursor.is_word("do") {
            self.do_statement("while", "Expected 'while' statement.")
        } else if self.cursor.is_word("repeat") {
            self.do_statement("until", "Expected 'until' statement.")
        } else {
            self.terminated_statement()
        }
    }

    fn terminated_statement(&mut self) -> SyntaxResult<OperationCollection> {
        if self.cursor.is_word("return") {
            self.return_statement()
        } else if self.cursor.is_word("import") {
            self.import_statement()
        } else if self.cursor.is_word("async") {
            self.async_statement()
        } else if self.cursor.is_word("sync") {
            self.sync_statement()
        } else {
            self.simple_statement()
        }
    }

    /// Declaration or expression followed by `;`. A value left by an
    /// expression is discarded.
    fn simple_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let mut operations = self.declaration_or_expression()?;
        let declares = matches!(
            operations.last().map(|op| &op.kind),
            Some(OperationKind::CreateVariable { .. })
        );
        if !declares {
            operations.push(OperationKind::Pop, self.position());
        }
        self.expect(TokenKind::EndOfInstruction, "Expected ';'")?;
        Ok(operations)
    }

    fn declaration_or_expression(&mut self) -> SyntaxResult<OperationCollection> {
        if !self.cursor.is(TokenKind::Name) {
            return self.expression();
        }

        self.cursor.checkpoint();
        match self.declaration_header()? {
            Some((ty, name, position)) => {
                self.cursor.commit();
                self.declaration(ty, name, position)
            }
            None => {
                self.cursor.revert()?;
                self.expression()
            }
        }
    }

    /// `type[]* name`, or `None` when the tokens do not start a declaration
    fn declaration_header(&mut self) -> SyntaxResult<Option<(Type, String, usize)>> {
        let position = self.position();
        let path = match read_name_path(&mut *self.cursor, false) {
            Ok((path, _)) => path,
            Err(SyntaxError::Lexical(error)) => return Err(error.into()),
            Err(_) => return Ok(None),
        };
        let Some(base) = self
            .types
            .resolve_in(&path.join(PATH_SEPARATOR), self.namespace)
        else {
            return Ok(None);
        };

        let mut ty = base.clone();
        while self.cursor.is(TokenKind::SquareBracketLeft) {
            self.advance()?;
            if !self.cursor.is(TokenKind::SquareBracketRight) {
                return Ok(None);
            }
            self.advance()?;
            ty = Type::array_of(ty);
        }

        let name = match self.cursor.current() {
            token if token.is(TokenKind::Name) => token.text().unwrap_or_default().to_string(),
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some((ty, name, position)))
    }

    fn declaration(
        &mut self,
        ty: Type,
        name: String,
        position: usize,
    ) -> SyntaxResult<OperationCollection> {
        let mut operations = if self.cursor.is(TokenKind::EndOfInstruction) {
            OperationCollection::single(OperationKind::LoadUndefined, position)
        } else if self.cursor.is(TokenKind::Assign) {
            self.advance()?;
            self.expression()?
        } else {
            return Err(SyntaxError::unexpected(self.cursor.current()));
        };
        operations.push(OperationKind::CreateVariable { ty, name }, position);
        Ok(operations)
    }

    fn return_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        let operations = if self.cursor.is(TokenKind::EndOfInstruction) {
            OperationCollection::single(OperationKind::Return, position)
        } else {
            let mut operations = self.expression()?;
            operations.push(OperationKind::ReturnValue, position);
            operations
        };
        self.expect(TokenKind::EndOfInstruction, "Expected ';'")?;
        Ok(operations)
    }

    fn import_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        let (path, _) = read_name_path(&mut *self.cursor, false)?;
        self.expect(TokenKind::EndOfInstruction, "Expected ';'")?;
        Ok(OperationCollection::single(
            OperationKind::Import(path),
            position,
        ))
    }

    /// `async(id) body` or `async(id) wait time;`
    fn async_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        self.expect(TokenKind::BracketLeft, "Expected '(' after 'async'.")?;
        let mut operations = self.expression()?;
        self.expect(TokenKind::BracketRight, "Expected ')' after 'async('.")?;

        if self.cursor.is_word("wait") {
            self.advance()?;
            operations.append_all(self.expression()?);
            self.expect(TokenKind::EndOfInstruction, "Expected ';'")?;
            operations.push(OperationKind::AsyncWait, position);
        } else {
            operations.push(OperationKind::Async, position);
            operations.append_all(self.scoped_body()?);
        }
        Ok(operations)
    }

    /// `sync(id) end;` or `sync(id) abort;`
    fn sync_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        self.expect(TokenKind::BracketLeft, "Expected '(' after 'sync'.")?;
        let mut operations = self.expression()?;
        self.expect(TokenKind::BracketRight, "Expected ')' after 'sync('.")?;

        let kind = if self.cursor.is_word("end") {
            OperationKind::SyncEnd
        } else if self.cursor.is_word("abort") {
            OperationKind::SyncAbort
        } else {
            return Err(SyntaxError::expected(
                "Expected 'end' or 'abort' after 'sync()'.",
                self.position(),
            ));
        };
        self.advance()?;
        self.expect(TokenKind::EndOfInstruction, "Expected ';'")?;
        operations.push(kind, position);
        Ok(operations)
    }

    fn if_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        self.expect(TokenKind::BracketLeft, "Expected '(' after 'if'.")?;
        let mut operations = self.expression()?;
        self.expect(TokenKind::BracketRight, "Expected ')' after 'if('.")?;

        operations.push(OperationKind::If, position);
        operations.append_all(self.scoped_body()?);
        if self.cursor.is_word("else") {
            self.advance()?;
            operations.append_all(self.scoped_body()?);
        } else {
            operations.push(OperationKind::NoOperation, position);
        }
        Ok(operations)
    }

    fn for_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        self.expect(TokenKind::BracketLeft, "Expected '(' after 'for'.")?;

        let initializer = if self.cursor.is(TokenKind::EndOfInstruction) {
            self.advance()?;
            OperationCollection::new()
        } else {
            self.simple_statement()?
        };
        let condition = if self.cursor.is(TokenKind::EndOfInstruction) {
            OperationCollection::new()
        } else {
            self.expression()?
        };
        self.expect(TokenKind::EndOfInstruction, "Expected ';' in 'for('.")?;
        let step = if self.cursor.is(TokenKind::BracketRight) {
            OperationCollection::new()
        } else {
            self.expression()?
        };
        self.expect(TokenKind::BracketRight, "Expected ')' after 'for('.")?;
        let body = self.scoped_body()?;

        let mut operations = OperationCollection::single(OperationKind::For, position);
        operations.push(OperationKind::BeginScope, position);
        operations.append_all(initializer);
        operations.push(OperationKind::EndScope, position);
        operations.append_all(operation_block(condition, position));
        operations.append_all(operation_block(step, position));
        operations.append_all(body);
        Ok(operations)
    }

    fn while_statement(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        self.expect(TokenKind::BracketLeft, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.expect(TokenKind::BracketRight, "Expected ')' after 'while('.")?;

        let mut operations = OperationCollection::single(OperationKind::While, position);
        operations.append_all(operation_block(condition, position));
        operations.append_all(self.scoped_body()?);
        Ok(operations)
    }

    /// `do body while(cond);` and `repeat body until(cond);`. The `until`
    /// form negates its condition.
    fn do_statement(
        &mut self,
        keyword: &str,
        missing_keyword: &str,
    ) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        let body = self.scoped_body()?;

        self.expect_word(keyword, missing_keyword)?;
        self.expect(
            TokenKind::BracketLeft,
            &format!("Expected '(' after '{}'.", keyword),
        )?;
        let condition_position = self.position();
        let mut condition = self.expression()?;
        if keyword == "until" {
            condition.push(
                OperationKind::Unary(UnaryOperator::LogicalNot),
                condition_position,
            );
        }
        self.expect(
            TokenKind::BracketRight,
            &format!("Expected ')' after '{}('.", keyword),
        )?;
        self.expect(
            TokenKind::EndOfInstruction,
            &format!("Expected ';' after '{}()'.", keyword),
        )?;

        let mut operations = OperationCollection::single(OperationKind::DoWhile, position);
        operations.append_all(body);
        operations.append_all(operation_block(condition, position));
        Ok(operations)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn expression(&mut self) -> SyntaxResult<OperationCollection> {
        if self.expression_depth >= MAX_EXPRESSION_DEPTH {
            return Err(SyntaxError::limit_exceeded(
                "nested expressions",
                MAX_EXPRESSION_DEPTH,
                self.position(),
            ));
        }
        self.expression_depth += 1;
        let result = self.assignment();
        self.expression_depth -= 1;
        result
    }

    /// Right-associative: the value is computed before its target, so
    /// `a = b = c` becomes `c b = a =`
    fn assignment(&mut self) -> SyntaxResult<OperationCollection> {
        let target = self.logical_or()?;
        let Some(operator) = assignment_operator(self.cursor.current().kind) else {
            return Ok(target);
        };
        let position = self.position();
        self.advance()?;

        let mut operations = self.expression()?;
        operations.append_all(target);
        operations.push(OperationKind::Assign(operator), position);
        Ok(operations)
    }

    fn left_associative(
        &mut self,
        operand: fn(&mut Self) -> SyntaxResult<OperationCollection>,
        table: OperatorTable,
    ) -> SyntaxResult<OperationCollection> {
        let mut operations = operand(self)?;
        while let Some(operator) = binary_operator(table, self.cursor.current().kind) {
            let position = self.position();
            self.advance()?;
            operations.append_all(operand(self)?);
            operations.push(OperationKind::Binary(operator), position);
        }
        Ok(operations)
    }

    fn logical_or(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::logical_and, LOGICAL_OR)
    }

    fn logical_and(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::bitwise_or, LOGICAL_AND)
    }

    fn bitwise_or(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::bitwise_xor, BITWISE_OR)
    }

    fn bitwise_xor(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::bitwise_and, BITWISE_XOR)
    }

    fn bitwise_and(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::equality, BITWISE_AND)
    }

    fn equality(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::relational, EQUALITY)
    }

    fn relational(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::shift, RELATIONAL)
    }

    fn shift(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::additive, SHIFT)
    }

    fn additive(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::multiplicative, ADDITIVE)
    }

    fn multiplicative(&mut self) -> SyntaxResult<OperationCollection> {
        self.left_associative(Self::unary, MULTIPLICATIVE)
    }

    /// Prefix operators apply innermost first: `-!x` is `x ! -`
    fn unary(&mut self) -> SyntaxResult<OperationCollection> {
        let mut prefixes = Vec::new();
        loop {
            let kind = match self.cursor.current().kind {
                TokenKind::LogicalNot => OperationKind::Unary(UnaryOperator::LogicalNot),
                TokenKind::BitwiseNot => OperationKind::Unary(UnaryOperator::BitwiseNot),
                TokenKind::Minus => OperationKind::Unary(UnaryOperator::Minus),
                TokenKind::Plus => OperationKind::Unary(UnaryOperator::Plus),
                TokenKind::Increment => OperationKind::Increment { prefix: true },
                TokenKind::Decrement => OperationKind::Decrement { prefix: true },
                _ => break,
            };
            prefixes.push((kind, self.position()));
            self.advance()?;
        }

        let mut operations = self.postfix()?;
        for (kind, position) in prefixes.into_iter().rev() {
            operations.push(kind, position);
        }
        Ok(operations)
    }

    fn postfix(&mut self) -> SyntaxResult<OperationCollection> {
        let mut operations = self.primary()?;
        loop {
            let position = self.position();
            match self.cursor.current().kind {
                TokenKind::Increment => {
                    self.advance()?;
                    operations.push(OperationKind::Increment { prefix: false }, position);
                }
                TokenKind::Decrement => {
                    self.advance()?;
                    operations.push(OperationKind::Decrement { prefix: false }, position);
                }
                TokenKind::Period => {
                    self.advance()?;
                    operations.append_all(self.member(position)?);
                }
                TokenKind::BracketLeft => {
                    operations.append_all(self.call(false)?);
                }
                TokenKind::SquareBracketLeft => {
                    self.advance()?;
                    operations.append_all(self.expression()?);
                    self.expect(TokenKind::SquareBracketRight, "Expected ']'")?;
                    operations.push(OperationKind::Index, position);
                }
                _ => return Ok(operations),
            }
        }
    }

    /// After `.`: either a property name, or a function path called with the
    /// left-hand value as its first argument
    fn member(&mut self, period: usize) -> SyntaxResult<OperationCollection> {
        let start = self.position();
        let mut path = vec![self.member_name("Expected name after '.' operator.")?];
        while self.cursor.is(TokenKind::DoubleColon) {
            self.advance()?;
            path.push(self.member_name("Expected name after '::'.")?);
        }

        if self.cursor.is(TokenKind::BracketLeft) {
            let mut operations =
                OperationCollection::single(OperationKind::LoadFunction(path), start);
            operations.push(OperationKind::Swap, start);
            operations.append_all(self.call(true)?);
            return Ok(operations);
        }

        match path.pop() {
            Some(name) if path.is_empty() => Ok(OperationCollection::single(
                OperationKind::PropertyAccess(name),
                period,
            )),
            _ => Err(SyntaxError::invalid_name(
                "Namespaces are not allowed in property names",
                start,
            )),
        }
    }

    fn member_name(&mut self, message: &str) -> SyntaxResult<String> {
        let token = self.cursor.current();
        let name = match token.text() {
            Some(text) if token.is(TokenKind::Name) => text.to_string(),
            _ => return Err(SyntaxError::expected(message, token.position)),
        };
        self.advance()?;
        Ok(name)
    }

    /// Argument list starting at `(`. A receiver pushed by `.` counts as an
    /// extra leading argument.
    fn call(&mut self, with_receiver: bool) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;

        let (mut operations, mut count) = if self.cursor.is(TokenKind::BracketRight) {
            (OperationCollection::new(), 0)
        } else {
            self.comma_separated(Self::expression)?
        };
        self.expect(TokenKind::BracketRight, "Expected ')'")?;

        if with_receiver {
            count += 1;
        }
        if count > MAX_FUNCTION_PARAMETERS {
            return Err(SyntaxError::limit_exceeded(
                "call arguments",
                MAX_FUNCTION_PARAMETERS,
                position,
            ));
        }
        operations.push(OperationKind::Call(count), position);
        Ok(operations)
    }

    fn comma_separated(
        &mut self,
        item: fn(&mut Self) -> SyntaxResult<OperationCollection>,
    ) -> SyntaxResult<(OperationCollection, usize)> {
        let mut operations = OperationCollection::new();
        let mut count = 0;
        loop {
            operations.append_all(item(self)?);
            count += 1;
            if !self.cursor.is(TokenKind::Comma) {
                return Ok((operations, count));
            }
            self.advance()?;
        }
    }

    fn primary(&mut self) -> SyntaxResult<OperationCollection> {
        let token = self.cursor.current().clone();
        let position = token.position;

        let constant = match (&token.kind, &token.value) {
            (TokenKind::EndOfDocument, _) => {
                return Err(SyntaxError::UnexpectedEnd { offset: position })
            }
            (TokenKind::EndOfInstruction, _) => {
                return Err(SyntaxError::unexpected_message(
                    "Unexpected instruction delimiter",
                    position,
                ))
            }
            (TokenKind::Name | TokenKind::ReservedName, _) => return self.name_expression(),
            (TokenKind::SquareBracketLeft, _) => return self.list_literal(),
            (TokenKind::LessThan, _) => return self.vector_literal(),
            (TokenKind::BracketLeft, _) => {
                self.advance()?;
                let operations = self.expression()?;
                self.expect(TokenKind::BracketRight, "Expected ')'")?;
                return Ok(operations);
            }
            (_, TokenValue::Int(value)) => Constant::Int(value.clone()),
            (_, TokenValue::Float(value)) => Constant::Float(value.clone()),
            (TokenKind::String, TokenValue::Text(text)) => Constant::String(text.clone()),
            _ => return Err(SyntaxError::unexpected(&token)),
        };

        self.advance()?;
        Ok(OperationCollection::single(
            OperationKind::LoadConstant(constant),
            position,
        ))
    }

    /// Variable, boolean literal or function reference
    fn name_expression(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        let (mut path, reserved) = read_name_path(&mut *self.cursor, true)?;

        if self.cursor.is(TokenKind::BracketLeft) {
            return Ok(OperationCollection::single(
                OperationKind::LoadFunction(path),
                position,
            ));
        }
        let name = match path.pop() {
            Some(name) if path.is_empty() => name,
            _ => return Err(SyntaxError::invalid_name("Unexpected namespace", position)),
        };
        if reserved {
            return Err(SyntaxError::invalid_name(
                "Illegal variable name: '$' characters not allowed",
                position,
            ));
        }

        let kind = if name == "true" {
            OperationKind::LoadConstant(Constant::Bool(true))
        } else if name == "false" {
            OperationKind::LoadConstant(Constant::Bool(false))
        } else {
            OperationKind::LoadSymbol(name)
        };
        Ok(OperationCollection::single(kind, position))
    }

    fn list_literal(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        let (mut operations, count) = if self.cursor.is(TokenKind::SquareBracketRight) {
            (OperationCollection::new(), 0)
        } else {
            self.comma_separated(Self::expression)?
        };
        self.expect(TokenKind::SquareBracketRight, "Expected ']'")?;
        operations.push(OperationKind::MakeList(count), position);
        Ok(operations)
    }

    /// `<a, b, c>`. Elements cannot contain binary operators, since `>` would
    /// be read as a comparison.
    fn vector_literal(&mut self) -> SyntaxResult<OperationCollection> {
        let position = self.position();
        self.advance()?;
        let (mut operations, count) = self.comma_separated(Self::postfix)?;
        self.expect(
            TokenKind::MoreThan,
            "Expected '>'. Expressions in vector definitions have to be bracketed.",
        )?;
        operations.push(OperationKind::MakeVector(count), position);
        Ok(operations)
    }
}

fn operation_block(inner: OperationCollection, position: usize) -> OperationCollection {
    let mut operations = OperationCollection::single(OperationKind::BeginOpBlock, position);
    operations.append_all(inner);
    operations.push(OperationKind::EndOpBlock, position);
    operations
}
