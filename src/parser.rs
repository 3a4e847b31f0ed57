use crate::ast::{
    self, ArrayLiteral, Assignment, BinaryExpression, CallExpression, ClassDeclaration, ExprId,
    Expression, FunctionDeclaration, GetExpression, IfStatement, IndexExpression,
    IndexSetExpression, LetStatement, Literal, LogicalExpression, LogicalOperator, Operator,
    ReturnStatement, SelfExpression, SetExpression, Statement, SuperExpression, TimesStatement,
    UnaryExpression, Variable, WhileStatement,
};
use crate::token::{Token, TokenKind, TokenType};
use custom_error::custom_error;
use std::convert::TryFrom;
use std::rc::Rc;
use tracing::debug;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub ParseError

    Expected{line: usize, expected: &'static str, found: String} = "line {line}: expected {expected}, found {found}",
    InvalidAssignmentTarget{line: usize} = "line {line}: invalid assignment target",
    ElseWithoutIf{line: usize} = "line {line}: expected a valid 'if' before 'else'",
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            Self::Expected { line, .. } => *line,
            Self::InvalidAssignmentTarget { line } => *line,
            Self::ElseWithoutIf { line } => *line,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
    // set while parsing an if's consequence, where `else` also ends a statement
    else_may_follow: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().map_or(false, |t| t.is(TokenType::Eof)) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::Eof, "", line));
        }

        Self {
            tokens,
            current: 0,
            errors: vec![],
            else_may_follow: false,
        }
    }

    /// Parses every declaration. A declaration that failed to parse leaves a
    /// `None` in its slot; the reason is recorded in `errors`.
    pub fn parse(&mut self) -> Vec<Option<Statement>> {
        let mut declarations = vec![];

        loop {
            self.skip_eols();
            if self.at_end() {
                break;
            }
            declarations.push(self.declaration());
        }

        declarations
    }

    pub fn parse_program(mut self) -> Result<ast::Program, Vec<ParseError>> {
        let declarations = self.parse();

        if self.errors.is_empty() {
            Ok(declarations.into_iter().flatten().collect::<Vec<_>>().into())
        } else {
            Err(self.errors)
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    fn declaration(&mut self) -> Option<Statement> {
        let start = self.current;
        match self.parse_declaration() {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                debug!(line = err.line(), error = %err, "dropping declaration");
                self.errors.push(err);
                self.synchronize(start);
                None
            }
        }
    }

    fn parse_declaration(&mut self) -> ParseResult<Statement> {
        if self.next_is(TokenType::Let) {
            let stmt = self.parse_let_clause()?;
            self.expect_terminator()?;
            return Ok(Statement::Let(stmt));
        }
        if self.next_is(TokenType::Def) {
            return Ok(Statement::Function(self.parse_function()?));
        }
        if self.next_is(TokenType::Class) {
            return self.parse_class();
        }
        self.parse_statement()
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek().token_type() {
            TokenType::If => {
                self.advance();
                self.parse_if_statement()
            }
            TokenType::Else => Err(ParseError::ElseWithoutIf {
                line: self.peek().line,
            }),
            TokenType::While => {
                self.advance();
                self.parse_while_statement()
            }
            TokenType::Do => {
                let keyword = self.advance();
                self.parse_times_statement(keyword)
            }
            TokenType::For => {
                self.advance();
                self.parse_for_statement()
            }
            TokenType::Break => {
                let keyword = self.advance();
                self.expect_terminator()?;
                Ok(Statement::Break(keyword))
            }
            TokenType::Return => {
                let keyword = self.advance();
                self.parse_return_statement(keyword)
            }
            TokenType::LBrace => {
                self.advance();
                let statements = self.parse_block()?;
                self.expect_terminator()?;
                Ok(Statement::Block(statements.into()))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect_terminator()?;
                Ok(Statement::Expr(expr))
            }
        }
    }

    fn parse_let_clause(&mut self) -> ParseResult<LetStatement> {
        let name = self.expect(TokenType::Ident, "variable name")?;
        let initializer = if self.next_is(TokenType::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(LetStatement { name, initializer })
    }

    /// Parses the declarations of a block whose `{` was already consumed,
    /// through the closing `}`.
    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        let outer = std::mem::replace(&mut self.else_may_follow, false);
        let result = self.parse_block_body();
        self.else_may_follow = outer;
        result
    }

    fn parse_block_body(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = vec![];

        loop {
            self.skip_eols();
            if self.check(TokenType::RBrace) || self.at_end() {
                break;
            }
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.expect(TokenType::RBrace, "'}' after block")?;
        Ok(statements)
    }

    fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        let condition = self.parse_expression()?;
        self.expect(TokenType::Then, "'then' after if condition")?;
        self.next_is(TokenType::Eol);
        let consequence = Box::new(self.parse_consequence()?);

        let alternative = if self.next_is(TokenType::Else) {
            self.next_is(TokenType::Eol);
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            condition,
            consequence,
            alternative,
        }))
    }

    fn parse_consequence(&mut self) -> ParseResult<Statement> {
        let outer = std::mem::replace(&mut self.else_may_follow, true);
        let result = self.parse_statement();
        self.else_may_follow = outer;
        result
    }

    fn parse_while_statement(&mut self) -> ParseResult<Statement> {
        let condition = self.parse_expression()?;
        self.expect(TokenType::Do, "'do' after while condition")?;
        self.next_is(TokenType::Eol);
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement { condition, body }))
    }

    fn parse_times_statement(&mut self, keyword: Token) -> ParseResult<Statement> {
        let count = self.parse_expression()?;
        self.expect(TokenType::Times, "'times' after repeat count")?;
        self.next_is(TokenType::Eol);
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::Times(TimesStatement {
            keyword,
            count,
            body,
        }))
    }

    /// `for (init; cond; update) body` becomes
    /// `{ init; while cond do { body; update } }`.
    fn parse_for_statement(&mut self) -> ParseResult<Statement> {
        self.expect(TokenType::LParen, "'(' after 'for'")?;

        let initializer = if self.next_is(TokenType::Semicolon) {
            None
        } else if self.next_is(TokenType::Let) {
            let stmt = self.parse_let_clause()?;
            self.expect(TokenType::Semicolon, "';' after loop initializer")?;
            Some(Statement::Let(stmt))
        } else {
            let expr = self.parse_expression()?;
            self.expect(TokenType::Semicolon, "';' after loop initializer")?;
            Some(Statement::Expr(expr))
        };

        let condition = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenType::Semicolon, "';' after loop condition")?;

        let update = if self.check(TokenType::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenType::RParen, "')' after for clauses")?;
        self.next_is(TokenType::Eol);

        let mut body = self.parse_statement()?;
        if let Some(update) = update {
            body = Statement::Block(vec![body, Statement::Expr(update)].into());
        }

        let condition = condition.unwrap_or(Expression::Literal(Literal::Boolean(true)));
        let mut stmt = Statement::While(WhileStatement {
            condition,
            body: Box::new(body),
        });

        if let Some(initializer) = initializer {
            stmt = Statement::Block(vec![initializer, stmt].into());
        }

        Ok(stmt)
    }

    fn parse_return_statement(&mut self, keyword: Token) -> ParseResult<Statement> {
        let value = if self.at_terminator() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_terminator()?;

        Ok(Statement::Return(ReturnStatement { keyword, value }))
    }

    fn parse_function(&mut self) -> ParseResult<Rc<FunctionDeclaration>> {
        let name = self.expect(TokenType::Ident, "function name")?;
        self.expect(TokenType::LParen, "'(' after function name")?;

        let mut parameters = vec![];
        if !self.check(TokenType::RParen) {
            loop {
                parameters.push(self.expect(TokenType::Ident, "parameter name")?);
                if !self.next_is(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "')' after parameters")?;

        self.expect(TokenType::LBrace, "'{' before function body")?;
        let body = self.parse_block()?;
        self.expect_terminator()?;

        Ok(Rc::new(FunctionDeclaration {
            name,
            parameters,
            body,
        }))
    }

    fn parse_class(&mut self) -> ParseResult<Statement> {
        let name = self.expect(TokenType::Ident, "class name")?;

        let superclass = if self.next_is(TokenType::Inherits) {
            let name = self.expect(TokenType::Ident, "superclass name")?;
            Some(Variable {
                id: ExprId::fresh(),
                name,
            })
        } else {
            None
        };

        self.expect(TokenType::LBrace, "'{' before class body")?;

        let mut methods = vec![];
        loop {
            self.skip_eols();
            if self.check(TokenType::RBrace) || self.at_end() {
                break;
            }
            self.expect(TokenType::Def, "'def' in class body")?;
            methods.push(self.parse_function()?);
        }

        self.expect(TokenType::RBrace, "'}' after class body")?;
        self.expect_terminator()?;

        Ok(Statement::Class(ClassDeclaration {
            name,
            superclass,
            methods,
        }))
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expression> {
        let expr = self.parse_or()?;

        if !self.check(TokenType::Assign) {
            return Ok(expr);
        }
        let equals = self.advance();
        let value = Box::new(self.parse_assignment()?);

        Ok(match expr {
            Expression::Variable(var) => Expression::Assignment(Assignment {
                id: var.id,
                name: var.name,
                value,
            }),
            Expression::Get(get) => Expression::Set(SetExpression {
                object: get.object,
                name: get.name,
                value,
            }),
            Expression::Index(index) => Expression::IndexSet(IndexSetExpression {
                object: index.object,
                bracket: index.bracket,
                index: index.index,
                value,
            }),
            other => {
                // Reported, but the statement itself survives.
                self.errors
                    .push(ParseError::InvalidAssignmentTarget { line: equals.line });
                other
            }
        })
    }

    fn parse_or(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_and()?;
        while self.next_is(TokenType::Or) {
            let right = self.parse_and()?;
            expr = Expression::Logical(LogicalExpression {
                left: Box::new(expr),
                operator: LogicalOperator::Or,
                right: Box::new(right),
            });
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_equality()?;
        while self.next_is(TokenType::And) {
            let right = self.parse_equality()?;
            expr = Expression::Logical(LogicalExpression {
                left: Box::new(expr),
                operator: LogicalOperator::And,
                right: Box::new(right),
            });
        }
        Ok(expr)
    }

    fn parse_binary(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> ParseResult<Expression>,
    ) -> ParseResult<Expression> {
        let mut expr = operand(self)?;
        while let Some((operator, line)) = self.next_operator(operators) {
            let right = operand(self)?;
            expr = Expression::Binary(BinaryExpression {
                left: Box::new(expr),
                operator,
                line,
                right: Box::new(right),
            });
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> ParseResult<Expression> {
        self.parse_binary(&[TokenType::Eq, TokenType::NotEq], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        self.parse_binary(
            &[
                TokenType::GT,
                TokenType::GtEq,
                TokenType::LT,
                TokenType::LtEq,
            ],
            Self::parse_term,
        )
    }

    fn parse_term(&mut self) -> ParseResult<Expression> {
        self.parse_binary(&[TokenType::Plus, TokenType::Minus], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> ParseResult<Expression> {
        self.parse_binary(&[TokenType::Asterisk, TokenType::Slash], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let prefixes = [
            TokenType::Bang,
            TokenType::Minus,
            TokenType::NumOf,
            TokenType::StrOf,
        ];
        if let Some((operator, line)) = self.next_operator(&prefixes) {
            let right = self.parse_unary()?;
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                line,
                right: Box::new(right),
            }));
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.next_is(TokenType::LParen) {
                let arguments = self.parse_expression_list(TokenType::RParen)?;
                let paren = self.expect(TokenType::RParen, "')' after arguments")?;
                expr = Expression::Call(CallExpression {
                    callee: Box::new(expr),
                    paren,
                    arguments,
                });
            } else if self.check(TokenType::LBracket) {
                let bracket = self.advance();
                let index = self.parse_expression()?;
                self.expect(TokenType::RBracket, "']' after index")?;
                expr = Expression::Index(IndexExpression {
                    object: Box::new(expr),
                    bracket,
                    index: Box::new(index),
                });
            } else if self.next_is(TokenType::Dot) {
                let name = self.expect(TokenType::Ident, "property name after '.'")?;
                expr = Expression::Get(GetExpression {
                    object: Box::new(expr),
                    name,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_expression_list(&mut self, end: TokenType) -> ParseResult<Vec<Expression>> {
        let mut list = vec![];
        if self.check(end) {
            return Ok(list);
        }

        loop {
            list.push(self.parse_expression()?);
            if !self.next_is(TokenType::Comma) {
                break;
            }
        }
        Ok(list)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let literal = match &self.peek().kind {
            TokenKind::False => Some(Literal::Boolean(false)),
            TokenKind::True => Some(Literal::Boolean(true)),
            TokenKind::NoneValue => Some(Literal::None),
            TokenKind::Number(n) => Some(Literal::Number(*n)),
            TokenKind::Str(s) => Some(Literal::String(s.clone())),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(Expression::Literal(literal));
        }

        match self.peek().token_type() {
            TokenType::Ident => {
                let name = self.advance();
                Ok(Expression::Variable(Variable {
                    id: ExprId::fresh(),
                    name,
                }))
            }
            TokenType::SelfValue => {
                let keyword = self.advance();
                Ok(Expression::SelfRef(SelfExpression {
                    id: ExprId::fresh(),
                    keyword,
                }))
            }
            TokenType::Super => {
                let keyword = self.advance();
                self.expect(TokenType::Dot, "'.' after 'super'")?;
                let method = self.expect(TokenType::Ident, "superclass method name")?;
                Ok(Expression::Super(SuperExpression {
                    id: ExprId::fresh(),
                    keyword,
                    method,
                }))
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenType::RParen, "')' after expression")?;
                Ok(Expression::Grouping(Box::new(inner)))
            }
            TokenType::LBracket => {
                self.advance();
                let elements = self.parse_expression_list(TokenType::RBracket)?;
                self.expect(TokenType::RBracket, "']' after array elements")?;
                Ok(Expression::Array(ArrayLiteral::from(elements)))
            }
            _ => Err(self.error_at_current("expression")),
        }
    }

    /// A statement ends at end of line, at `;` (swallowing one end of line
    /// right after it), before `}`, at end of input, or right after a `}`.
    /// Inside an if's consequence it may also end before `else`.
    fn expect_terminator(&mut self) -> ParseResult<()> {
        if self.next_is(TokenType::Eol) {
            return Ok(());
        }
        if self.next_is(TokenType::Semicolon) {
            self.next_is(TokenType::Eol);
            return Ok(());
        }
        if self.check(TokenType::RBrace)
            || self.at_end()
            || self.previous_is(TokenType::RBrace)
            || self.at_inline_else()
        {
            return Ok(());
        }
        Err(self.error_at_current("end of line or closing brace"))
    }

    fn at_terminator(&self) -> bool {
        self.check(TokenType::Eol)
            || self.check(TokenType::Semicolon)
            || self.check(TokenType::RBrace)
            || self.at_end()
            || self.at_inline_else()
    }

    fn at_inline_else(&self) -> bool {
        self.else_may_follow && self.check(TokenType::Else)
    }

    /// Skips ahead to the next statement boundary, always moving at least
    /// one token past `start`.
    fn synchronize(&mut self, start: usize) {
        if self.current == start {
            self.advance();
        }

        while !self.at_end() {
            if self.previous_is(TokenType::Eol) || self.previous_is(TokenType::Semicolon) {
                return;
            }
            match self.peek().token_type() {
                TokenType::RBrace
                | TokenType::Let
                | TokenType::Def
                | TokenType::Class
                | TokenType::If
                | TokenType::While
                | TokenType::For
                | TokenType::Do
                | TokenType::Return
                | TokenType::Break => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn next_operator(&mut self, operators: &[TokenType]) -> Option<(Operator, usize)> {
        let token = self.peek();
        if !operators.contains(&token.token_type()) {
            return None;
        }
        let operator = Operator::try_from(&token.kind).ok()?;
        let line = token.line;
        self.advance();
        Some((operator, line))
    }

    fn expect(&mut self, expected: TokenType, what: &'static str) -> ParseResult<Token> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(what))
        }
    }

    fn error_at_current(&self, expected: &'static str) -> ParseError {
        let token = self.peek();
        ParseError::Expected {
            line: token.line,
            expected,
            found: token.describe(),
        }
    }

    fn skip_eols(&mut self) {
        while self.next_is(TokenType::Eol) {}
    }

    fn next_is(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().is(token_type)
    }

    fn previous_is(&self, token_type: TokenType) -> bool {
        self.current > 0 && self.tokens[self.current - 1].is(token_type)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_end() {
            self.current += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().is(TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof, and `advance` never steps past it.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }
}
