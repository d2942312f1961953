// src/parser/opal_parser.rs
//! Recursive descent parser for Opal.
//!
//! Statements are parsed by dispatch on the leading token; expressions use
//! Pratt binding powers from [`crate::parser::precedence`]. Errors are
//! collected rather than fatal: the parser skips to the next statement
//! boundary and keeps going, so one pass reports as much as possible.

use crate::error::compile_error::CompileError;
use crate::location::source_span::SourceSpan;
use crate::parser::ast::*;
use crate::parser::precedence::{binding_power, unary_binding_power};
use crate::tokens::token::Token;
use crate::tokens::token_kind::TokenKind;

pub struct OpalParser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<CompileError>,
}

impl OpalParser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0, errors: Vec::new() }
    }

    /// Entry point: parse a whole program (a list of functions).
    pub fn parse(mut self) -> (Program, Vec<CompileError>) {
        let mut functions = Vec::new();
        while !self.is_at_end() {
            if self.check(&TokenKind::KeywordFunc) {
                if let Some(func) = self.parse_function() {
                    functions.push(func);
                } else {
                    self.synchronize_to_function();
                }
            } else {
                let token = self.peek().cloned();
                if let Some(token) = token {
                    self.syntax_error(format!("Expected 'func', found {}", token.kind), &token.span);
                }
                self.synchronize_to_function();
            }
        }
        (Program { functions }, self.errors)
    }

    fn parse_function(&mut self) -> Option<FunctionDecl> {
        let func_span = self.advance()?.span.clone(); // 'func'

        let (name, _) = self.expect_identifier("Expected function name")?;
        self.expect(&TokenKind::OpenParen, "Expected '(' after function name")?;

        let mut parameters = Vec::new();
        if !self.check(&TokenKind::CloseParen) {
            loop {
                let (param_name, param_span) = self.expect_identifier("Expected parameter name")?;
                let ty = self.parse_type()?;
                parameters.push(Parameter { name: param_name, ty, span: param_span });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::CloseParen, "Expected ')' after parameters")?;
        self.expect(&TokenKind::Arrow, "Expected '->' before return type")?;
        let return_type = self.parse_type()?;
        let body = self.parse_block()?;

        let span = func_span.merged(&body.span);
        Some(FunctionDecl { name, parameters, return_type, body, span })
    }

    fn parse_type(&mut self) -> Option<Type> {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::KeywordInt) => {
                self.advance();
                Some(Type::Int)
            }
            Some(TokenKind::KeywordVoid) => {
                self.advance();
                Some(Type::Void)
            }
            _ => {
                let (message, span) = self.unexpected("Expected type 'int' or 'void'");
                self.syntax_error(message, &span);
                None
            }
        }
    }

    fn parse_block(&mut self) -> Option<Block> {
        let open_span = self.expect(&TokenKind::OpenBrace, "Expected '{'")?.span.clone();
        let mut statements = Vec::new();
        while !self.check(&TokenKind::CloseBrace) && !self.is_at_end() {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            } else {
                self.synchronize_to_statement();
            }
        }
        let close_span = self.expect(&TokenKind::CloseBrace, "Expected '}'")?.span.clone();
        Some(Block { statements, span: open_span.merged(&close_span) })
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::KeywordIf) => self.parse_if(),
            Some(TokenKind::KeywordFor) => self.parse_for(),
            Some(TokenKind::KeywordReturn) => self.parse_return(),
            Some(TokenKind::KeywordBreak) => {
                let span = self.advance()?.span.clone();
                self.expect(&TokenKind::Semicolon, "Expected ';' after 'break'")?;
                Some(Stmt::Break { span })
            }
            Some(TokenKind::KeywordContinue) => {
                let span = self.advance()?.span.clone();
                self.expect(&TokenKind::Semicolon, "Expected ';' after 'continue'")?;
                Some(Stmt::Continue { span })
            }
            Some(TokenKind::OpenBrace) => self.parse_block().map(Stmt::Block),
            Some(TokenKind::Identifier(_)) => self.parse_identifier_statement(),
            _ => {
                let (message, span) = self.unexpected("Expected statement");
                self.syntax_error(message, &span);
                None
            }
        }
    }

    /// Statements introduced by an identifier: declaration, reassignment or
    /// call. One token of lookahead decides which.
    fn parse_identifier_statement(&mut self) -> Option<Stmt> {
        match self.peek_next().map(|t| &t.kind) {
            Some(TokenKind::KeywordInt) => {
                let stmt = self.parse_declaration()?;
                self.expect(&TokenKind::Semicolon, "Expected ';' after declaration")?;
                Some(stmt)
            }
            Some(TokenKind::Equal) => {
                let stmt = self.parse_reassignment()?;
                self.expect(&TokenKind::Semicolon, "Expected ';' after assignment")?;
                Some(stmt)
            }
            Some(TokenKind::OpenParen) => {
                let (name, name_span) = self.expect_identifier("Expected function name")?;
                let args = self.parse_call_args()?;
                let semi_span = self.expect(&TokenKind::Semicolon, "Expected ';' after call")?.span.clone();
                Some(Stmt::Call { name, args, span: name_span.merged(&semi_span) })
            }
            _ => {
                let (message, span) = self.unexpected("Expected '=', 'int' or '(' after identifier");
                self.syntax_error(message, &span);
                None
            }
        }
    }

    /// `name int = expr` (no trailing semicolon; callers consume it).
    fn parse_declaration(&mut self) -> Option<Stmt> {
        let (name, name_span) = self.expect_identifier("Expected variable name")?;
        let ty = self.parse_type()?;
        self.expect(&TokenKind::Equal, "Expected '=' in declaration")?;
        let value = self.parse_expression()?;
        let span = name_span.merged(value.span());
        Some(Stmt::Declaration { name, ty, value, span })
    }

    /// `name = expr` (no trailing semicolon; callers consume it).
    fn parse_reassignment(&mut self) -> Option<Stmt> {
        let (name, name_span) = self.expect_identifier("Expected variable name")?;
        self.expect(&TokenKind::Equal, "Expected '=' in assignment")?;
        let value = self.parse_expression()?;
        let span = name_span.merged(value.span());
        Some(Stmt::Assignment { name, value, span })
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let if_span = self.advance()?.span.clone(); // 'if'
        self.expect(&TokenKind::OpenParen, "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::CloseParen, "Expected ')' after condition")?;
        let then_block = self.parse_block()?;

        let else_block = if self.match_token(&TokenKind::KeywordElse) { Some(self.parse_block()?) } else { None };

        let end_span = else_block.as_ref().map_or(&then_block.span, |b| &b.span).clone();
        Some(Stmt::If { condition, then_block, else_block, span: if_span.merged(&end_span) })
    }

    /// Both loop forms: `for (init; cond; update) { … }` and `for { … }`.
    fn parse_for(&mut self) -> Option<Stmt> {
        let for_span = self.advance()?.span.clone(); // 'for'

        if self.check(&TokenKind::OpenBrace) {
            let body = self.parse_block()?;
            let span = for_span.merged(&body.span);
            return Some(Stmt::Loop { body, span });
        }

        self.expect(&TokenKind::OpenParen, "Expected '(' or '{' after 'for'")?;
        let init = self.parse_declaration()?;
        self.expect(&TokenKind::Semicolon, "Expected ';' after loop initializer")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "Expected ';' after loop condition")?;
        let update = self.parse_reassignment()?;
        self.expect(&TokenKind::CloseParen, "Expected ')' after loop update")?;
        let body = self.parse_block()?;

        let span = for_span.merged(&body.span);
        Some(Stmt::For { init: Box::new(init), condition, update: Box::new(update), body, span })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let return_span = self.advance()?.span.clone(); // 'return'
        let value = if self.check(&TokenKind::Semicolon) { None } else { Some(self.parse_expression()?) };
        let semi_span = self.expect(&TokenKind::Semicolon, "Expected ';' after return")?.span.clone();
        Some(Stmt::Return { value, span: return_span.merged(&semi_span) })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some(token) = self.peek() else { break };
            let (left_bp, right_bp) = binding_power(&token.kind);
            if left_bp == 0 || left_bp < min_bp {
                break;
            }
            let op_token = self.advance()?.clone();
            let op = match BinaryOp::from_token(&op_token) {
                Ok(op) => op,
                Err(e) => {
                    self.errors.push(e);
                    return None;
                }
            };
            let rhs = self.parse_expr_bp(right_bp)?;
            let span = lhs.span().merged(rhs.span());
            lhs = Expr::Binary { op, left: Box::new(lhs), right: Box::new(rhs), span };
        }
        Some(lhs)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Minus | TokenKind::Not => {
                let r_bp = unary_binding_power(&token.kind);
                self.advance();
                let op = if token.kind == TokenKind::Minus { UnaryOp::Negate } else { UnaryOp::Not };
                let operand = self.parse_expr_bp(r_bp)?;
                let span = token.span.merged(operand.span());
                Some(Expr::Unary { op, expr: Box::new(operand), span })
            }
            TokenKind::Integer(value) => {
                self.advance();
                Some(Expr::Literal { value, span: token.span })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::OpenParen) {
                    let args = self.parse_call_args()?;
                    // Span ends at the closing parenthesis of the call.
                    let end = self.previous_span();
                    Some(Expr::Call { name, args, span: token.span.merged(&end) })
                } else {
                    Some(Expr::Variable { name, span: token.span })
                }
            }
            TokenKind::OpenParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::CloseParen, "Expected ')' after expression")?;
                Some(expr)
            }
            _ => {
                self.syntax_error(format!("Expected expression, found {}", token.kind), &token.span);
                None
            }
        }
    }

    /// `( arg, arg, ... )`; the opening parenthesis is still pending.
    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        self.expect(&TokenKind::OpenParen, "Expected '('")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::CloseParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::CloseParen, "Expected ')' after arguments")?;
        Some(args)
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn previous_span(&self) -> SourceSpan {
        self.current
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.clone())
            .unwrap_or_default()
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.current)?;
        self.current += 1;
        Some(token)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().map(|t| &t.kind), None | Some(TokenKind::Eof))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|t| &t.kind == kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Option<&Token> {
        if self.check(kind) {
            return self.advance();
        }
        let (found, span) = self.unexpected(message);
        self.syntax_error(found, &span);
        None
    }

    fn expect_identifier(&mut self, message: &str) -> Option<(String, SourceSpan)> {
        if let Some(Token { kind: TokenKind::Identifier(name), span }) = self.peek() {
            let result = (name.clone(), span.clone());
            self.current += 1;
            return Some(result);
        }
        let (found, span) = self.unexpected(message);
        self.syntax_error(found, &span);
        None
    }

    fn unexpected(&self, message: &str) -> (String, SourceSpan) {
        match self.peek() {
            Some(token) => (format!("{message}, found {}", token.kind), token.span.clone()),
            None => (format!("{message}, found end of input"), SourceSpan::default()),
        }
    }

    fn syntax_error(&mut self, message: String, span: &SourceSpan) {
        self.errors.push(CompileError::SyntaxError { message, span: span.clone() });
    }

    /// After a statement-level error, skip to just past the next ';' (or
    /// stop before a '}' / EOF) so parsing can resume.
    fn synchronize_to_statement(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon => {
                    self.current += 1;
                    return;
                }
                TokenKind::CloseBrace | TokenKind::Eof => return,
                _ => self.current += 1,
            }
        }
    }

    fn synchronize_to_function(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::KeywordFunc => return,
                TokenKind::Eof => {
                    self.current += 1;
                    return;
                }
                _ => self.current += 1,
            }
        }
    }
}
