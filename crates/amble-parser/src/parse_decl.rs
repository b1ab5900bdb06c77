//! Top-level and declaration parsing.
//!
//! Handles the program itself, `let`/`const` declarations, function
//! declarations and the parameter lists and bodies shared with function
//! expressions and arrow functions.

use std::rc::Rc;

use amble_lexer::token::TokenKind;
use amble_types::ast::*;
use amble_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Program
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a complete program: a statement sequence up to end of input.
    pub(crate) fn parse_program(&mut self) -> Program {
        let start = self.current_span();
        let mut stmts = Vec::new();
        loop {
            stmts.extend(self.parse_statements(&TokenKind::RBrace));
            if !self.check(&TokenKind::RBrace) || self.too_many_errors() {
                break;
            }
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unmatched '}'");
            self.advance();
        }
        let span = if stmts.is_empty() {
            start
        } else {
            start.merge(self.previous_span())
        };
        Program {
            body: Block::new(stmts, span),
            span,
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// `let name = expr;` or `const name = expr;`
    pub(crate) fn parse_variable_decl(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        let kind = match self.advance().kind {
            TokenKind::Const => DeclKind::Const,
            _ => DeclKind::Let,
        };
        let name = self.expect_binding_name()?;
        if !self.check(&TokenKind::Eq) {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("missing initializer in declaration of '{}'", name.name),
            );
            return None;
        }
        self.advance();
        let init = self.parse_expression()?;
        let span = start.merge(self.previous_span());
        self.expect_semicolon();
        Some(Stmt::new(StmtKind::VariableDecl { kind, name, init }, span))
    }

    /// `function name(params) { body }`
    pub(crate) fn parse_function_decl(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `function`
        let name = self.expect_binding_name()?;
        let function = self.parse_function_rest(Some(name), start)?;
        let span = function.span;
        Some(Stmt::new(StmtKind::FunctionDecl(function), span))
    }

    /// Parse `(params) { body }` after the `function` keyword and optional name.
    pub(crate) fn parse_function_rest(
        &mut self,
        name: Option<Ident>,
        start: Span,
    ) -> Option<Rc<Function>> {
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_function_body()?;
        let span = start.merge(self.previous_span());
        Some(Rc::new(Function {
            name,
            params,
            body,
            span,
        }))
    }

    /// Comma-separated parameter names, up to (not including) `)`.
    pub(crate) fn parse_param_list(&mut self) -> Option<Vec<Ident>> {
        let mut params: Vec<Ident> = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Some(params);
        }
        loop {
            let param = self.expect_binding_name()?;
            if params.iter().any(|p| p.name == param.name) {
                self.error_at(
                    ErrorCode::VARIABLE_REDECLARATION,
                    format!("duplicate parameter name '{}'", param.name),
                    param.span,
                );
            }
            params.push(param);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(params)
    }

    /// A `{ ... }` function body.
    pub(crate) fn parse_function_body(&mut self) -> Option<Block> {
        self.in_function(Self::parse_block)
    }

    /// The expression body of an arrow function, wrapped as `{ return e; }`.
    pub(crate) fn parse_arrow_expression_body(&mut self) -> Option<Block> {
        let expr = self.in_function(Self::parse_expression)?;
        let span = expr.span;
        Some(Block::new(vec![Stmt::new(StmtKind::Return(expr), span)], span))
    }
}
