//! Statement parsing.

use std::rc::Rc;

use crate::parser::Parser;
use amble_lexer::token::TokenKind;
use amble_types::ast::*;
use amble_types::ErrorCode;

impl<'src> Parser<'src> {
    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        let stmts = self.nested(|p| Some(p.parse_statements(&TokenKind::RBrace)))?;
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Block::new(stmts, span))
    }

    /// Statements up to `close` (not consumed) or end of input. Stray
    /// semicolons are skipped; a failed statement resynchronizes.
    pub(crate) fn parse_statements(&mut self, close: &TokenKind) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.check(close) && !self.at_end() && !self.too_many_errors() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        stmts
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Const => self.parse_variable_decl(),
            TokenKind::Function if matches!(self.look_ahead(1), TokenKind::Identifier(_)) => {
                self.parse_function_decl()
            }
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Break | TokenKind::Continue => self.parse_jump_stmt(),
            TokenKind::Cut => {
                let span = self.advance().span;
                self.expect_semicolon();
                Some(Stmt::new(StmtKind::Cut, span))
            }
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Some(Stmt::new(StmtKind::Block(block), span))
            }
            _ => {
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.expect_semicolon();
                Some(Stmt::new(StmtKind::Expr(expr), span))
            }
        }
    }

    /// `return [expr];`
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `return`
        if !self.enclosing.in_function {
            self.error_at(
                ErrorCode::RETURN_OUTSIDE_FUNCTION,
                "'return' outside of a function body",
                start,
            );
        }
        let value = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.at_end()
            || self.current_span().start_line > start.end_line
        {
            Expr::new(ExprKind::Undefined, start)
        } else {
            self.parse_expression()?
        };
        let span = start.merge(self.previous_span());
        self.expect_semicolon();
        Some(Stmt::new(StmtKind::Return(value), span))
    }

    /// `break;` / `continue;`
    fn parse_jump_stmt(&mut self) -> Option<Stmt> {
        let token = self.advance();
        if !self.enclosing.in_loop {
            self.error_at(
                ErrorCode::JUMP_OUTSIDE_LOOP,
                format!("'{}' outside of a loop", token.kind),
                token.span,
            );
        }
        self.expect_semicolon();
        let kind = match token.kind {
            TokenKind::Break => StmtKind::Break,
            _ => StmtKind::Continue,
        };
        Some(Stmt::new(kind, token.span))
    }

    /// `if (test) { ... } [else if (...) { ... }] [else { ... }]`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `if`
        let test = self.parse_condition()?;
        let consequent = self.parse_block()?;
        let alternate = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(ElseBranch::ElseIf(self.parse_if_stmt()?))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(Stmt::new(
            StmtKind::If {
                test,
                consequent,
                alternate,
            },
            span,
        ))
    }

    /// `while (test) { ... }`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `while`
        let test = self.parse_condition()?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::new(StmtKind::While { test, body }, span))
    }

    /// `for ([let x = e | e]; [test]; [update]) { ... }`
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `for`
        self.expect(&TokenKind::LParen)?;

        let init = match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            TokenKind::Let => Some(self.parse_variable_decl()?),
            TokenKind::Const => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    "loop variables must be declared with 'let'",
                );
                return None;
            }
            _ => {
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.expect(&TokenKind::Semicolon)?;
                Some(Stmt::new(StmtKind::Expr(expr), span))
            }
        };

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::new(
            StmtKind::For(Rc::new(ForLoop {
                init,
                test,
                update,
                body,
            })),
            span,
        ))
    }

    /// `( expr )` after `if` / `while`.
    fn parse_condition(&mut self) -> Option<Expr> {
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        Some(test)
    }

    fn parse_loop_body(&mut self) -> Option<Block> {
        self.in_loop(Self::parse_block)
    }
}
