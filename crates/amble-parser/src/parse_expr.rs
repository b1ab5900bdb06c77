//! Expression parsing.
//!
//! Assignment, arrow functions and `? :` are right-associative and handled
//! by dedicated rules. Binary and logical operators are parsed by
//! precedence climbing over [`infix`]; unary operators bind tighter than
//! any of them, and calls, indexing and member access tighter still.

use amble_lexer::token::TokenKind;
use amble_types::ast::*;
use amble_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.nested(Self::parse_assignment)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Assignment = ArrowFunction | Conditional [ "=" Assignment ]`
    pub(crate) fn parse_assignment(&mut self) -> Option<Expr> {
        if self.at_arrow_function() {
            return self.parse_arrow_function();
        }
        let target = self.parse_conditional()?;
        if !self.check(&TokenKind::Eq) {
            return Some(target);
        }
        self.advance(); // eat `=`
        let Some(ident) = target.as_identifier().cloned() else {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "invalid assignment target; only variables can be assigned",
                target.span,
            );
            return None;
        };
        let value = self.parse_expression()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                target: ident,
                value,
            },
            span,
        ))
    }

    /// `Conditional = Binary [ "?" Assignment ":" Assignment ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Some(test);
        }
        let consequent = self.parse_expression()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_expression()?;
        let span = test.span.merge(alternate.span);
        Some(Expr::new(
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            },
            span,
        ))
    }

    /// Left-associative infix operators binding at least as tightly as
    /// `min_precedence`.
    fn parse_binary(&mut self, min_precedence: u8) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((op, precedence)) = infix(self.peek_kind()) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            let span = left.span.merge(right.span);
            let kind = match op {
                Infix::Logical(op) => ExprKind::Logical { left, op, right },
                Infix::Binary(op) => ExprKind::Binary { left, op, right },
            };
            left = Expr::new(kind, span);
        }
        Some(left)
    }

    /// `Unary = { "-" | "!" } Postfix`
    fn parse_unary(&mut self) -> Option<Expr> {
        let mut ops = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Minus => UnaryOp::Neg,
                TokenKind::Bang => UnaryOp::Not,
                _ => break,
            };
            ops.push((op, self.advance().span));
        }
        let mut expr = self.parse_postfix()?;
        for (op, start) in ops.into_iter().rev() {
            let span = start.merge(expr.span);
            expr = Expr::new(ExprKind::Unary { op, operand: expr }, span);
        }
        Some(expr)
    }

    /// `Postfix = Primary { "(" Args ")" | "[" Expr "]" | "." Identifier }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_comma_list(&TokenKind::RParen)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: expr,
                            args: args.into(),
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Member {
                            object: expr,
                            property: MemberProperty::Computed(index),
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    let span = expr.span.merge(name.span);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: expr,
                            property: MemberProperty::Named(name),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::NumberLit(n) => ExprKind::Number(n),
            TokenKind::StringLiteral(s) => ExprKind::String(s.into()),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Undefined => ExprKind::Undefined,
            TokenKind::Identifier(name) => ExprKind::Identifier(Ident::new(name, start)),

            // ── Compound ────────────────────────────────────────────────
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_comma_list(&TokenKind::RBracket)?;
                let span = start.merge(self.previous_span());
                return Some(Expr::new(ExprKind::Array(elements.into()), span));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                return Some(inner);
            }
            TokenKind::Function => {
                self.advance();
                let name = match self.peek_kind() {
                    TokenKind::Identifier(_) => Some(self.expect_binding_name()?),
                    _ => None,
                };
                let function = self.parse_function_rest(name, start)?;
                let span = function.span;
                return Some(Expr::new(ExprKind::Function(function), span));
            }

            TokenKind::Cut => {
                self.error_at_current(
                    ErrorCode::MISPLACED_CUT,
                    "'cut' can only be used as a statement",
                );
                return None;
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{}'", self.peek_kind()),
                );
                return None;
            }
        };
        self.advance();
        Some(Expr::new(kind, start))
    }

    /// Comma-separated expressions up to and including `close`.
    /// A trailing comma is allowed.
    fn parse_comma_list(&mut self, close: &TokenKind) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Some(items)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Arrow Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// `x =>`, `() =>` or `(a, b, ...) =>` at the cursor.
    fn at_arrow_function(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Identifier(_) => *self.look_ahead(1) == TokenKind::FatArrow,
            TokenKind::LParen => {
                let mut i = 1;
                if *self.look_ahead(i) == TokenKind::RParen {
                    return *self.look_ahead(i + 1) == TokenKind::FatArrow;
                }
                loop {
                    if !matches!(self.look_ahead(i), TokenKind::Identifier(_)) {
                        return false;
                    }
                    i += 1;
                    match self.look_ahead(i) {
                        TokenKind::Comma => i += 1,
                        TokenKind::RParen => return *self.look_ahead(i + 1) == TokenKind::FatArrow,
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }

    fn parse_arrow_function(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let params = if self.eat(&TokenKind::LParen) {
            let params = self.parse_param_list()?;
            self.expect(&TokenKind::RParen)?;
            params
        } else {
            vec![self.expect_binding_name()?]
        };
        self.expect(&TokenKind::FatArrow)?;
        let body = if self.check(&TokenKind::LBrace) {
            self.parse_function_body()?
        } else {
            self.parse_arrow_expression_body()?
        };
        let span = start.merge(self.previous_span());
        let function = Function {
            name: None,
            params,
            body,
            span,
        };
        Some(Expr::new(ExprKind::Function(function.into()), span))
    }
}

enum Infix {
    Logical(LogicalOp),
    Binary(BinOp),
}

/// Operator and precedence of an infix token; higher binds tighter.
fn infix(kind: &TokenKind) -> Option<(Infix, u8)> {
    use Infix::{Binary, Logical};
    let entry = match kind {
        TokenKind::PipePipe => (Logical(LogicalOp::Or), 0),
        TokenKind::AmpAmp => (Logical(LogicalOp::And), 1),
        TokenKind::EqEqEq => (Binary(BinOp::StrictEq), 2),
        TokenKind::BangEqEq => (Binary(BinOp::StrictNotEq), 2),
        TokenKind::Less => (Binary(BinOp::Less), 3),
        TokenKind::Greater => (Binary(BinOp::Greater), 3),
        TokenKind::LessEq => (Binary(BinOp::LessEq), 3),
        TokenKind::GreaterEq => (Binary(BinOp::GreaterEq), 3),
        TokenKind::Plus => (Binary(BinOp::Add), 4),
        TokenKind::Minus => (Binary(BinOp::Sub), 4),
        TokenKind::Star => (Binary(BinOp::Mul), 5),
        TokenKind::Slash => (Binary(BinOp::Div), 5),
        TokenKind::Percent => (Binary(BinOp::Mod), 5),
        _ => return None,
    };
    Some(entry)
}
