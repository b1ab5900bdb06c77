//! Parser state: the token cursor, what encloses the current position,
//! and the diagnostics collected so far.

use amble_lexer::token::{Token, TokenKind};
use amble_types::ast::{Ident, Program};
use amble_types::{Diagnostics, ErrorCode, SourceError, SourceFile, Span, MAX_ERRORS};

/// Maximum nesting of expressions and blocks.
pub const MAX_NESTING_DEPTH: u32 = 100;

/// Names bound by the evaluator itself; they cannot be declared.
pub const RESERVED_NAMES: &[&str] = &["amb", "require", "cut"];

/// Syntactic context of the token being parsed, used for placement checks.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Enclosing {
    pub(crate) depth: u32,
    pub(crate) in_function: bool,
    /// A loop inside the innermost function body.
    pub(crate) in_loop: bool,
}

/// Recursive-descent parser over a lexed token stream.
///
/// Errors are collected and parsing resumes at the next statement
/// boundary; a program is only produced when none were reported.
pub struct Parser<'src> {
    /// Always ends with [`TokenKind::Eof`]; the cursor never moves past it.
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: Diagnostics,
    pub(crate) enclosing: Enclosing,
}

pub struct ParseResult {
    /// `None` when any error was reported.
    pub program: Option<Program>,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::point(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::empty(),
            enclosing: Enclosing::default(),
        }
    }

    /// Parse the whole token stream.
    pub fn parse(mut self) -> ParseResult {
        let program = self.parse_program();
        ParseResult {
            program: (!self.errors.has_errors()).then_some(program),
            errors: self.errors,
        }
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// The kind `n` tokens ahead, or `Eof` past the end.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)].kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .map_or(Span::point(1, 1), |i| self.tokens[i].span)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        let matched = self.check(kind);
        if matched {
            self.advance();
        }
        matched
    }

    // ── Expectations ──────────────────────────────────────────────────────────

    /// Consume `expected` or report what was found instead. Running out of
    /// input counts as an unclosed delimiter.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            return Some(self.advance());
        }
        let code = if self.at_end() {
            ErrorCode::UNCLOSED_DELIMITER
        } else {
            ErrorCode::UNEXPECTED_TOKEN
        };
        let message = format!("expected '{expected}', got '{}'", self.peek_kind());
        self.error_at_current(code, message);
        None
    }

    /// `;` may be left out before `}`, at end of input, or at a line break.
    pub(crate) fn expect_semicolon(&mut self) {
        let omitted = self.at_end()
            || self.check(&TokenKind::RBrace)
            || self.current_span().start_line > self.previous_span().end_line;
        if self.eat(&TokenKind::Semicolon) || omitted {
            return;
        }
        let message = format!("expected ';', got '{}'", self.peek_kind());
        self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.clone();
            let span = self.advance().span;
            return Some(Ident::new(name, span));
        }
        let message = format!("expected identifier, got '{}'", self.peek_kind());
        self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
        None
    }

    /// An identifier introducing a binding; reserved names are rejected.
    pub(crate) fn expect_binding_name(&mut self) -> Option<Ident> {
        let ident = if self.check(&TokenKind::Cut) {
            let span = self.advance().span;
            Ident::new("cut", span)
        } else {
            self.expect_identifier()?
        };
        if RESERVED_NAMES.contains(&&*ident.name) {
            self.error_at(
                ErrorCode::RESERVED_NAME,
                format!("'{}' is reserved and cannot be declared", ident.name),
                ident.span,
            );
            if &*ident.name == "cut" {
                return None;
            }
        }
        Some(ident)
    }

    // ── Enclosing context ─────────────────────────────────────────────────────

    /// Run `parse` one nesting level deeper, refusing past the limit.
    pub(crate) fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.enclosing.depth >= MAX_NESTING_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT,
                format!("maximum nesting depth is {MAX_NESTING_DEPTH}"),
            );
            return None;
        }
        self.enclosing.depth += 1;
        let result = parse(self);
        self.enclosing.depth -= 1;
        result
    }

    /// Parse a function body: `return` is legal and enclosing loops are no
    /// longer targets for `break`/`continue`.
    pub(crate) fn in_function<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> T {
        self.within(
            Enclosing {
                in_function: true,
                in_loop: false,
                ..self.enclosing
            },
            parse,
        )
    }

    pub(crate) fn in_loop<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> T {
        self.within(
            Enclosing {
                in_loop: true,
                ..self.enclosing
            },
            parse,
        )
    }

    fn within<T>(&mut self, inner: Enclosing, parse: impl FnOnce(&mut Self) -> T) -> T {
        let outer = std::mem::replace(&mut self.enclosing, inner);
        let result = parse(self);
        self.enclosing = outer;
        result
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.error_at(code, message, self.current_span());
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let line = self.source_file.line(span.start_line).unwrap_or("");
        let error = SourceError::new(&self.source_file.name, code, message, span, line);
        self.errors.push_error(error);
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    /// Skip to the next statement boundary after an error: just past a `;`,
    /// or at a token that can only start a statement or close a block.
    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof
                | TokenKind::RBrace
                | TokenKind::Function
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Cut => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}
