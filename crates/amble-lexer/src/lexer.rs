//! Source text to tokens.
//!
//! Whitespace, `//` and `/* */` comments are insignificant. Strings take
//! either quote and the usual backslash escapes. Loose equality and the
//! bitwise operators are reported with a suggestion; lexing carries on
//! after every error until [`MAX_ERRORS`] have been collected.

use amble_types::{Diagnostics, ErrorCode, SourceError, SourceFile, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Operators and punctuation, longer spellings first.
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::EqEqEq),
    ("!==", TokenKind::BangEqEq),
    ("=>", TokenKind::FatArrow),
    ("<=", TokenKind::LessEq),
    (">=", TokenKind::GreaterEq),
    ("&&", TokenKind::AmpAmp),
    ("||", TokenKind::PipePipe),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("!", TokenKind::Bang),
    ("=", TokenKind::Eq),
    ("?", TokenKind::Question),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    (".", TokenKind::Dot),
];

/// Loose spelling, strict spelling, and the token read in its place.
const LOOSE_EQUALITY: &[(&str, &str, TokenKind)] = &[
    ("==", "===", TokenKind::EqEqEq),
    ("!=", "!==", TokenKind::BangEqEq),
];

/// Where a token started.
#[derive(Clone, Copy)]
struct Mark {
    offset: usize,
    line: u32,
    col: u32,
}

pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    offset: usize,
    line: u32,
    /// Counts characters, not bytes.
    col: u32,
    errors: Diagnostics,
}

pub struct LexResult {
    /// Always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            offset: 0,
            line: 1,
            col: 1,
            errors: Diagnostics::empty(),
        }
    }

    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        while !self.saturated() {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.here()));
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    fn byte(&self, ahead: usize) -> Option<u8> {
        self.source.get(self.offset + ahead).copied()
    }

    fn rest(&self) -> &'src [u8] {
        let source = self.source;
        &source[self.offset..]
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.byte(0)?;
        self.offset += 1;
        match b {
            b'\n' => {
                self.line += 1;
                self.col = 1;
            }
            // UTF-8 continuation bytes belong to the previous column.
            _ if b & 0xC0 == 0x80 => {}
            _ => self.col += 1,
        }
        Some(b)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.byte(0).is_some_and(&pred) {
            self.bump();
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            col: self.col,
        }
    }

    fn here(&self) -> Span {
        Span::point(self.line, self.col)
    }

    /// From `mark` to the last consumed character, inclusive.
    fn span_since(&self, mark: Mark) -> Span {
        let end_col = self.col.saturating_sub(1).max(1);
        Span::new(mark.line, mark.col, self.line, end_col)
    }

    fn text_since(&self, mark: Mark) -> &'src str {
        let source = self.source;
        std::str::from_utf8(&source[mark.offset..self.offset]).unwrap_or("")
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    fn saturated(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    fn report(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.report_with(code, message, span, None);
    }

    fn report_with(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: Option<String>,
    ) {
        let line = self.source_file.line(span.start_line).unwrap_or("");
        let mut err = SourceError::new(&self.source_file.name, code, message, span, line);
        if let Some(suggestion) = suggestion {
            err = err.with_suggestion(suggestion);
        }
        self.errors.push_error(err);
    }

    // ── Trivia ────────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        loop {
            match (self.byte(0), self.byte(1)) {
                (Some(b), _) if b.is_ascii_whitespace() => self.bump_n(1),
                (Some(b'/'), Some(b'/')) => self.eat_while(|b| b != b'\n'),
                (Some(b'/'), Some(b'*')) => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let mark = self.mark();
        self.bump_n(2);
        while !self.rest().starts_with(b"*/") {
            if self.bump().is_none() {
                let span = self.span_since(mark);
                self.report(ErrorCode::UNCLOSED_DELIMITER, "Unterminated comment", span);
                return;
            }
        }
        self.bump_n(2);
    }

    // ── Tokens ────────────────────────────────────────────────────────────────

    fn next_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            let mark = self.mark();
            let Some(first) = self.byte(0) else {
                return Token::new(TokenKind::Eof, self.here());
            };
            let kind = match first {
                b'"' | b'\'' => self.string(mark, first),
                b'0'..=b'9' => self.number(mark),
                b'.' if self.byte(1).is_some_and(|b| b.is_ascii_digit()) => self.number(mark),
                b if is_word_start(b) => self.word(mark),
                _ => match self.punctuator(mark) {
                    Some(kind) => kind,
                    None => {
                        self.stray_character(mark, first);
                        if self.saturated() {
                            return Token::new(TokenKind::Eof, self.here());
                        }
                        continue;
                    }
                },
            };
            return Token::new(kind, self.span_since(mark));
        }
    }

    /// The longest operator or punctuation mark at the cursor. `==` and
    /// `!=` are reported and read as their strict forms.
    fn punctuator(&mut self, mark: Mark) -> Option<TokenKind> {
        let rest = self.rest();
        for (loose, strict, kind) in LOOSE_EQUALITY {
            if rest.starts_with(loose.as_bytes()) && !rest.starts_with(strict.as_bytes()) {
                self.bump_n(loose.len());
                self.report_with(
                    ErrorCode::UNSUPPORTED_OPERATOR,
                    format!("Use {strict} instead of {loose}"),
                    self.span_since(mark),
                    Some(format!("Loose comparison is not part of the language; use {strict}")),
                );
                return Some(kind.clone());
            }
        }
        let (text, kind) = PUNCTUATORS
            .iter()
            .find(|(text, _)| rest.starts_with(text.as_bytes()))?;
        self.bump_n(text.len());
        Some(kind.clone())
    }

    /// Consume and report a character that starts no token.
    fn stray_character(&mut self, mark: Mark, first: u8) {
        self.bump();
        self.eat_while(|b| b & 0xC0 == 0x80);
        let span = self.span_since(mark);
        if first == b'&' || first == b'|' {
            let op = first as char;
            self.report_with(
                ErrorCode::UNSUPPORTED_OPERATOR,
                format!("Bitwise operator '{op}' is not supported"),
                span,
                Some(format!("Use '{op}{op}' for the logical operator")),
            );
        } else {
            let text = self.text_since(mark);
            self.report(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Unexpected character '{text}'"),
                span,
            );
        }
    }

    /// Digits, an optional fraction, an optional exponent. The integer part
    /// may be empty (`.5`). A `.` or `e` without digits after it is left for
    /// the next token.
    fn number(&mut self, mark: Mark) -> TokenKind {
        self.eat_while(|b| b.is_ascii_digit());
        if self.byte(0) == Some(b'.') && self.byte(1).is_some_and(|b| b.is_ascii_digit()) {
            self.bump();
            self.eat_while(|b| b.is_ascii_digit());
        }
        if matches!(self.byte(0), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.byte(1), Some(b'+' | b'-')));
            if self.byte(1 + sign).is_some_and(|b| b.is_ascii_digit()) {
                self.bump_n(1 + sign);
                self.eat_while(|b| b.is_ascii_digit());
            }
        }
        TokenKind::NumberLit(self.text_since(mark).parse().unwrap_or(0.0))
    }

    fn word(&mut self, mark: Mark) -> TokenKind {
        self.eat_while(|b| is_word_start(b) || b.is_ascii_digit());
        let text = self.text_since(mark);
        TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }

    /// A quoted string; it may not span lines.
    fn string(&mut self, mark: Mark, quote: u8) -> TokenKind {
        self.bump();
        let mut contents = String::new();
        loop {
            let chunk = self.mark();
            self.eat_while(|b| b != quote && b != b'\\' && b != b'\n');
            contents.push_str(self.text_since(chunk));
            match self.byte(0) {
                Some(b) if b == quote => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    if let Some(c) = self.escape() {
                        contents.push(c);
                    }
                }
                _ => {
                    let span = self.span_since(mark);
                    self.report(
                        ErrorCode::UNCLOSED_DELIMITER,
                        "Unterminated string literal",
                        span,
                    );
                    break;
                }
            }
        }
        TokenKind::StringLiteral(contents)
    }

    /// The character a backslash escape stands for. Unknown escapes are
    /// reported and kept literally.
    fn escape(&mut self) -> Option<char> {
        let mark = self.mark();
        self.bump();
        let Some(b) = self.bump() else {
            let span = self.span_since(mark);
            self.report(
                ErrorCode::UNCLOSED_DELIMITER,
                "Unexpected end of file in escape sequence",
                span,
            );
            return None;
        };
        let c = match b {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'0' => '\0',
            b'"' | b'\'' | b'\\' => b as char,
            other => {
                let span = self.span_since(mark);
                self.report(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("Invalid escape sequence '\\{}'", other as char),
                    span,
                );
                other as char
            }
        };
        Some(c)
    }
}

fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}
