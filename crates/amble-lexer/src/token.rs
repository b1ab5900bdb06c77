//! Token types for the Amble lexer.

use amble_types::Span;
use std::fmt;

/// Reserved words paired with the token each one lexes to.
///
/// `amb` and `require` are deliberately absent: they are ordinary
/// identifiers that the evaluator recognises at call sites.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("function", TokenKind::Function),
    ("let", TokenKind::Let),
    ("const", TokenKind::Const),
    ("return", TokenKind::Return),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("for", TokenKind::For),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("cut", TokenKind::Cut),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
    ("undefined", TokenKind::Undefined),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `42`, `3.14`, `1e3`
    NumberLit(f64),
    /// Contents with escapes resolved.
    StringLiteral(String),
    Identifier(String),

    // Keywords
    Function,
    Let,
    Const,
    Return,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    Cut,
    True,
    False,
    Null,
    Undefined,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEqEq,
    BangEqEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Bang,
    AmpAmp,
    PipePipe,
    Eq,
    FatArrow,
    Question,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,

    Eof,
}

impl TokenKind {
    /// The keyword spelled `word`, if it is reserved.
    pub fn from_keyword(word: &str) -> Option<TokenKind> {
        KEYWORDS
            .iter()
            .find(|(text, _)| *text == word)
            .map(|(_, kind)| kind.clone())
    }

    pub fn is_keyword(&self) -> bool {
        KEYWORDS.iter().any(|(_, kind)| *kind == *self)
    }

    /// Source spelling of a token whose text never varies.
    fn fixed_text(&self) -> Option<&'static str> {
        if let Some((text, _)) = KEYWORDS.iter().find(|(_, kind)| *kind == *self) {
            return Some(*text);
        }
        let text = match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEqEq => "===",
            TokenKind::BangEqEq => "!==",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEq => "<=",
            TokenKind::GreaterEq => ">=",
            TokenKind::Bang => "!",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Eq => "=",
            TokenKind::FatArrow => "=>",
            TokenKind::Question => "?",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Eof => "end of file",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::NumberLit(n) => write!(f, "{n}"),
            TokenKind::StringLiteral(s) => write!(f, "{s:?}"),
            TokenKind::Identifier(name) => f.write_str(name),
            fixed => f.write_str(fixed.fixed_text().unwrap_or("?")),
        }
    }
}
