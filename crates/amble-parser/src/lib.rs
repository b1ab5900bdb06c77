//! Amble parser: converts a token stream into a validated AST.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING_DEPTH, RESERVED_NAMES};

use amble_lexer::Lexer;
use amble_types::SourceFile;

/// Lex and parse a source file.
///
/// Lexical errors stop the pipeline before parsing.
pub fn parse(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    if lexed.errors.has_errors() {
        return ParseResult {
            program: None,
            errors: lexed.errors,
        };
    }
    Parser::new(lexed.tokens, source_file).parse()
}
