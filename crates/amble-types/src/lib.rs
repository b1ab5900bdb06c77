//! Shared types for the Amble interpreter.
//!
//! This crate defines the AST node types, source spans, diagnostics,
//! and other shared data structures used by the lexer, parser and evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{
    format_diagnostics, Diagnostics, ErrorCategory, ErrorCode, SourceError, MAX_ERRORS,
};
pub use span::{SourceFile, Span};

/// Result type used by the front-end stages.
pub type Result<T> = std::result::Result<T, SourceError>;
