use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics kept before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// What kind of rule a diagnostic reports; the hundreds digit of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Binding,
    Call,
    Type,
    Host,
    Control,
}

/// Numeric diagnostic code, rendered as `E<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // Syntax
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNCLOSED_DELIMITER: Self = Self(101);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(102);
    pub const MISPLACED_CUT: Self = Self(103);
    pub const RETURN_OUTSIDE_FUNCTION: Self = Self(104);
    pub const JUMP_OUTSIDE_LOOP: Self = Self(105);
    pub const RESERVED_NAME: Self = Self(106);
    pub const UNSUPPORTED_OPERATOR: Self = Self(107);
    pub const NESTING_LIMIT: Self = Self(108);

    // Binding
    pub const VARIABLE_REDECLARATION: Self = Self(200);
    pub const UNASSIGNED_VARIABLE: Self = Self(201);
    pub const UNDEFINED_VARIABLE: Self = Self(202);
    pub const CONST_ASSIGNMENT: Self = Self(203);

    // Calls
    pub const INVALID_NUMBER_OF_ARGUMENTS: Self = Self(300);
    pub const CALLING_NON_FUNCTION: Self = Self(301);

    // Types
    pub const TYPE_MISMATCH: Self = Self(400);
    pub const NON_BOOLEAN_CONDITION: Self = Self(401);
    pub const ILLEGAL_MEMBER_ACCESS: Self = Self(402);
    pub const INDEX_OUT_OF_RANGE: Self = Self(403);

    // Primitives
    pub const EXCEPTION: Self = Self(500);

    // Run control
    pub const INTERRUPTED: Self = Self(600);
    pub const STEP_BUDGET_EXCEEDED: Self = Self(601);
    pub const EXEC_TIME_EXCEEDED: Self = Self(602);

    pub fn category(self) -> ErrorCategory {
        match self.0 / 100 {
            1 => ErrorCategory::Syntax,
            2 => ErrorCategory::Binding,
            3 => ErrorCategory::Call,
            4 => ErrorCategory::Type,
            6 => ErrorCategory::Control,
            _ => ErrorCategory::Host,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "syntax",
            Self::Binding => "binding",
            Self::Call => "call",
            Self::Type => "type",
            Self::Host => "host",
            Self::Control => "control",
        })
    }
}

/// A structured diagnostic, produced by the parser or by an aborted run.
///
/// `message` is the one-line explanation; `elaboration` is the optional
/// longer text shown in verbose mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceError {
    /// Source file name.
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elaboration: Option<String>,
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SourceError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            elaboration: None,
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_elaboration(mut self, elaboration: impl Into<String>) -> Self {
        self.elaboration = Some(elaboration.into());
        self
    }

    /// One-line explanation.
    pub fn explain(&self) -> &str {
        &self.message
    }

    /// Longer description; falls back to the suggestion, then the explanation.
    pub fn elaborate(&self) -> &str {
        self.elaboration
            .as_deref()
            .or(self.suggestion.as_deref())
            .unwrap_or(&self.message)
    }

    /// Render as `Line N: explanation`, or with the column and elaboration
    /// when `verbose` is set.
    pub fn render(&self, verbose: bool) -> String {
        let line = location_part(self.span.start_line);
        if verbose {
            let column = location_part(self.span.start_col);
            format!(
                "Line {line}, Column {column}: {}\n{}\n",
                self.explain(),
                self.elaborate()
            )
        } else {
            format!("Line {line}: {}", self.explain())
        }
    }
}

fn location_part(n: u32) -> String {
    if n == 0 {
        "<unknown>".to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for SourceError {}

/// Render a list of diagnostics, one per line.
pub fn format_diagnostics(errors: &[SourceError], verbose: bool) -> String {
    errors
        .iter()
        .map(|e| e.render(verbose))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accumulated diagnostics for one parse or run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<SourceError>,
    pub total_errors: usize,
}

impl Diagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: SourceError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceError> {
        self.errors.iter()
    }

    pub fn format(&self, verbose: bool) -> String {
        format_diagnostics(&self.errors, verbose)
    }

    /// The collected errors as a JSON array, for hosts that render their own.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.errors).unwrap_or_else(|_| "[]".to_string())
    }
}

impl From<Vec<SourceError>> for Diagnostics {
    fn from(errors: Vec<SourceError>) -> Self {
        let mut diagnostics = Self::empty();
        for e in errors {
            diagnostics.push_error(e);
        }
        diagnostics
    }
}
