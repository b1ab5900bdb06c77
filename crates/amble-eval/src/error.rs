//! Runtime error types for the Amble evaluator.
//!
//! Every runtime error is fatal to the run: the scheduler unwinds the
//! environment stack and converts the error into a [`SourceError`].

use std::rc::Rc;

use amble_types::{ErrorCode, SourceError, SourceFile, Span};

/// Evaluation error: binding failures, bad calls, type errors, host
/// exceptions and control aborts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    // ── Binding ──
    #[error("Redeclaring name {name}.")]
    VariableRedeclaration { name: Rc<str>, span: Span },
    /// Read or write of a hoisted name before its declaration ran.
    #[error("Name {name} declared later in current scope.")]
    UnassignedVariable { name: Rc<str>, span: Span },
    #[error("Name {name} not declared.")]
    UndefinedVariable { name: Rc<str>, span: Span },
    #[error("Cannot assign new value to constant {name}.")]
    ConstAssignment { name: Rc<str>, span: Span },

    // ── Call ──
    #[error("Expected {expected} arguments, but got {got}.")]
    InvalidNumberOfArguments {
        callee: String,
        expected: String,
        got: usize,
        span: Span,
    },
    #[error("Calling non-function value {callee}.")]
    CallingNonFunction { callee: String, span: Span },

    // ── Type ──
    /// `context` is either empty or a phrase such as
    /// `" on left hand side of operation"`.
    #[error("Expected {expected}{context}, got {got}.")]
    TypeMismatch {
        expected: &'static str,
        context: &'static str,
        got: &'static str,
        span: Span,
    },
    #[error("Expected boolean as condition, got {got}.")]
    NonBooleanCondition { got: &'static str, span: Span },
    #[error("Cannot read property {property} of {object}.")]
    IllegalMemberAccess {
        property: String,
        object: &'static str,
        span: Span,
    },
    #[error("Index {index} is out of range for {object} of length {length}.")]
    IndexOutOfRange {
        index: f64,
        object: &'static str,
        length: usize,
        span: Span,
    },

    // ── Host ──
    #[error("{error}")]
    Exception {
        function: &'static str,
        error: HostError,
        span: Span,
    },

    // ── Control ──
    #[error("Execution aborted by user.")]
    Interrupted { span: Span },
    #[error("Step budget of {budget} exceeded.")]
    StepBudgetExceeded { budget: u64, span: Span },
    #[error("Time limit of {limit_ms}ms exceeded.")]
    ExecTimeExceeded { limit_ms: u64, span: Span },
}

/// A failure inside a primitive function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// Raised on purpose by the `error` primitive.
    #[error("Error: {0}")]
    Raised(String),
    #[error("{function} expects {expected} as argument {position}, but encountered {got}")]
    BadArgument {
        function: &'static str,
        position: usize,
        expected: &'static str,
        got: String,
    },
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::VariableRedeclaration { .. } => ErrorCode::VARIABLE_REDECLARATION,
            Self::UnassignedVariable { .. } => ErrorCode::UNASSIGNED_VARIABLE,
            Self::UndefinedVariable { .. } => ErrorCode::UNDEFINED_VARIABLE,
            Self::ConstAssignment { .. } => ErrorCode::CONST_ASSIGNMENT,
            Self::InvalidNumberOfArguments { .. } => ErrorCode::INVALID_NUMBER_OF_ARGUMENTS,
            Self::CallingNonFunction { .. } => ErrorCode::CALLING_NON_FUNCTION,
            Self::TypeMismatch { .. } => ErrorCode::TYPE_MISMATCH,
            Self::NonBooleanCondition { .. } => ErrorCode::NON_BOOLEAN_CONDITION,
            Self::IllegalMemberAccess { .. } => ErrorCode::ILLEGAL_MEMBER_ACCESS,
            Self::IndexOutOfRange { .. } => ErrorCode::INDEX_OUT_OF_RANGE,
            Self::Exception { .. } => ErrorCode::EXCEPTION,
            Self::Interrupted { .. } => ErrorCode::INTERRUPTED,
            Self::StepBudgetExceeded { .. } => ErrorCode::STEP_BUDGET_EXCEEDED,
            Self::ExecTimeExceeded { .. } => ErrorCode::EXEC_TIME_EXCEEDED,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::VariableRedeclaration { span, .. }
            | Self::UnassignedVariable { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::ConstAssignment { span, .. }
            | Self::InvalidNumberOfArguments { span, .. }
            | Self::CallingNonFunction { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::NonBooleanCondition { span, .. }
            | Self::IllegalMemberAccess { span, .. }
            | Self::IndexOutOfRange { span, .. }
            | Self::Exception { span, .. }
            | Self::Interrupted { span }
            | Self::StepBudgetExceeded { span, .. }
            | Self::ExecTimeExceeded { span, .. } => *span,
        }
    }

    /// The longer explanation shown in verbose mode.
    pub fn elaboration(&self) -> Option<String> {
        let text = match self {
            Self::VariableRedeclaration { name, .. } => {
                format!("{name} has already been declared in this scope. Pick a different name.")
            }
            Self::UnassignedVariable { name, .. } => format!(
                "You can only use {name} after its declaration has been evaluated."
            ),
            Self::UndefinedVariable { name, .. } => format!(
                "Before you can read the value of {name}, you need to declare it as a variable or a constant. You can do this using the let or const keywords."
            ),
            Self::ConstAssignment { name, .. } => format!(
                "You cannot assign new values to constants. Declare {name} with let if it needs to change."
            ),
            Self::InvalidNumberOfArguments {
                callee, expected, ..
            } => format!("Try calling function {callee} again, but with {expected} arguments instead."),
            Self::CallingNonFunction { callee, .. } => {
                format!("Because {callee} is not a function, you cannot call it.")
            }
            Self::Exception { function, .. } => format!("Raised while running {function}."),
            Self::StepBudgetExceeded { .. } | Self::ExecTimeExceeded { .. } => {
                "This may be an infinite loop or an unbounded search.".to_string()
            }
            _ => return None,
        };
        Some(text)
    }

    /// Convert into a diagnostic against `source`.
    pub fn to_source_error(&self, source: &SourceFile) -> SourceError {
        let span = self.span();
        let line = source.line(span.start_line).unwrap_or_default();
        let error = SourceError::new(&source.name, self.code(), self.to_string(), span, line);
        match self.elaboration() {
            Some(text) => error.with_elaboration(text),
            None => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EvalError::TypeMismatch {
            expected: "number",
            context: " on left hand side of operation",
            got: "string",
            span: Span::synthetic(),
        };
        assert_eq!(
            err.to_string(),
            "Expected number on left hand side of operation, got string."
        );

        let err = EvalError::Exception {
            function: "error",
            error: HostError::Raised("boom".into()),
            span: Span::synthetic(),
        };
        assert_eq!(err.to_string(), "Error: boom");
        assert_eq!(err.code(), ErrorCode::EXCEPTION);
    }

    #[test]
    fn test_to_source_error() {
        let source = SourceFile::new("main.amb", "let a = 1;\na = b;");
        let err = EvalError::UndefinedVariable {
            name: "b".into(),
            span: Span::new(2, 5, 2, 6),
        };
        let diag = err.to_source_error(&source);
        assert_eq!(diag.file, "main.amb");
        assert_eq!(diag.code, ErrorCode::UNDEFINED_VARIABLE);
        assert_eq!(diag.source_line, "a = b;");
        assert_eq!(diag.render(false), "Line 2: Name b not declared.");
        assert!(diag.render(true).starts_with("Line 2, Column 5: Name b not declared.\n"));
    }

    #[test]
    fn test_control_errors_have_no_location_requirement() {
        let source = SourceFile::new("main.amb", "1;");
        let err = EvalError::Interrupted {
            span: Span::synthetic(),
        };
        let diag = err.to_source_error(&source);
        assert_eq!(diag.render(false), "Line <unknown>: Execution aborted by user.");
        assert_eq!(diag.source_line, "");
    }
}
