//! Primitive functions installed in the global frame.
//!
//! Primitives are called through the same application path as closures
//! but produce exactly one value; their failures surface as
//! [`EvalError::Exception`](crate::EvalError::Exception).

use std::fmt;

use amble_types::Span;

use crate::context::Context;
use crate::env::Env;
use crate::error::{EvalError, EvalResult, HostError};
use crate::value::Value;

type HostResult = Result<Value, HostError>;

/// A primitive function.
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub(crate) func: fn(&mut Context, &[Value]) -> HostResult,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive bounds.
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, got: usize) -> bool {
        match self {
            Arity::Exact(n) => got == n,
            Arity::Range(min, max) => (min..=max).contains(&got),
            Arity::AtLeast(min) => got >= min,
        }
    }

    pub(crate) fn check(self, callee: &str, got: usize, span: Span) -> EvalResult<()> {
        if self.accepts(got) {
            return Ok(());
        }
        Err(EvalError::InvalidNumberOfArguments {
            callee: callee.to_string(),
            expected: self.to_string(),
            got,
            span,
        })
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::AtLeast(min) => write!(f, "at least {min}"),
        }
    }
}

macro_rules! builtin {
    ($name:literal, $arity:expr, $func:expr) => {
        Builtin {
            name: $name,
            arity: $arity,
            func: $func,
        }
    };
}

static BUILTINS: &[Builtin] = &[
    // ── Pairs & lists ──
    builtin!("pair", Arity::Exact(2), pair),
    builtin!("head", Arity::Exact(1), head),
    builtin!("tail", Arity::Exact(1), tail),
    builtin!("list", Arity::AtLeast(0), list),
    builtin!("equal", Arity::Exact(2), equal),
    // ── Predicates ──
    builtin!("is_pair", Arity::Exact(1), |_, a| Ok(matches!(a[0], Value::Pair(_)).into())),
    builtin!("is_null", Arity::Exact(1), |_, a| Ok(matches!(a[0], Value::Null).into())),
    builtin!("is_number", Arity::Exact(1), |_, a| Ok(matches!(a[0], Value::Number(_)).into())),
    builtin!("is_string", Arity::Exact(1), |_, a| Ok(matches!(a[0], Value::String(_)).into())),
    builtin!("is_boolean", Arity::Exact(1), |_, a| Ok(matches!(a[0], Value::Bool(_)).into())),
    builtin!("is_undefined", Arity::Exact(1), |_, a| Ok(matches!(a[0], Value::Undefined).into())),
    builtin!("is_array", Arity::Exact(1), |_, a| Ok(matches!(a[0], Value::Array(_)).into())),
    builtin!("is_function", Arity::Exact(1), |_, a| Ok(a[0].is_function().into())),
    // ── Output & errors ──
    builtin!("display", Arity::Range(1, 2), display),
    builtin!("error", Arity::Range(1, 2), error),
    builtin!("stringify", Arity::Exact(1), |_, a| Ok(Value::string(a[0].to_string()))),
    // ── Math ──
    builtin!("math_abs", Arity::Exact(1), |_, a| unary_math("math_abs", a, f64::abs)),
    builtin!("math_floor", Arity::Exact(1), |_, a| unary_math("math_floor", a, f64::floor)),
    builtin!("math_ceil", Arity::Exact(1), |_, a| unary_math("math_ceil", a, f64::ceil)),
    builtin!("math_sqrt", Arity::Exact(1), |_, a| unary_math("math_sqrt", a, f64::sqrt)),
    builtin!("math_round", Arity::Exact(1), |_, a| {
        unary_math("math_round", a, |n| (n + 0.5).floor())
    }),
    builtin!("math_pow", Arity::Exact(2), math_pow),
    builtin!("math_max", Arity::AtLeast(0), |_, a| {
        fold_math("math_max", a, f64::NEG_INFINITY, f64::max)
    }),
    builtin!("math_min", Arity::AtLeast(0), |_, a| {
        fold_math("math_min", a, f64::INFINITY, f64::min)
    }),
    // ── Arrays ──
    builtin!("array_length", Arity::Exact(1), array_length),
];

const CONSTANTS: &[(&str, f64)] = &[
    ("math_PI", std::f64::consts::PI),
    ("math_E", std::f64::consts::E),
    ("Infinity", f64::INFINITY),
    ("NaN", f64::NAN),
];

/// Bind every primitive and constant in `global`.
pub(crate) fn install(cx: &mut Context, global: &Env) {
    for builtin in BUILTINS {
        cx.bind(global, builtin.name, Value::Builtin(builtin), true);
    }
    for (name, value) in CONSTANTS {
        cx.bind(global, *name, Value::Number(*value), true);
    }
}

/// Look up a primitive by name.
pub fn find_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn bad_argument(
    function: &'static str,
    position: usize,
    expected: &'static str,
    got: &Value,
) -> HostError {
    HostError::BadArgument {
        function,
        position,
        expected,
        got: got.to_string(),
    }
}

fn number_arg(function: &'static str, args: &[Value], index: usize) -> Result<f64, HostError> {
    args[index]
        .as_number()
        .ok_or_else(|| bad_argument(function, index + 1, "a number", &args[index]))
}

// ── Pairs & lists ─────────────────────────────────────────────────────────────

fn pair(_cx: &mut Context, args: &[Value]) -> HostResult {
    Ok(Value::pair(args[0].clone(), args[1].clone()))
}

fn head(_cx: &mut Context, args: &[Value]) -> HostResult {
    match &args[0] {
        Value::Pair(pair) => Ok(pair.0.clone()),
        other => Err(bad_argument("head", 1, "a pair", other)),
    }
}

fn tail(_cx: &mut Context, args: &[Value]) -> HostResult {
    match &args[0] {
        Value::Pair(pair) => Ok(pair.1.clone()),
        other => Err(bad_argument("tail", 1, "a pair", other)),
    }
}

fn list(_cx: &mut Context, args: &[Value]) -> HostResult {
    Ok(Value::list(args.iter().cloned()))
}

fn equal(_cx: &mut Context, args: &[Value]) -> HostResult {
    Ok(Value::Bool(args[0].structural_equals(&args[1])))
}

// ── Output & errors ───────────────────────────────────────────────────────────

/// Strings print raw inside messages; everything else as rendered.
fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// `display(v)` / `display(v, prefix)`: record the rendering, return `v`.
fn display(cx: &mut Context, args: &[Value]) -> HostResult {
    let rendered = match args.get(1) {
        Some(prefix) => format!("{} {}", message_text(prefix), args[0]),
        None => args[0].to_string(),
    };
    cx.output.push(rendered);
    Ok(args[0].clone())
}

/// `error(v)` / `error(v, prefix)`: abort the run.
fn error(_cx: &mut Context, args: &[Value]) -> HostResult {
    let message = match args.get(1) {
        Some(prefix) => format!("{} {}", message_text(prefix), message_text(&args[0])),
        None => message_text(&args[0]),
    };
    Err(HostError::Raised(message))
}

// ── Math ──────────────────────────────────────────────────────────────────────

fn unary_math(function: &'static str, args: &[Value], f: impl Fn(f64) -> f64) -> HostResult {
    Ok(Value::Number(f(number_arg(function, args, 0)?)))
}

fn fold_math(
    function: &'static str,
    args: &[Value],
    initial: f64,
    f: impl Fn(f64, f64) -> f64,
) -> HostResult {
    let mut acc = initial;
    for index in 0..args.len() {
        let n = number_arg(function, args, index)?;
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        acc = f(acc, n);
    }
    Ok(Value::Number(acc))
}

fn math_pow(_cx: &mut Context, args: &[Value]) -> HostResult {
    let base = number_arg("math_pow", args, 0)?;
    let exponent = number_arg("math_pow", args, 1)?;
    Ok(Value::Number(base.powf(exponent)))
}

// ── Arrays ────────────────────────────────────────────────────────────────────

fn array_length(_cx: &mut Context, args: &[Value]) -> HostResult {
    match &args[0] {
        Value::Array(items) => Ok(Value::Number(items.len() as f64)),
        other => Err(bad_argument("array_length", 1, "an array", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> HostResult {
        let mut cx = Context::new(4);
        let builtin = find_builtin(name).expect("primitive exists");
        assert!(builtin.arity.accepts(args.len()));
        (builtin.func)(&mut cx, args)
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = BUILTINS.iter().map(|b| b.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTINS.len());
    }

    #[test]
    fn test_list_primitives() {
        let xs = call("list", &[Value::Number(1.0), Value::Number(2.0)]).unwrap();
        assert_eq!(xs.to_string(), "[1, [2, null]]");
        assert_eq!(call("head", &[xs.clone()]).unwrap(), Value::Number(1.0));
        assert_eq!(call("list", &[]).unwrap(), Value::Null);
        assert_eq!(
            call("head", &[Value::Null]).unwrap_err().to_string(),
            "head expects a pair as argument 1, but encountered null"
        );
    }

    #[test]
    fn test_predicates() {
        assert_eq!(call("is_null", &[Value::Null]).unwrap(), Value::Bool(true));
        assert_eq!(call("is_number", &["1".into()]).unwrap(), Value::Bool(false));
        let f = Value::Builtin(find_builtin("pair").unwrap());
        assert_eq!(call("is_function", &[f]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_math() {
        assert_eq!(call("math_round", &[Value::Number(-2.5)]).unwrap(), Value::Number(-2.0));
        assert_eq!(call("math_pow", &[Value::Number(2.0), Value::Number(10.0)]).unwrap(), Value::Number(1024.0));
        assert_eq!(
            call("math_max", &[Value::Number(3.0), Value::Number(7.0), Value::Number(5.0)]).unwrap(),
            Value::Number(7.0)
        );
        assert_eq!(call("math_min", &[]).unwrap(), Value::Number(f64::INFINITY));
    }

    #[test]
    fn test_display_and_error() {
        let mut cx = Context::new(4);
        let display = find_builtin("display").unwrap();
        let value = (display.func)(&mut cx, &[Value::Number(5.0), "x is".into()]).unwrap();
        assert_eq!(value, Value::Number(5.0));
        assert_eq!(cx.output(), ["x is 5".to_string()]);

        let err = call("error", &["boom".into()]).unwrap_err();
        assert_eq!(err.to_string(), "Error: boom");
    }

    #[test]
    fn test_arity_display() {
        assert_eq!(Arity::Exact(2).to_string(), "2");
        assert_eq!(Arity::Range(1, 2).to_string(), "1 to 2");
        assert!(!Arity::Exact(1).accepts(2));
    }
}
