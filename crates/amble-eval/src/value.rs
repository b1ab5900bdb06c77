//! Runtime values.
//!
//! A closed set: numbers, strings, booleans, `null`, `undefined`, pairs,
//! arrays and the two kinds of callables. Pairs and arrays are immutable and
//! shared; `===` compares them by identity, `equal` structurally.

use std::fmt;
use std::rc::Rc;

use amble_types::ast::Function;

use crate::builtins::Builtin;
use crate::env::Env;

/// Arrays longer than this are rendered with a trailing `...`.
pub const MAX_DISPLAY_ELEMENTS: usize = 100;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Pair(Rc<Pair>),
    Array(Rc<Vec<Value>>),
    Closure(Rc<Closure>),
    Builtin(&'static Builtin),
}

/// A pair cell: head and tail.
pub struct Pair(pub Value, pub Value);

impl Drop for Pair {
    /// Unlinks uniquely owned tails one cell at a time.
    fn drop(&mut self) {
        let mut tail = std::mem::replace(&mut self.1, Value::Null);
        while let Value::Pair(cell) = tail {
            match Rc::try_unwrap(cell) {
                Ok(mut pair) => tail = std::mem::replace(&mut pair.1, Value::Null),
                Err(_) => break,
            }
        }
    }
}

/// A function value: the function node plus the frame it was created in.
pub struct Closure {
    pub function: Rc<Function>,
    pub env: Env,
}

impl Value {
    pub fn pair(head: Value, tail: Value) -> Self {
        Value::Pair(Rc::new(Pair(head, tail)))
    }

    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Build a `null`-terminated list of pairs.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        let items: Vec<Value> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Value::Null, |tail, head| Value::pair(head, tail))
    }

    /// The elements of a proper list, or `None` if this is not one.
    pub fn list_items(&self) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        let mut current = self;
        loop {
            match current {
                Value::Null => return Some(items),
                Value::Pair(pair) => {
                    items.push(pair.0.clone());
                    current = &pair.1;
                }
                _ => return None,
            }
        }
    }

    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Pair(_) => "pair",
            Value::Array(_) => "array",
            Value::Closure(_) | Value::Builtin(_) => "function",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin(_))
    }

    /// `===`: primitives by value, everything else by identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }

    /// The `equal` primitive: pairs and arrays compared element-wise.
    /// Tails are followed in a loop so long lists compare in constant stack.
    pub fn structural_equals(&self, other: &Value) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            match (left, right) {
                (Value::Pair(a), Value::Pair(b)) => {
                    if !a.0.structural_equals(&b.0) {
                        return false;
                    }
                    left = &a.1;
                    right = &b.1;
                }
                (Value::Array(a), Value::Array(b)) => {
                    return a.len() == b.len()
                        && a.iter().zip(b.iter()).all(|(x, y)| x.structural_equals(y));
                }
                _ => return left.strict_equals(right),
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.structural_equals(other)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

/// JavaScript-style number rendering: integral values without a fraction.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Pair(_) => {
                // Walk the tail iteratively so long lists don't recurse.
                let mut depth = 0;
                let mut current = self;
                while let Value::Pair(pair) = current {
                    write!(f, "[{}, ", pair.0)?;
                    depth += 1;
                    current = &pair.1;
                }
                write!(f, "{current}")?;
                for _ in 0..depth {
                    f.write_str("]")?;
                }
                Ok(())
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().take(MAX_DISPLAY_ELEMENTS).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() > MAX_DISPLAY_ELEMENTS {
                    f.write_str(", ...")?;
                }
                f.write_str("]")
            }
            Value::Closure(closure) => write!(f, "<function {}>", closure.function.display_name()),
            Value::Builtin(builtin) => write!(f, "<function {}>", builtin.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
