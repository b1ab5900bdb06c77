//! Unary, binary and member operators on values.

use amble_types::ast::{BinOp, UnaryOp};
use amble_types::Span;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

const LEFT: &str = " on left hand side of operation";
const RIGHT: &str = " on right hand side of operation";

pub(crate) fn unary(op: UnaryOp, operand: &Value, span: Span) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, other) => Err(mismatch("number", "", other, span)),
        (UnaryOp::Not, other) => Err(mismatch("boolean", "", other, span)),
    }
}

pub(crate) fn binary(op: BinOp, left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
    match op {
        BinOp::StrictEq => Ok(Value::Bool(left.strict_equals(right))),
        BinOp::StrictNotEq => Ok(Value::Bool(!left.strict_equals(right))),
        BinOp::Add => eval_add(left, right, span),
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => eval_arith(op, left, right, span),
        BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
            eval_comparison(op, left, right, span)
        }
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

/// `+` adds numbers or concatenates strings; both sides must agree.
fn eval_add(left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(joined))
        }
        (Value::Number(_) | Value::String(_), other) => {
            Err(mismatch(left.type_name(), RIGHT, other, span))
        }
        (other, _) => Err(mismatch("string or number", LEFT, other, span)),
    }
}

fn eval_arith(op: BinOp, left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
    let a = left
        .as_number()
        .ok_or_else(|| mismatch("number", LEFT, left, span))?;
    let b = right
        .as_number()
        .ok_or_else(|| mismatch("number", RIGHT, right, span))?;
    let result = match op {
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        _ => a % b,
    };
    Ok(Value::Number(result))
}

// ── Comparison ────────────────────────────────────────────────────────────────

fn eval_comparison(op: BinOp, left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(_) | Value::String(_), other) => {
            return Err(mismatch(left.type_name(), RIGHT, other, span))
        }
        (other, _) => return Err(mismatch("string or number", LEFT, other, span)),
    };
    // NaN compares false both ways.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinOp::Less => ordering.is_lt(),
        BinOp::Greater => ordering.is_gt(),
        BinOp::LessEq => ordering.is_le(),
        _ => ordering.is_ge(),
    };
    Ok(Value::Bool(result))
}

// ── Member access ─────────────────────────────────────────────────────────────

/// `object[key]` on arrays and pairs (`p[0]` is the head, `p[1]` the tail).
pub(crate) fn member(object: &Value, key: &Value, span: Span) -> EvalResult<Value> {
    let (length, kind) = match object {
        Value::Array(items) => (items.len(), "array"),
        Value::Pair(_) => (2, "pair"),
        other => {
            return Err(EvalError::IllegalMemberAccess {
                property: key.to_string(),
                object: other.type_name(),
                span,
            })
        }
    };
    let Value::Number(index) = key else {
        return Err(EvalError::TypeMismatch {
            expected: "number",
            context: " as index",
            got: key.type_name(),
            span,
        });
    };
    let index = *index;
    if index < 0.0 || index.fract() != 0.0 || index >= length as f64 {
        return Err(EvalError::IndexOutOfRange {
            index,
            object: kind,
            length,
            span,
        });
    }
    let i = index as usize;
    Ok(match object {
        Value::Array(items) => items[i].clone(),
        Value::Pair(pair) if i == 0 => pair.0.clone(),
        Value::Pair(pair) => pair.1.clone(),
        _ => Value::Undefined,
    })
}

fn mismatch(expected: &'static str, context: &'static str, got: &Value, span: Span) -> EvalError {
    EvalError::TypeMismatch {
        expected,
        context,
        got: got.type_name(),
        span,
    }
}
