//! Expression evaluation.
//!
//! [`eval_expr`] turns an expression into a [`Values`] search. Operands are
//! explored left to right with the leftmost operand varying slowest, so a
//! binary expression over two choice points enumerates the left choices in
//! the outer loop and the right choices in the inner one.

use std::rc::Rc;

use amble_types::ast::*;
use amble_types::Span;

use crate::apply::{self, ArgsProduct};
use crate::choice;
use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::operators;
use crate::search::{flat_map, map, once, Values};
use crate::value::{Closure, Value};

/// Evaluate an expression to its lazy sequence of values.
pub(crate) fn eval_expr(expr: &Expr, cx: &mut Context) -> EvalResult<Values> {
    cx.tick(expr.span)?;
    match &expr.kind {
        // ── Literals ──
        ExprKind::Number(n) => Ok(once(Value::Number(*n))),
        ExprKind::String(s) => Ok(once(Value::String(s.clone()))),
        ExprKind::Bool(b) => Ok(once(Value::Bool(*b))),
        ExprKind::Null => Ok(once(Value::Null)),
        ExprKind::Undefined => Ok(once(Value::Undefined)),
        ExprKind::Array(elements) => Ok(map(ArgsProduct::boxed(elements.clone()), |_, items| {
            Ok(Value::Array(Rc::new(items)))
        })),

        // ── Names ──
        ExprKind::Identifier(ident) => Ok(once(cx.lookup(ident)?)),
        ExprKind::Assign { target, value } => eval_assign(target, value, cx),

        // ── Operators ──
        ExprKind::Unary { op, operand } => {
            let (op, span) = (*op, expr.span);
            Ok(map(eval_expr(operand, cx)?, move |_, value| {
                operators::unary(op, &value, span)
            }))
        }
        ExprKind::Binary { left, op, right } => eval_binary(left, *op, right, expr.span, cx),
        ExprKind::Logical { left, op, right } => eval_logical(left, *op, right, cx),
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => eval_conditional(test, consequent, alternate, cx),

        // ── Calls & Access ──
        ExprKind::Call { callee, args } => eval_call(callee, args, expr.span, cx),
        ExprKind::Member { object, property } => eval_member(object, property, expr.span, cx),

        // ── Functions ──
        ExprKind::Function(function) => Ok(once(Value::Closure(Rc::new(Closure {
            function: function.clone(),
            env: cx.current_env().clone(),
        })))),
    }
}

// ── Names ─────────────────────────────────────────────────────────────────────

fn eval_assign(target: &Ident, value: &Expr, cx: &mut Context) -> EvalResult<Values> {
    let target = target.clone();
    Ok(map(eval_expr(value, cx)?, move |cx, value| {
        cx.assign(&target, value.clone())?;
        Ok(value)
    }))
}

// ── Operators ─────────────────────────────────────────────────────────────────

fn eval_binary(
    left: &Expr,
    op: BinOp,
    right: &Expr,
    span: Span,
    cx: &mut Context,
) -> EvalResult<Values> {
    let right = right.clone();
    Ok(flat_map(eval_expr(left, cx)?, move |cx, lhs| {
        Ok(map(eval_expr(&right, cx)?, move |_, rhs| {
            operators::binary(op, &lhs, &rhs, span)
        }))
    }))
}

/// `a && b` is `a ? b : false`; `a || b` is `a ? true : b`.
fn eval_logical(left: &Expr, op: LogicalOp, right: &Expr, cx: &mut Context) -> EvalResult<Values> {
    let right = right.clone();
    let span = left.span;
    Ok(flat_map(eval_expr(left, cx)?, move |cx, value| {
        match (op, value) {
            (LogicalOp::And, Value::Bool(true)) | (LogicalOp::Or, Value::Bool(false)) => {
                eval_expr(&right, cx)
            }
            (_, Value::Bool(b)) => Ok(once(Value::Bool(b))),
            (_, other) => Err(EvalError::NonBooleanCondition {
                got: other.type_name(),
                span,
            }),
        }
    }))
}

fn eval_conditional(
    test: &Expr,
    consequent: &Expr,
    alternate: &Expr,
    cx: &mut Context,
) -> EvalResult<Values> {
    let (consequent, alternate) = (consequent.clone(), alternate.clone());
    let span = test.span;
    Ok(flat_map(eval_expr(test, cx)?, move |cx, value| match value {
        Value::Bool(true) => eval_expr(&consequent, cx),
        Value::Bool(false) => eval_expr(&alternate, cx),
        other => Err(EvalError::NonBooleanCondition {
            got: other.type_name(),
            span,
        }),
    }))
}

// ── Calls & Access ────────────────────────────────────────────────────────────

/// `amb` and `require` are recognised by name; everything else goes
/// through ordinary application.
fn eval_call(
    callee: &Expr,
    args: &Rc<[Expr]>,
    span: Span,
    cx: &mut Context,
) -> EvalResult<Values> {
    if let Some(ident) = callee.as_identifier() {
        match &*ident.name {
            "amb" => return Ok(choice::amb(args.clone())),
            "require" => return choice::require(args, span, cx),
            _ => {}
        }
    }
    let args = args.clone();
    Ok(flat_map(eval_expr(callee, cx)?, move |_, function| {
        Ok(flat_map(ArgsProduct::boxed(args.clone()), move |cx, values| {
            apply::apply(&function, values, span, cx)
        }))
    }))
}

fn eval_member(
    object: &Expr,
    property: &MemberProperty,
    span: Span,
    cx: &mut Context,
) -> EvalResult<Values> {
    let objects = eval_expr(object, cx)?;
    match property {
        MemberProperty::Computed(index) => {
            let index = index.clone();
            Ok(flat_map(objects, move |cx, object| {
                Ok(map(eval_expr(&index, cx)?, move |_, key| {
                    operators::member(&object, &key, span)
                }))
            }))
        }
        MemberProperty::Named(name) => {
            let name = name.name.clone();
            Ok(map(objects, move |_, object| {
                Err(EvalError::IllegalMemberAccess {
                    property: name.to_string(),
                    object: object.type_name(),
                    span,
                })
            }))
        }
    }
}
