//! Choice points: `amb` and `require`.

use std::rc::Rc;

use amble_types::ast::Expr;
use amble_types::Span;

use crate::context::{Checkpoint, Context};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::eval_expr;
use crate::search::{empty, flat_map, once, Search, Values};
use crate::value::Value;

/// `amb(e1, ..., en)`: every value of `e1`, then every value of `e2`, ...
///
/// The context is checkpointed before the first alternative and restored
/// after each one is drained, so no alternative sees the bindings another
/// one left behind.
pub(crate) struct Amb {
    alternatives: Rc<[Expr]>,
    next_alternative: usize,
    current: Option<Values>,
    checkpoint: Option<Checkpoint>,
}

pub(crate) fn amb(alternatives: Rc<[Expr]>) -> Values {
    Box::new(Amb {
        alternatives,
        next_alternative: 0,
        current: None,
        checkpoint: None,
    })
}

impl Search for Amb {
    type Item = Value;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<Value>> {
        let checkpoint = match self.checkpoint {
            Some(checkpoint) => checkpoint,
            None => *self.checkpoint.insert(cx.checkpoint()),
        };
        loop {
            if let Some(current) = &mut self.current {
                if let Some(value) = current.next(cx)? {
                    return Ok(Some(value));
                }
                self.current = None;
                cx.restore(checkpoint);
            }
            let Some(alternative) = self.alternatives.get(self.next_alternative) else {
                return Ok(None);
            };
            self.next_alternative += 1;
            self.current = Some(eval_expr(alternative, cx)?);
        }
    }

    fn is_exhausted(&self) -> bool {
        self.checkpoint.is_some()
            && self.current.is_none()
            && self.next_alternative >= self.alternatives.len()
    }
}

/// `require(p)`: one `undefined` for every `true` value of `p`.
pub(crate) fn require(args: &[Expr], span: Span, cx: &mut Context) -> EvalResult<Values> {
    let [predicate] = args else {
        return Err(EvalError::InvalidNumberOfArguments {
            callee: "require".to_string(),
            expected: "1".to_string(),
            got: args.len(),
            span,
        });
    };
    let predicate_span = predicate.span;
    Ok(flat_map(eval_expr(predicate, cx)?, move |_, value| {
        match value {
            Value::Bool(true) => Ok(once(Value::Undefined)),
            Value::Bool(false) => Ok(empty()),
            other => Err(EvalError::TypeMismatch {
                expected: "boolean",
                context: " as argument to require",
                got: other.type_name(),
                span: predicate_span,
            }),
        }
    }))
}
