//! Function application and argument lists.

use std::rc::Rc;

use amble_types::ast::Expr;
use amble_types::Span;

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::eval_expr;
use crate::search::{once, Completion, Completions, Scoped, Search, Values};
use crate::sequence::{hoist, Sequence};
use crate::stack::ensure_sufficient_stack;
use crate::value::{Closure, Value};

/// The cartesian product of a list of expressions, leftmost varying slowest.
///
/// Used for call arguments and array literals. The expression at position
/// `i + 1` is only evaluated once position `i` has produced a value.
pub(crate) struct ArgsProduct {
    exprs: Rc<[Expr]>,
    /// One search per filled position, plus the one being pulled.
    streams: Vec<Values>,
    values: Vec<Value>,
    started: bool,
}

impl ArgsProduct {
    pub(crate) fn new(exprs: Rc<[Expr]>) -> Self {
        Self {
            exprs,
            streams: Vec::new(),
            values: Vec::new(),
            started: false,
        }
    }

    pub(crate) fn boxed(exprs: Rc<[Expr]>) -> Box<dyn Search<Item = Vec<Value>>> {
        Box::new(Self::new(exprs))
    }
}

impl Search for ArgsProduct {
    type Item = Vec<Value>;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<Vec<Value>>> {
        if !self.started {
            self.started = true;
            match self.exprs.first() {
                None => return Ok(Some(Vec::new())),
                Some(first) => self.streams.push(eval_expr(first, cx)?),
            }
        }
        loop {
            let Some(stream) = self.streams.last_mut() else {
                return Ok(None);
            };
            match stream.next(cx)? {
                Some(value) => {
                    self.values.push(value);
                    let filled = self.values.len();
                    if filled == self.exprs.len() {
                        let combination = self.values.clone();
                        self.values.pop();
                        return Ok(Some(combination));
                    }
                    let stream = eval_expr(&self.exprs[filled], cx)?;
                    self.streams.push(stream);
                }
                None => {
                    self.streams.pop();
                    self.values.pop();
                }
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.started && self.streams.iter().all(|stream| stream.is_exhausted())
    }
}

/// Apply a function value to evaluated arguments.
pub(crate) fn apply(
    function: &Value,
    args: Vec<Value>,
    span: Span,
    cx: &mut Context,
) -> EvalResult<Values> {
    match function {
        Value::Closure(closure) => apply_closure(closure, args, span, cx),
        Value::Builtin(builtin) => {
            builtin.arity.check(builtin.name, args.len(), span)?;
            let value = (builtin.func)(cx, &args).map_err(|error| EvalError::Exception {
                function: builtin.name,
                error,
                span,
            })?;
            Ok(once(value))
        }
        other => Err(EvalError::CallingNonFunction {
            callee: other.to_string(),
            span,
        }),
    }
}

fn apply_closure(
    closure: &Rc<Closure>,
    args: Vec<Value>,
    span: Span,
    cx: &mut Context,
) -> EvalResult<Values> {
    let function = &closure.function;
    if function.params.len() != args.len() {
        return Err(EvalError::InvalidNumberOfArguments {
            callee: function.display_name().to_string(),
            expected: function.params.len().to_string(),
            got: args.len(),
            span,
        });
    }
    let frame = cx.make_frame(function.display_name(), closure.env.clone(), Some(span));
    for (param, value) in function.params.iter().zip(args) {
        cx.bind(&frame, param.name.clone(), value, false);
    }
    hoist(&frame, &function.body, cx)?;
    let body: Completions = Box::new(Sequence::new(function.body.stmts.clone()));
    Ok(Box::new(Application {
        body: Some(Scoped::new(frame, body)),
    }))
}

/// A running call: the body pulled under the call frame.
///
/// Pulls and teardown both nest once per Amble call, so both go through
/// [`ensure_sufficient_stack`].
struct Application {
    body: Option<Scoped<Completion>>,
}

impl Search for Application {
    type Item = Value;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<Value>> {
        let Some(body) = &mut self.body else {
            return Ok(None);
        };
        let completion = ensure_sufficient_stack(|| body.next(cx))?;
        Ok(completion.map(|completion| match completion {
            Completion::Return(value) => value,
            _ => Value::Undefined,
        }))
    }

    fn is_exhausted(&self) -> bool {
        self.body.as_ref().is_none_or(|body| body.is_exhausted())
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        let body = self.body.take();
        ensure_sufficient_stack(move || drop(body));
    }
}
