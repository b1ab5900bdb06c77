//! Statement evaluation: sequences, blocks, `cut` and loops.
//!
//! A [`Sequence`] keeps an explicit cursor stack, one entry per statement
//! currently being explored. Earlier statements vary slower than later
//! ones: the top cursor is pulled, and a value from a non-last statement
//! pushes a cursor for the statement after it.

use std::rc::Rc;

use amble_types::ast::*;
use amble_types::Span;

use crate::context::Context;
use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::eval_expr;
use crate::search::{flat_map, map, once, Completion, Completions, Scoped, Search, Values};
use crate::value::{Closure, Value};

/// Register every name declared directly in `block` as a placeholder in
/// `frame`, then bind function declarations so they can be called before
/// their statement is reached.
pub(crate) fn hoist(frame: &Env, block: &Block, cx: &mut Context) -> EvalResult<()> {
    for name in block.declarations() {
        cx.declare(frame, name)?;
    }
    for stmt in block.stmts.iter() {
        if let StmtKind::FunctionDecl(function) = &stmt.kind {
            if let Some(name) = &function.name {
                let closure = Value::Closure(Rc::new(Closure {
                    function: function.clone(),
                    env: frame.clone(),
                }));
                cx.define_in(frame, name, closure, true)?;
            }
        }
    }
    Ok(())
}

/// Evaluate a statement to its lazy sequence of completions.
pub(crate) fn eval_stmt(stmt: &Stmt, cx: &mut Context) -> EvalResult<Completions> {
    cx.tick(stmt.span)?;
    match &stmt.kind {
        StmtKind::Expr(expr) => Ok(map(eval_expr(expr, cx)?, |_, value| {
            Ok(Completion::Value(value))
        })),
        StmtKind::VariableDecl { kind, name, init } => {
            let (name, constant) = (name.clone(), kind.is_const());
            Ok(map(eval_expr(init, cx)?, move |cx, value| {
                cx.define(&name, value.clone(), constant)?;
                Ok(Completion::Value(value))
            }))
        }
        // Bound while hoisting.
        StmtKind::FunctionDecl(_) => Ok(once(Completion::Value(Value::Undefined))),
        StmtKind::Return(expr) => Ok(map(eval_expr(expr, cx)?, |_, value| {
            Ok(Completion::Return(value))
        })),
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => eval_if(test, consequent, alternate.as_ref(), cx),
        StmtKind::Block(block) => eval_block(block, cx),
        StmtKind::While { test, body } => Ok(Box::new(While::new(test.clone(), body.clone()))),
        StmtKind::For(for_loop) => Ok(Box::new(For::new(for_loop.clone(), cx)?)),
        StmtKind::Break => Ok(once(Completion::Break)),
        StmtKind::Continue => Ok(once(Completion::Continue)),
        // The enclosing sequence commits when it reaches this statement.
        StmtKind::Cut => Ok(once(Completion::Value(Value::Undefined))),
    }
}

/// A block in its own frame.
pub(crate) fn eval_block(block: &Block, cx: &mut Context) -> EvalResult<Completions> {
    let frame = cx.child_frame("blockEnvironment");
    hoist(&frame, block, cx)?;
    let body: Completions = Box::new(Sequence::new(block.stmts.clone()));
    Ok(Box::new(Scoped::new(frame, body)))
}

fn eval_if(
    test: &Expr,
    consequent: &Block,
    alternate: Option<&ElseBranch>,
    cx: &mut Context,
) -> EvalResult<Completions> {
    let (consequent, alternate) = (consequent.clone(), alternate.cloned());
    let span = test.span;
    Ok(flat_map(eval_expr(test, cx)?, move |cx, value| match value {
        Value::Bool(true) => eval_block(&consequent, cx),
        Value::Bool(false) => match &alternate {
            Some(ElseBranch::Block(block)) => eval_block(block, cx),
            Some(ElseBranch::ElseIf(stmt)) => eval_stmt(stmt, cx),
            None => Ok(once(Completion::Value(Value::Undefined))),
        },
        other => Err(EvalError::NonBooleanCondition {
            got: other.type_name(),
            span,
        }),
    }))
}

// ══════════════════════════════════════════════════════════════════════════════
// Sequences
// ══════════════════════════════════════════════════════════════════════════════

/// The statements of a block, function body or program.
pub(crate) struct Sequence {
    stmts: Rc<[Stmt]>,
    /// `(statement index, its completions)`, innermost last.
    cursors: Vec<(usize, Completions)>,
    started: bool,
    /// Index of the last `cut` reached. Cursors below it are never pulled
    /// again.
    commit: Option<usize>,
}

impl Sequence {
    pub(crate) fn new(stmts: Rc<[Stmt]>) -> Self {
        Self {
            stmts,
            cursors: Vec::new(),
            started: false,
            commit: None,
        }
    }

    fn push(&mut self, index: usize, cx: &mut Context) -> EvalResult<()> {
        let stmt = self.stmts[index].clone();
        if let StmtKind::Cut = stmt.kind {
            tracing::trace!(index, line = stmt.span.start_line, "cut reached");
            self.commit = Some(index);
        }
        let completions = eval_stmt(&stmt, cx)?;
        self.cursors.push((index, completions));
        Ok(())
    }
}

impl Search for Sequence {
    type Item = Completion;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<Completion>> {
        if !self.started {
            self.started = true;
            if self.stmts.is_empty() {
                return Ok(Some(Completion::Value(Value::Undefined)));
            }
            self.push(0, cx)?;
        }
        loop {
            let Some((index, cursor)) = self.cursors.last_mut() else {
                return Ok(None);
            };
            let index = *index;
            if self.commit.is_some_and(|commit| index < commit) {
                tracing::trace!(index, "sequence committed by cut");
                self.cursors.clear();
                return Ok(None);
            }
            let Some(completion) = cursor.next(cx)? else {
                self.cursors.pop();
                continue;
            };
            if cursor.is_exhausted() {
                self.cursors.pop();
            }
            match completion {
                Completion::Value(_) if index + 1 < self.stmts.len() => self.push(index + 1, cx)?,
                other => return Ok(Some(other)),
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.started && self.cursors.is_empty()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Loops
// ══════════════════════════════════════════════════════════════════════════════

/// Where a loop is in its unfolding. Loops keep a stack of these, one per
/// part still able to produce alternatives.
enum Phase {
    Init(Completions),
    Test(Values),
    Body(Completions),
    Update(Values),
}

/// What the top phase asks the loop to do next.
enum Step {
    /// The top phase is drained.
    Pop,
    Test,
    Body,
    Update,
    Yield(Completion),
}

/// Decide the next step after a completion of the body.
fn after_body(completion: Completion) -> Step {
    match completion {
        Completion::Value(_) | Completion::Continue => Step::Update,
        Completion::Break => Step::Yield(Completion::Value(Value::Undefined)),
        Completion::Return(value) => Step::Yield(Completion::Return(value)),
    }
}

fn after_test(value: Value, span: Span) -> EvalResult<Step> {
    match value {
        Value::Bool(true) => Ok(Step::Body),
        Value::Bool(false) => Ok(Step::Yield(Completion::Value(Value::Undefined))),
        other => Err(EvalError::NonBooleanCondition {
            got: other.type_name(),
            span,
        }),
    }
}

/// Pull the top phase and work out the step it leads to, popping it early
/// when it has nothing left.
fn pull_phase(phases: &mut Vec<Phase>, test_span: Span, cx: &mut Context) -> EvalResult<Step> {
    let Some(phase) = phases.last_mut() else {
        return Ok(Step::Pop);
    };
    let (result, exhausted) = match phase {
        Phase::Init(completions) => {
            let step = completions.next(cx)?.map(|_| Step::Test);
            (step, completions.is_exhausted())
        }
        Phase::Test(values) => {
            let step = match values.next(cx)? {
                Some(value) => Some(after_test(value, test_span)?),
                None => None,
            };
            (step, values.is_exhausted())
        }
        Phase::Body(completions) => {
            let step = completions.next(cx)?.map(after_body);
            (step, completions.is_exhausted())
        }
        Phase::Update(values) => {
            let step = values.next(cx)?.map(|_| Step::Test);
            (step, values.is_exhausted())
        }
    };
    match result {
        Some(step) => {
            if exhausted {
                phases.pop();
            }
            Ok(step)
        }
        None => {
            phases.pop();
            Ok(Step::Pop)
        }
    }
}

/// `while (test) body`
pub(crate) struct While {
    test: Expr,
    body: Block,
    phases: Vec<Phase>,
    started: bool,
}

impl While {
    fn new(test: Expr, body: Block) -> Self {
        Self {
            test,
            body,
            phases: Vec::new(),
            started: false,
        }
    }
}

impl Search for While {
    type Item = Completion;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<Completion>> {
        if !self.started {
            self.started = true;
            self.phases.push(Phase::Test(eval_expr(&self.test, cx)?));
        }
        loop {
            if self.phases.is_empty() {
                return Ok(None);
            }
            match pull_phase(&mut self.phases, self.test.span, cx)? {
                Step::Pop => {}
                Step::Test | Step::Update => {
                    self.phases.push(Phase::Test(eval_expr(&self.test, cx)?))
                }
                Step::Body => self.phases.push(Phase::Body(eval_block(&self.body, cx)?)),
                Step::Yield(completion) => return Ok(Some(completion)),
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.started && self.phases.is_empty()
    }
}

/// `for (init; test; update) body`
///
/// The loop owns a frame for the variables its `let` initializer declares.
/// Each iteration runs the body under a frame holding constant copies of
/// them, so closures created in the body capture that iteration's values.
pub(crate) struct For {
    header: Rc<ForLoop>,
    frame: Env,
    phases: Vec<Phase>,
    started: bool,
}

impl For {
    fn new(header: Rc<ForLoop>, cx: &mut Context) -> EvalResult<Self> {
        let frame = cx.child_frame("forLoopEnvironment");
        for name in header.loop_variables() {
            cx.declare(&frame, name)?;
        }
        Ok(Self {
            header,
            frame,
            phases: Vec::new(),
            started: false,
        })
    }

    fn test(&self, cx: &mut Context) -> EvalResult<Phase> {
        Ok(Phase::Test(match &self.header.test {
            Some(test) => eval_expr(test, cx)?,
            None => once(Value::Bool(true)),
        }))
    }

    fn body(&self, cx: &mut Context) -> EvalResult<Phase> {
        let iteration = cx.child_frame("forBlockEnvironment");
        for name in self.header.loop_variables() {
            let value = self.frame.get(&name.name).unwrap_or(Value::Undefined);
            cx.bind(&iteration, name.name.clone(), value, true);
        }
        cx.push_env(iteration.clone());
        let body = eval_block(&self.header.body, cx);
        cx.pop_env();
        Ok(Phase::Body(Box::new(Scoped::new(iteration, body?))))
    }

    fn step(&mut self, cx: &mut Context) -> EvalResult<Option<Completion>> {
        if !self.started {
            self.started = true;
            let first = match &self.header.init {
                Some(init) => Phase::Init(eval_stmt(init, cx)?),
                None => self.test(cx)?,
            };
            self.phases.push(first);
        }
        let test_span = self.header.test.as_ref().map_or(self.header.body.span, |t| t.span);
        loop {
            if self.phases.is_empty() {
                return Ok(None);
            }
            let phase = match pull_phase(&mut self.phases, test_span, cx)? {
                Step::Pop => continue,
                Step::Test => self.test(cx)?,
                Step::Body => self.body(cx)?,
                Step::Update => match &self.header.update {
                    Some(update) => Phase::Update(eval_expr(update, cx)?),
                    None => self.test(cx)?,
                },
                Step::Yield(completion) => return Ok(Some(completion)),
            };
            self.phases.push(phase);
        }
    }
}

impl Search for For {
    type Item = Completion;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<Completion>> {
        cx.push_env(self.frame.clone());
        let result = self.step(cx);
        cx.pop_env();
        result
    }

    fn is_exhausted(&self) -> bool {
        self.started && self.phases.is_empty()
    }
}
