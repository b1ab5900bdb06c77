//! Per-run evaluation state.
//!
//! The [`Context`] owns the environment stack, the undo trail, the
//! accumulated diagnostics and the limits of the current driver step. It is
//! moved into every [`Outcome`](crate::Outcome) so a front-end can keep
//! running programs against the same bindings.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use amble_types::ast::Ident;
use amble_types::{format_diagnostics, SourceError, SourceFile, Span};

use crate::builtins;
use crate::env::{resolve, Binding, Env, Frame, Slot, Trail};
use crate::error::{EvalError, EvalResult};
use crate::prelude::PRELUDE;
use crate::value::Value;

/// How often (in steps) the wall clock is consulted.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Restorable position of the mutable context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    trail_len: usize,
    errors_len: usize,
    env_depth: usize,
}

/// Thread-safe handle for stopping a running evaluation.
#[derive(Debug, Clone)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    /// Request an abort. The evaluator observes it at its next step.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub struct Context {
    /// Innermost frame last.
    pub(crate) environments: Vec<Env>,
    /// Frames below this depth survive an unwind.
    pub(crate) outer_environments: usize,
    pub(crate) errors: Vec<SourceError>,
    pub(crate) trail: Trail,
    next_serial: u64,
    /// Language feature level the context was created for.
    pub chapter: u8,
    /// Source run before the first user program.
    pub(crate) prelude: Option<&'static str>,
    /// Text written by `display`.
    pub(crate) output: Vec<String>,
    pub(crate) verbose_errors: bool,
    /// The source currently being evaluated, for diagnostics.
    pub(crate) source: SourceFile,
    /// Set by [`crate::interrupt`]; the next resume reports the abort.
    pub(crate) aborted: bool,

    // ── Limits ──
    steps: u64,
    step_budget: Option<u64>,
    time_limit: Option<Duration>,
    deadline: Option<Instant>,
    interrupt: Arc<AtomicBool>,
}

impl Context {
    /// A fresh context: primitives installed in the global frame and the
    /// prelude queued for the first run.
    pub fn new(chapter: u8) -> Self {
        let global = Frame::new("global", None, None, 0);
        let mut cx = Self {
            environments: vec![global.clone()],
            outer_environments: 1,
            errors: Vec::new(),
            trail: Trail::default(),
            next_serial: 1,
            chapter,
            prelude: Some(PRELUDE),
            output: Vec::new(),
            verbose_errors: false,
            source: SourceFile::new("prelude", ""),
            aborted: false,
            steps: 0,
            step_budget: None,
            time_limit: None,
            deadline: None,
            interrupt: Arc::new(AtomicBool::new(false)),
        };
        builtins::install(&mut cx, &global);
        cx
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Diagnostics of the last aborted run.
    pub fn errors(&self) -> &[SourceError] {
        &self.errors
    }

    /// Everything `display` has written so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn verbose_errors(&self) -> bool {
        self.verbose_errors
    }

    /// The primitives frame.
    pub fn global(&self) -> &Env {
        &self.environments[0]
    }

    /// The innermost frame on the environment stack.
    pub fn current_env(&self) -> &Env {
        let last = self.environments.len() - 1;
        &self.environments[last]
    }

    pub fn environment_depth(&self) -> usize {
        self.environments.len()
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle(self.interrupt.clone())
    }

    // ── Frames ────────────────────────────────────────────────────────────

    pub(crate) fn make_frame(
        &mut self,
        name: impl Into<Rc<str>>,
        parent: Env,
        call_site: Option<Span>,
    ) -> Env {
        let serial = self.next_serial;
        self.next_serial += 1;
        Frame::new(name, Some(parent), call_site, serial)
    }

    /// A frame whose parent is the current environment.
    pub(crate) fn child_frame(&mut self, name: &'static str) -> Env {
        let parent = self.current_env().clone();
        self.make_frame(name, parent, None)
    }

    pub(crate) fn push_env(&mut self, env: Env) {
        self.environments.push(env);
    }

    pub(crate) fn pop_env(&mut self) {
        if self.environments.len() > self.outer_environments {
            self.environments.pop();
        }
    }

    /// Push a frame that survives unwinding, such as a program frame.
    pub(crate) fn push_outer(&mut self, env: Env) {
        self.environments.truncate(self.outer_environments);
        self.environments.push(env);
        self.outer_environments = self.environments.len();
    }

    /// Drop every non-outer frame from the stack.
    pub(crate) fn unwind(&mut self) {
        self.environments.truncate(self.outer_environments);
    }

    // ── Bindings ──────────────────────────────────────────────────────────

    /// Register a hoisting placeholder for `name` in `frame`.
    pub(crate) fn declare(&mut self, frame: &Env, name: &Ident) -> EvalResult<()> {
        if frame.contains(&name.name) {
            return Err(EvalError::VariableRedeclaration {
                name: name.name.clone(),
                span: name.span,
            });
        }
        self.trail.write(frame, name.name.clone(), Binding::hoisted());
        Ok(())
    }

    /// Bind a name without checks. Used for parameters and primitives.
    pub(crate) fn bind(
        &mut self,
        frame: &Env,
        name: impl Into<Rc<str>>,
        value: Value,
        constant: bool,
    ) {
        self.trail
            .write(frame, name.into(), Binding::value(value, constant));
    }

    /// Give a hoisted name in `frame` its value.
    pub(crate) fn define_in(
        &mut self,
        frame: &Env,
        name: &Ident,
        value: Value,
        constant: bool,
    ) -> EvalResult<()> {
        match frame.binding(&name.name) {
            Some(Binding {
                slot: Slot::Hoisted,
                ..
            }) => {
                self.trail
                    .write(frame, name.name.clone(), Binding::value(value, constant));
                Ok(())
            }
            _ => Err(EvalError::VariableRedeclaration {
                name: name.name.clone(),
                span: name.span,
            }),
        }
    }

    /// Give a hoisted name in the current frame its value.
    pub(crate) fn define(&mut self, name: &Ident, value: Value, constant: bool) -> EvalResult<()> {
        let frame = self.current_env().clone();
        self.define_in(&frame, name, value, constant)
    }

    pub(crate) fn lookup(&self, name: &Ident) -> EvalResult<Value> {
        match resolve(self.current_env(), &name.name) {
            Some((_, Binding {
                slot: Slot::Value(value),
                ..
            })) => Ok(value),
            Some(_) => Err(EvalError::UnassignedVariable {
                name: name.name.clone(),
                span: name.span,
            }),
            None => Err(EvalError::UndefinedVariable {
                name: name.name.clone(),
                span: name.span,
            }),
        }
    }

    pub(crate) fn assign(&mut self, name: &Ident, value: Value) -> EvalResult<()> {
        let Some((frame, binding)) = resolve(self.current_env(), &name.name) else {
            return Err(EvalError::UndefinedVariable {
                name: name.name.clone(),
                span: name.span,
            });
        };
        if binding.constant {
            return Err(EvalError::ConstAssignment {
                name: name.name.clone(),
                span: name.span,
            });
        }
        if let Slot::Hoisted = binding.slot {
            return Err(EvalError::UnassignedVariable {
                name: name.name.clone(),
                span: name.span,
            });
        }
        self.trail
            .write(&frame, name.name.clone(), Binding::value(value, false));
        Ok(())
    }

    // ── Checkpoints ───────────────────────────────────────────────────────

    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        let trail_len = self.trail.mark(self.next_serial);
        tracing::trace!(trail_len, depth = self.environments.len(), "checkpoint");
        Checkpoint {
            trail_len,
            errors_len: self.errors.len(),
            env_depth: self.environments.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        let undone = self.trail.unwind_to(checkpoint.trail_len);
        self.errors.truncate(checkpoint.errors_len);
        self.environments
            .truncate(checkpoint.env_depth.max(self.outer_environments));
        tracing::trace!(undone, trail_len = checkpoint.trail_len, "restore");
    }

    // ── Limits ────────────────────────────────────────────────────────────

    pub(crate) fn set_limits(&mut self, step_budget: Option<u64>, time_limit_ms: Option<u64>) {
        self.step_budget = step_budget;
        self.time_limit = time_limit_ms.map(Duration::from_millis);
    }

    /// Remove the limits, returning them in [`set_limits`](Self::set_limits) form.
    pub(crate) fn take_limits(&mut self) -> (Option<u64>, Option<u64>) {
        let step_budget = self.step_budget.take();
        let time_limit = self.time_limit.take().map(|limit| limit.as_millis() as u64);
        (step_budget, time_limit)
    }

    /// Reset the per-step counters at the start of a driver step.
    pub(crate) fn begin_step(&mut self) {
        self.steps = 0;
        self.deadline = self.time_limit.map(|limit| Instant::now() + limit);
    }

    /// Clear any pending interrupt request.
    pub(crate) fn clear_interrupt(&mut self) {
        self.interrupt.store(false, Ordering::Relaxed);
        self.aborted = false;
    }

    /// Count one node evaluation against the limits of this driver step.
    pub(crate) fn tick(&mut self, span: Span) -> EvalResult<()> {
        self.steps += 1;
        if self.interrupt.load(Ordering::Relaxed) {
            return Err(EvalError::Interrupted { span });
        }
        if let Some(budget) = self.step_budget {
            if self.steps > budget {
                return Err(EvalError::StepBudgetExceeded { budget, span });
            }
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0 {
            if let (Some(deadline), Some(limit)) = (self.deadline, self.time_limit) {
                if Instant::now() > deadline {
                    return Err(EvalError::ExecTimeExceeded {
                        limit_ms: limit.as_millis() as u64,
                        span,
                    });
                }
            }
        }
        Ok(())
    }

    // ── Errors ────────────────────────────────────────────────────────────

    /// Render the accumulated diagnostics in the context's verbosity.
    pub fn format_errors(&self) -> String {
        format_diagnostics(&self.errors, self.verbose_errors)
    }

    /// Unwind the stack and record `error` as a diagnostic.
    pub(crate) fn abort(&mut self, error: &EvalError) {
        tracing::debug!(code = %error.code(), %error, "run aborted");
        self.unwind();
        let diagnostic = error.to_source_error(&self.source);
        self.errors.push(diagnostic);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(crate::DEFAULT_CHAPTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Ident {
        Ident::new(name, Span::point(1, 1))
    }

    #[test]
    fn test_new_context_has_primitives() {
        let cx = Context::new(4);
        assert_eq!(cx.environment_depth(), 1);
        assert!(cx.global().contains("pair"));
        assert!(cx.global().get("math_PI").is_some());
        assert!(cx.prelude.is_some());
    }

    #[test]
    fn test_hoisted_name_reads_as_unassigned() {
        let mut cx = Context::new(4);
        let frame = cx.child_frame("programEnvironment");
        cx.push_outer(frame.clone());
        cx.declare(&frame, &ident("x")).unwrap();
        assert!(matches!(
            cx.lookup(&ident("x")),
            Err(EvalError::UnassignedVariable { .. })
        ));
        assert!(matches!(
            cx.assign(&ident("x"), Value::Null),
            Err(EvalError::UnassignedVariable { .. })
        ));
        assert!(matches!(
            cx.lookup(&ident("y")),
            Err(EvalError::UndefinedVariable { .. })
        ));
        cx.define(&ident("x"), Value::Number(1.0), true).unwrap();
        assert_eq!(cx.lookup(&ident("x")).unwrap(), Value::Number(1.0));
        assert!(matches!(
            cx.define(&ident("x"), Value::Number(2.0), true),
            Err(EvalError::VariableRedeclaration { .. })
        ));
        assert!(matches!(
            cx.assign(&ident("x"), Value::Null),
            Err(EvalError::ConstAssignment { .. })
        ));
    }

    #[test]
    fn test_declare_twice_is_redeclaration() {
        let mut cx = Context::new(4);
        let frame = cx.child_frame("blockEnvironment");
        cx.declare(&frame, &ident("a")).unwrap();
        assert!(matches!(
            cx.declare(&frame, &ident("a")),
            Err(EvalError::VariableRedeclaration { .. })
        ));
    }

    #[test]
    fn test_restore_undoes_assignments() {
        let mut cx = Context::new(4);
        let frame = cx.child_frame("programEnvironment");
        cx.push_outer(frame.clone());
        cx.declare(&frame, &ident("a")).unwrap();
        cx.define(&ident("a"), Value::Number(1.0), false).unwrap();

        let checkpoint = cx.checkpoint();
        cx.assign(&ident("a"), Value::Number(2.0)).unwrap();
        let block = cx.child_frame("blockEnvironment");
        cx.push_env(block);
        assert_eq!(cx.environment_depth(), 3);

        cx.restore(checkpoint);
        assert_eq!(cx.lookup(&ident("a")).unwrap(), Value::Number(1.0));
        assert_eq!(cx.environment_depth(), 2);
    }

    #[test]
    fn test_step_budget() {
        let mut cx = Context::new(4);
        cx.set_limits(Some(2), None);
        cx.begin_step();
        let span = Span::point(1, 1);
        assert!(cx.tick(span).is_ok());
        assert!(cx.tick(span).is_ok());
        assert!(matches!(
            cx.tick(span),
            Err(EvalError::StepBudgetExceeded { budget: 2, .. })
        ));
        cx.begin_step();
        assert!(cx.tick(span).is_ok());
    }

    #[test]
    fn test_interrupt_handle() {
        let mut cx = Context::new(4);
        cx.interrupt_handle().interrupt();
        assert!(matches!(
            cx.tick(Span::point(1, 1)),
            Err(EvalError::Interrupted { .. })
        ));
        cx.clear_interrupt();
        assert!(cx.tick(Span::point(1, 1)).is_ok());
    }
}
