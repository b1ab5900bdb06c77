//! The suspend/resume driver.
//!
//! [`run`] parses and starts a program and pulls its first solution. Each
//! solution comes back as [`Outcome::SuspendedChoice`], which owns the
//! continuation; [`resume`] pulls the next one from where the search
//! stopped. A drained search ends in exactly one
//! `Outcome::Finished { value: undefined }`.

use amble_types::ast::Program;
use amble_types::{SourceError, SourceFile, Span};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::search::{map, Completion, Completions, Values};
use crate::sequence::{hoist, Sequence};
use crate::value::Value;

/// Input a REPL front-end treats as "resume the last suspended run".
pub const TRY_AGAIN: &str = "try_again";

/// Directive that switches a context to verbose diagnostics.
pub const VERBOSE_DIRECTIVE: &str = "enable verbose";

const PROGRAM_NAME: &str = "program";

/// How solutions are handed back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheduler {
    /// Suspend after every solution.
    #[default]
    NonDet,
    /// Stop at the first solution.
    Preemptive,
}

/// Run configuration, deserializable from camelCase JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub scheduler: Scheduler,
    /// Node evaluations allowed per driver step.
    pub step_budget: Option<u64>,
    /// Wall-clock limit per driver step.
    pub max_exec_time_ms: Option<u64>,
}

impl Options {
    /// Parse options handed over by a host as JSON; absent fields default.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Result of a driver step.
pub enum Outcome {
    Finished { value: Value, context: Context },
    SuspendedChoice(Suspended),
    Errored {
        diagnostics: Vec<SourceError>,
        context: Context,
    },
}

impl Outcome {
    /// `finished`, `suspended-non-det` or `error`.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Finished { .. } => "finished",
            Outcome::SuspendedChoice(_) => "suspended-non-det",
            Outcome::Errored { .. } => "error",
        }
    }

    /// The produced value, if this outcome carries one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Finished { value, .. } => Some(value),
            Outcome::SuspendedChoice(suspended) => Some(&suspended.value),
            Outcome::Errored { .. } => None,
        }
    }

    pub fn context(&self) -> &Context {
        match self {
            Outcome::Finished { context, .. } | Outcome::Errored { context, .. } => context,
            Outcome::SuspendedChoice(suspended) => &suspended.context,
        }
    }

    pub fn into_context(self) -> Context {
        match self {
            Outcome::Finished { context, .. } | Outcome::Errored { context, .. } => context,
            Outcome::SuspendedChoice(suspended) => suspended.context,
        }
    }
}

/// A run stopped after producing `value`. Owns everything needed to go on.
pub struct Suspended {
    pub value: Value,
    context: Context,
    continuation: Values,
    scheduler: Scheduler,
}

impl Suspended {
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Abandon the remaining search.
    pub fn into_context(self) -> Context {
        self.context
    }
}

/// A fresh context at the given feature level with the prelude queued.
pub fn create_context(chapter: u8) -> Context {
    Context::new(chapter)
}

/// Parse `code` and pull its first solution.
#[tracing::instrument(level = "debug", skip_all, fields(len = code.len()))]
pub fn run(code: &str, mut context: Context, options: &Options) -> Outcome {
    prepare(&mut context, options);
    if let Err(diagnostics) = load_prelude(&mut context) {
        return errored(context, diagnostics);
    }
    let source = SourceFile::new(PROGRAM_NAME, code);
    let parsed = amble_parser::parse(&source);
    let Some(program) = parsed.program else {
        tracing::debug!(errors = parsed.errors.total_errors, "parse failed");
        return errored(context, parsed.errors.errors);
    };
    context.source = source;
    start(&program, context, options)
}

/// Run an already parsed program. Diagnostics point into the context's
/// current source.
#[tracing::instrument(level = "debug", skip_all)]
pub fn run_program(program: &Program, mut context: Context, options: &Options) -> Outcome {
    prepare(&mut context, options);
    if let Err(diagnostics) = load_prelude(&mut context) {
        return errored(context, diagnostics);
    }
    start(program, context, options)
}

/// Pull the next solution of a suspended run.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resume(suspended: Suspended) -> Outcome {
    let Suspended {
        context,
        continuation,
        scheduler,
        ..
    } = suspended;
    if context.aborted {
        let diagnostics = context.errors.clone();
        return Outcome::Errored {
            diagnostics,
            context,
        };
    }
    step(continuation, context, scheduler)
}

/// Abort whatever the context is running. The environment stack is
/// unwound now; the next [`resume`] reports the interruption.
pub fn interrupt(context: &mut Context) {
    tracing::debug!("run interrupted");
    let error = EvalError::Interrupted {
        span: Span::synthetic(),
    };
    context.unwind();
    let diagnostic = error.to_source_error(&context.source);
    context.errors.push(diagnostic);
    context.aborted = true;
}

// ── Internals ─────────────────────────────────────────────────────────────────

fn prepare(context: &mut Context, options: &Options) {
    context.clear_interrupt();
    context.errors.clear();
    context.trail.clear();
    context.unwind();
    context.set_limits(options.step_budget, options.max_exec_time_ms);
}

/// Evaluate the queued prelude to completion, without limits.
fn load_prelude(context: &mut Context) -> Result<(), Vec<SourceError>> {
    let Some(prelude) = context.prelude.take() else {
        return Ok(());
    };
    let source = SourceFile::new("prelude", prelude);
    let parsed = amble_parser::parse(&source);
    let Some(program) = parsed.program else {
        return Err(parsed.errors.errors);
    };
    context.source = source;
    let (step_budget, time_limit) = context.take_limits();
    let result = drain(&program, context);
    context.set_limits(step_budget, time_limit);
    result.map_err(|error| {
        context.abort(&error);
        context.errors.clone()
    })
}

fn drain(program: &Program, context: &mut Context) -> EvalResult<()> {
    let mut search = enter_program(program, context)?;
    context.begin_step();
    while search.next(context)?.is_some() {}
    Ok(())
}

/// Push a hoisted program frame and return the program's value search.
fn enter_program(program: &Program, context: &mut Context) -> EvalResult<Values> {
    let frame = context.child_frame("programEnvironment");
    hoist(&frame, &program.body, context)?;
    context.push_outer(frame);
    let body: Completions = Box::new(Sequence::new(program.body.stmts.clone()));
    Ok(map(body, |_, completion| {
        Ok(match completion {
            Completion::Value(value) | Completion::Return(value) => value,
            Completion::Break | Completion::Continue => Value::Undefined,
        })
    }))
}

fn start(program: &Program, mut context: Context, options: &Options) -> Outcome {
    if program.directive() == Some(VERBOSE_DIRECTIVE) {
        context.verbose_errors = true;
    }
    match enter_program(program, &mut context) {
        Ok(search) => step(search, context, options.scheduler),
        Err(error) => {
            context.abort(&error);
            let diagnostics = context.errors.clone();
            errored(context, diagnostics)
        }
    }
}

/// One driver step: pull a single solution.
fn step(mut continuation: Values, mut context: Context, scheduler: Scheduler) -> Outcome {
    context.begin_step();
    match continuation.next(&mut context) {
        Ok(Some(value)) => match scheduler {
            Scheduler::NonDet => Outcome::SuspendedChoice(Suspended {
                value,
                context,
                continuation,
                scheduler,
            }),
            Scheduler::Preemptive => Outcome::Finished { value, context },
        },
        Ok(None) => Outcome::Finished {
            value: Value::Undefined,
            context,
        },
        Err(error) => {
            context.abort(&error);
            let diagnostics = context.errors.clone();
            Outcome::Errored {
                diagnostics,
                context,
            }
        }
    }
}

fn errored(mut context: Context, diagnostics: Vec<SourceError>) -> Outcome {
    context.errors = diagnostics.clone();
    Outcome::Errored {
        diagnostics,
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json() {
        let options = Options::from_json(r#"{"scheduler": "non-det", "stepBudget": 1000}"#).unwrap();
        assert_eq!(options.scheduler, Scheduler::NonDet);
        assert_eq!(options.step_budget, Some(1000));
        assert_eq!(options.max_exec_time_ms, None);

        let options =
            Options::from_json(r#"{"scheduler": "preemptive", "maxExecTimeMs": 50}"#).unwrap();
        assert_eq!(options.scheduler, Scheduler::Preemptive);
        assert_eq!(options.max_exec_time_ms, Some(50));

        assert_eq!(Options::from_json("{}").unwrap(), Options::default());
        assert!(Options::from_json(r#"{"scheduler": "eager"}"#).is_err());
    }

    #[test]
    fn test_options_serialize_camel_case() {
        let options = Options {
            step_budget: Some(5),
            ..Options::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["scheduler"], "non-det");
        assert_eq!(json["stepBudget"], 5);
    }
}
