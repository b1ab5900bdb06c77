//! Amble evaluator: a lazy, backtracking tree-walker.
//!
//! Every AST node evaluates to a [`Search`], a pull-driven sequence of
//! results. `amb` is a choice point over its arguments, `require` prunes
//! branches and `cut` commits a statement sequence to the choices made so
//! far. Binding changes are recorded on an undo trail so each alternative
//! starts from the state the choice point saw.
//!
//! The [`run`]/[`resume`] driver hands solutions back one at a time:
//!
//! ```no_run
//! use amble_eval::{create_context, resume, run, Options, Outcome};
//!
//! let mut outcome = run("amb(1, 2, 3);", create_context(4), &Options::default());
//! while let Outcome::SuspendedChoice(suspended) = outcome {
//!     println!("{}", suspended.value);
//!     outcome = resume(suspended);
//! }
//! ```

mod apply;
mod builtins;
mod choice;
mod context;
mod env;
mod error;
mod evaluator;
mod operators;
mod prelude;
mod scheduler;
mod search;
mod sequence;
mod stack;
mod value;

pub use amble_types::format_diagnostics;
pub use builtins::{find_builtin, Arity, Builtin};
pub use context::{Context, InterruptHandle};
pub use env::{Env, Frame};
pub use error::{EvalError, EvalResult, HostError};
pub use prelude::PRELUDE;
pub use scheduler::{
    create_context, interrupt, resume, run, run_program, Options, Outcome, Scheduler, Suspended,
    TRY_AGAIN, VERBOSE_DIRECTIVE,
};
pub use search::{collect, Completion, Completions, Search, Values};
pub use value::{format_number, Closure, Pair, Value, MAX_DISPLAY_ELEMENTS};

/// Feature level used by [`Context::default`].
pub const DEFAULT_CHAPTER: u8 = 4;
