//! Lexical environments and the undo trail.
//!
//! A [`Frame`] maps names to bindings and points at its parent frame. Frames
//! are shared between the context's environment stack and the closures
//! created in them, so bindings live behind a `RefCell`.
//!
//! Every binding change goes through the [`Trail`]: if the frame existed
//! when the most recent checkpoint was taken, the previous binding is pushed
//! so that backtracking can put it back. Frames created after that
//! checkpoint are unreachable once it is restored and need no entries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use amble_types::Span;

use crate::value::Value;

/// Shared handle to a frame.
pub type Env = Rc<Frame>;

/// Contents of a binding.
#[derive(Clone)]
pub(crate) enum Slot {
    /// Declared by hoisting, declaration not yet evaluated.
    Hoisted,
    Value(Value),
}

#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) slot: Slot,
    pub(crate) constant: bool,
}

impl Binding {
    pub(crate) fn hoisted() -> Self {
        Self {
            slot: Slot::Hoisted,
            constant: false,
        }
    }

    pub(crate) fn value(value: Value, constant: bool) -> Self {
        Self {
            slot: Slot::Value(value),
            constant,
        }
    }
}

/// One lexical scope.
pub struct Frame {
    name: Rc<str>,
    parent: Option<Env>,
    call_site: Option<Span>,
    /// Creation order; compared against the trail watermark.
    serial: u64,
    bindings: RefCell<HashMap<Rc<str>, Binding>>,
}

impl Frame {
    pub(crate) fn new(
        name: impl Into<Rc<str>>,
        parent: Option<Env>,
        call_site: Option<Span>,
        serial: u64,
    ) -> Env {
        Rc::new(Self {
            name: name.into(),
            parent,
            call_site,
            serial,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Descriptive name: `global`, `programEnvironment`, a function name, `blockEnvironment`...
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Env> {
        self.parent.as_ref()
    }

    /// Where the call that created this frame happened, for function frames.
    pub fn call_site(&self) -> Option<Span> {
        self.call_site
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    /// Whether `name` is declared directly in this frame.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// The value bound to `name` in this frame only. Hoisted placeholders
    /// read as `None`.
    pub fn get(&self, name: &str) -> Option<Value> {
        match &self.bindings.borrow().get(name)?.slot {
            Slot::Value(value) => Some(value.clone()),
            Slot::Hoisted => None,
        }
    }

    pub(crate) fn binding(&self, name: &str) -> Option<Binding> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Install or remove a binding, returning what was there before.
    pub(crate) fn replace(&self, name: Rc<str>, binding: Option<Binding>) -> Option<Binding> {
        let mut bindings = self.bindings.borrow_mut();
        match binding {
            Some(binding) => bindings.insert(name, binding),
            None => bindings.remove(&name),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("name", &self.name)
            .field("serial", &self.serial)
            .field("names", &self.bindings.borrow().len())
            .finish()
    }
}

/// Find the innermost frame in the chain starting at `env` that binds `name`.
pub(crate) fn resolve(env: &Env, name: &str) -> Option<(Env, Binding)> {
    let mut frame = Some(env);
    while let Some(current) = frame {
        if let Some(binding) = current.binding(name) {
            return Some((current.clone(), binding));
        }
        frame = current.parent.as_ref();
    }
    None
}

// ══════════════════════════════════════════════════════════════════════════════
// Undo Trail
// ══════════════════════════════════════════════════════════════════════════════

struct TrailEntry {
    frame: Env,
    name: Rc<str>,
    previous: Option<Binding>,
}

/// Binding changes that a restore must undo.
#[derive(Default)]
pub(crate) struct Trail {
    entries: Vec<TrailEntry>,
    /// Frames with a serial below this existed at some live checkpoint.
    watermark: u64,
}

impl Trail {
    /// Write a binding into `frame`, recording the previous one if needed.
    pub(crate) fn write(&mut self, frame: &Env, name: Rc<str>, binding: Binding) {
        let previous = frame.replace(name.clone(), Some(binding));
        if frame.serial() < self.watermark {
            self.entries.push(TrailEntry {
                frame: frame.clone(),
                name,
                previous,
            });
        }
    }

    /// Start a save point. Frames created up to `next_serial` become tracked.
    pub(crate) fn mark(&mut self, next_serial: u64) -> usize {
        self.watermark = self.watermark.max(next_serial);
        self.entries.len()
    }

    /// Undo every change recorded after `save_point`; returns how many.
    pub(crate) fn unwind_to(&mut self, save_point: usize) -> usize {
        let mut undone = 0;
        while self.entries.len() > save_point {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            entry.frame.replace(entry.name, entry.previous);
            undone += 1;
        }
        undone
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.watermark = 0;
    }
}
