//! The pull interface every node evaluates to.
//!
//! Evaluating a node yields a [`Search`]: a lazy, finite, non-restartable
//! sequence of results. Each call to [`Search::next`] resumes the
//! depth-first exploration where the previous call left off. Nothing is
//! computed until the parent asks for it, which is what lets the scheduler
//! stop after one solution and continue later.

use std::marker::PhantomData;

use crate::context::Context;
use crate::env::Env;
use crate::error::EvalResult;
use crate::value::Value;

/// A lazily explored sequence of results.
pub trait Search {
    type Item;

    /// Produce the next result, or `None` once the sequence is drained.
    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<Self::Item>>;

    /// `true` when [`next`](Search::next) is known to return `None` without
    /// side effects. Parents use it to drop finished children early so that
    /// deterministic loops don't pile up cursors.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Results of an expression.
pub type Values = Box<dyn Search<Item = Value>>;

/// Results of a statement.
pub type Completions = Box<dyn Search<Item = Completion>>;

/// Statement-level result.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Value(Value),
    Return(Value),
    Break,
    Continue,
}

// ══════════════════════════════════════════════════════════════════════════════
// Combinators
// ══════════════════════════════════════════════════════════════════════════════

/// Exactly one result.
pub(crate) struct Once<T>(Option<T>);

pub(crate) fn once<T: 'static>(item: T) -> Box<dyn Search<Item = T>> {
    Box::new(Once(Some(item)))
}

impl<T> Search for Once<T> {
    type Item = T;

    fn next(&mut self, _cx: &mut Context) -> EvalResult<Option<T>> {
        Ok(self.0.take())
    }

    fn is_exhausted(&self) -> bool {
        self.0.is_none()
    }
}

/// No results: a failed branch.
pub(crate) struct Empty<T>(PhantomData<T>);

pub(crate) fn empty<T: 'static>() -> Box<dyn Search<Item = T>> {
    Box::new(Empty(PhantomData))
}

impl<T> Search for Empty<T> {
    type Item = T;

    fn next(&mut self, _cx: &mut Context) -> EvalResult<Option<T>> {
        Ok(None)
    }

    fn is_exhausted(&self) -> bool {
        true
    }
}

type MapFn<I, O> = Box<dyn FnMut(&mut Context, I) -> EvalResult<O>>;

/// One output per input.
pub(crate) struct Map<I, O> {
    inner: Box<dyn Search<Item = I>>,
    f: MapFn<I, O>,
}

pub(crate) fn map<I: 'static, O: 'static>(
    inner: Box<dyn Search<Item = I>>,
    f: impl FnMut(&mut Context, I) -> EvalResult<O> + 'static,
) -> Box<dyn Search<Item = O>> {
    Box::new(Map {
        inner,
        f: Box::new(f),
    })
}

impl<I, O> Search for Map<I, O> {
    type Item = O;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<O>> {
        match self.inner.next(cx)? {
            Some(item) => (self.f)(cx, item).map(Some),
            None => Ok(None),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }
}

type ExpandFn<I, O> = Box<dyn FnMut(&mut Context, I) -> EvalResult<Box<dyn Search<Item = O>>>>;

/// For each outer result, every result of the search built from it.
/// The outer sequence varies slowest.
pub(crate) struct FlatMap<I, O> {
    outer: Box<dyn Search<Item = I>>,
    expand: ExpandFn<I, O>,
    inner: Option<Box<dyn Search<Item = O>>>,
}

pub(crate) fn flat_map<I: 'static, O: 'static>(
    outer: Box<dyn Search<Item = I>>,
    expand: impl FnMut(&mut Context, I) -> EvalResult<Box<dyn Search<Item = O>>> + 'static,
) -> Box<dyn Search<Item = O>> {
    Box::new(FlatMap {
        outer,
        expand: Box::new(expand),
        inner: None,
    })
}

impl<I, O> Search for FlatMap<I, O> {
    type Item = O;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<O>> {
        loop {
            if let Some(inner) = &mut self.inner {
                if let Some(item) = inner.next(cx)? {
                    if inner.is_exhausted() {
                        self.inner = None;
                    }
                    return Ok(Some(item));
                }
                self.inner = None;
            }
            match self.outer.next(cx)? {
                Some(item) => self.inner = Some((self.expand)(cx, item)?),
                None => return Ok(None),
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_none() && self.outer.is_exhausted()
    }
}

/// Runs `inner` with `frame` pushed on the environment stack.
pub(crate) struct Scoped<T> {
    frame: Env,
    inner: Box<dyn Search<Item = T>>,
}

impl<T> Scoped<T> {
    pub(crate) fn new(frame: Env, inner: Box<dyn Search<Item = T>>) -> Self {
        Self { frame, inner }
    }
}

impl<T> Search for Scoped<T> {
    type Item = T;

    fn next(&mut self, cx: &mut Context) -> EvalResult<Option<T>> {
        cx.push_env(self.frame.clone());
        let result = self.inner.next(cx);
        cx.pop_env();
        result
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }
}

/// Pull every remaining result. Test helper and deterministic shortcut.
pub fn collect<T>(search: &mut dyn Search<Item = T>, cx: &mut Context) -> EvalResult<Vec<T>> {
    let mut items = Vec::new();
    while let Some(item) = search.next(cx)? {
        items.push(item);
    }
    Ok(items)
}
