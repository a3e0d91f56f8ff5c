//! Named-hook registry and invocation combinators.
//!
//! A [`HookMap`] keeps, per hook key, the handlers in registration order.
//! Registration order is the tie-break for every bail-style combinator: the
//! earliest registered handler that produces a result wins.
//!
//! The combinators are free functions over a handler slice so that any
//! handler shape can be driven:
//!
//! | combinator                | semantics                                            |
//! |---------------------------|------------------------------------------------------|
//! | [`call_all`]              | call every handler, ignore return values             |
//! | [`call_waterfall`]        | thread a value through every handler                 |
//! | [`call_bail`]             | first handler returning `Some` wins                  |
//! | [`series`]                | one at a time, abort on the first error              |
//! | [`series_waterfall`]      | one at a time, each output feeds the next handler    |
//! | [`series_bail`]           | one at a time, first completion with a result wins   |
//! | [`parallel`]              | all at once, done when all finish or one errors      |
//! | [`parallel_bail`]         | all at once, lowest-index result wins ([`race`])     |

pub mod race;

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

pub use race::{for_each_bail, priority_race};

/// A handler completion that may or may not carry a result.
///
/// "Has a result" is about whether the completion carried anything, not
/// about whether that thing is truthy: an explicit negative still bails.
pub trait Bail {
    fn has_result(&self) -> bool;
}

impl<T> Bail for Option<T> {
    fn has_result(&self) -> bool {
        self.is_some()
    }
}

/// Ordered handler lists keyed by hook name.
#[derive(Debug)]
pub struct HookMap<K, H> {
    taps: HashMap<K, Vec<H>>,
}

impl<K, H> Default for HookMap<K, H> {
    fn default() -> Self {
        Self {
            taps: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq, H> HookMap<K, H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the hook's list.
    pub fn tap(&mut self, key: K, handler: H) {
        self.taps.entry(key).or_default().push(handler);
    }

    /// Handlers registered for a hook, in registration order.
    #[must_use]
    pub fn handlers(&self, key: &K) -> &[H] {
        self.taps.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn is_tapped(&self, key: &K) -> bool {
        !self.handlers(key).is_empty()
    }

    /// Total number of registered handlers across all hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taps.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Call every handler in order.
pub fn call_all<H>(handlers: &[H], mut call: impl FnMut(&H)) {
    for handler in handlers {
        call(handler);
    }
}

/// Thread `init` through every handler; the last return value is the result.
pub fn call_waterfall<H, V>(handlers: &[H], init: V, mut call: impl FnMut(&H, V) -> V) -> V {
    handlers.iter().fold(init, |value, handler| call(handler, value))
}

/// Call handlers in order until one returns `Some`.
pub fn call_bail<H, R>(handlers: &[H], call: impl FnMut(&H) -> Option<R>) -> Option<R> {
    handlers.iter().find_map(call)
}

/// Run handlers one at a time; the first error aborts the rest.
pub async fn series<'h, H, E, F, Fut>(handlers: &'h [H], mut call: F) -> Result<(), E>
where
    F: FnMut(&'h H) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    for handler in handlers {
        call(handler).await?;
    }
    Ok(())
}

/// Run handlers one at a time, feeding each output into the next handler.
pub async fn series_waterfall<'h, H, V, E, F, Fut>(
    handlers: &'h [H],
    init: V,
    mut call: F,
) -> Result<V, E>
where
    F: FnMut(&'h H, V) -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    let mut value = init;
    for handler in handlers {
        value = call(handler, value).await?;
    }
    Ok(value)
}

/// Run handlers one at a time; the first completion carrying a result
/// short-circuits the rest and is returned.
pub async fn series_bail<'h, H, T, F, Fut>(handlers: &'h [H], mut call: F) -> Option<T>
where
    T: Bail,
    F: FnMut(&'h H) -> Fut,
    Fut: Future<Output = T>,
{
    for handler in handlers {
        let outcome = call(handler).await;
        if outcome.has_result() {
            return Some(outcome);
        }
    }
    None
}

/// Start every handler at once; done when all finish, or on the first error.
pub async fn parallel<'h, H, E, F, Fut>(handlers: &'h [H], call: F) -> Result<(), E>
where
    F: FnMut(&'h H) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    futures::future::try_join_all(handlers.iter().map(call))
        .await
        .map(|_| ())
}

/// Start every handler at once; the result of the lowest-index handler that
/// produced one wins. See [`race::priority_race`].
pub async fn parallel_bail<'h, H, T, F, Fut>(handlers: &'h [H], call: F) -> Option<T>
where
    T: Bail,
    F: FnMut(&'h H) -> Fut,
    Fut: Future<Output = T>,
{
    priority_race(handlers.iter().map(call)).await
}
