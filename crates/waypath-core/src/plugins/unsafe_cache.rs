use crate::request::{RequestContext, ResolveRequest};
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Decides whether a request may be served from (and stored in) the cache.
pub type CachePredicate = Rc<dyn Fn(&ResolveRequest) -> bool>;

/// Storage for final outcomes of whole resolve calls.
///
/// Nothing is ever evicted or invalidated: an entry stays valid only as
/// long as the filesystem it was computed from does not change, hence
/// "unsafe".
pub trait ResolverCache {
    /// Look up a cached outcome.
    fn get(&self, key: &UnsafeCacheKey) -> Option<Outcome>;

    /// Store an outcome.
    fn set(&self, key: UnsafeCacheKey, value: Outcome);
}

/// No-op cache implementation (always misses).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResolverCache for NoCache {
    fn get(&self, _key: &UnsafeCacheKey) -> Option<Outcome> {
        None
    }

    fn set(&self, _key: UnsafeCacheKey, _value: Outcome) {}
}

/// Unbounded in-memory cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<UnsafeCacheKey, Outcome>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ResolverCache for MemoryCache {
    fn get(&self, key: &UnsafeCacheKey) -> Option<Outcome> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: UnsafeCacheKey, value: Outcome) {
        self.entries.borrow_mut().insert(key, value);
    }
}

/// Cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnsafeCacheKey {
    pub context: RequestContext,
    pub path: String,
    pub request: Option<String>,
    pub query: String,
}

impl From<&ResolveRequest> for UnsafeCacheKey {
    fn from(request: &ResolveRequest) -> Self {
        Self {
            context: request.context.clone(),
            path: request.path.clone(),
            request: request.request.clone(),
            query: request.query.clone(),
        }
    }
}

/// Serves repeated requests from a [`ResolverCache`] without re-entering
/// the pipeline. Only successful outcomes are stored.
pub struct UnsafeCachePlugin {
    predicate: CachePredicate,
    cache: Rc<dyn ResolverCache>,
    target: Stage,
}

impl fmt::Debug for UnsafeCachePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsafeCachePlugin")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl UnsafeCachePlugin {
    #[must_use]
    pub fn new(predicate: CachePredicate, cache: Rc<dyn ResolverCache>, target: Stage) -> Self {
        Self {
            predicate,
            cache,
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for UnsafeCachePlugin {
    fn name(&self) -> &'static str {
        "unsafe-cache"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        if !(self.predicate)(request) {
            return Ok(Outcome::Continue);
        }

        let key = UnsafeCacheKey::from(request);
        if let Some(cached) = self.cache.get(&key) {
            tracing::trace!(target: "waypath", path = %key.path, "unsafe cache hit");
            return Ok(cached);
        }

        let outcome = resolver
            .do_resolve(self.target, request.clone(), None, scope)
            .await?;
        if matches!(outcome, Outcome::Resolved(_) | Outcome::Ignored(_)) {
            self.cache.set(key, outcome.clone());
        }
        Ok(outcome)
    }
}
