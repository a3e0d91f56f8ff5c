use crate::request::ResolveRequest;
use crate::resolver::{Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Forwards the request unchanged.
#[derive(Debug, Clone)]
pub struct NextPlugin {
    target: Stage,
}

impl NextPlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for NextPlugin {
    fn name(&self) -> &'static str {
        "next"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        resolver
            .do_resolve(self.target, request.clone(), None, scope)
            .await
    }
}

/// Forwards the request unchanged, logging under a message.
#[derive(Debug, Clone)]
pub struct TryNextPlugin {
    message: Option<String>,
    target: Stage,
}

impl TryNextPlugin {
    #[must_use]
    pub fn new(message: Option<&str>, target: Stage) -> Self {
        Self {
            message: message.map(str::to_string),
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for TryNextPlugin {
    fn name(&self) -> &'static str {
        "try-next"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        resolver
            .do_resolve(self.target, request.clone(), self.message.clone(), scope)
            .await
    }
}
