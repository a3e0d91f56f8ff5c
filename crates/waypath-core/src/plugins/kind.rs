use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Routes package-style requests into module directory search.
#[derive(Debug, Clone)]
pub struct ModuleKindPlugin {
    target: Stage,
}

impl ModuleKindPlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for ModuleKindPlugin {
    fn name(&self) -> &'static str {
        "module-kind"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        if !request.module {
            return Ok(Outcome::Continue);
        }
        let next = ResolveRequest {
            module: false,
            ..request.clone()
        };
        let outcome = resolver
            .do_resolve(self.target, next, Some("resolve as module".to_string()), scope)
            .await?;
        Ok(outcome.committed())
    }
}

/// Passes on requests that may name a file (no trailing separator).
#[derive(Debug, Clone)]
pub struct FileKindPlugin {
    target: Stage,
}

impl FileKindPlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for FileKindPlugin {
    fn name(&self) -> &'static str {
        "file-kind"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        if request.directory {
            return Ok(Outcome::Continue);
        }
        let next = ResolveRequest {
            directory: false,
            ..request.clone()
        };
        resolver.do_resolve(self.target, next, None, scope).await
    }
}
