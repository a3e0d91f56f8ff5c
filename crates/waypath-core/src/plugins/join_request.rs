use crate::request::ResolveRequest;
use crate::resolver::{Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Consumes the specifier by joining it onto the current path.
#[derive(Debug, Clone)]
pub struct JoinRequestPlugin {
    target: Stage,
}

impl JoinRequestPlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for JoinRequestPlugin {
    fn name(&self) -> &'static str {
        "join-request"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let specifier = request.request_str();
        let next = ResolveRequest {
            path: resolver.join(&request.path, specifier),
            relative_path: request
                .relative_path
                .as_deref()
                .map(|relative| resolver.join(relative, specifier)),
            request: None,
            ..request.clone()
        };
        resolver.do_resolve(self.target, next, None, scope).await
    }
}
