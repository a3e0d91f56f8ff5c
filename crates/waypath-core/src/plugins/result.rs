use crate::hooks;
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, StageResult};
use async_trait::async_trait;

/// Terminal plugin: runs the result hooks and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultPlugin;

#[async_trait(?Send)]
impl ResolverPlugin for ResultPlugin {
    fn name(&self) -> &'static str {
        "result"
    }

    async fn handle(&self, resolver: &Resolver, request: &ResolveRequest, _: &Scope) -> StageResult {
        hooks::series(resolver.result_hooks(), |hook| hook.on_result(request)).await?;
        Ok(Outcome::Resolved(request.clone()))
    }
}
