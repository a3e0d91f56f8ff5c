use crate::request::ResolveRequest;
use crate::resolver::{Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Splits the raw specifier into request, query and kind flags.
#[derive(Debug, Clone)]
pub struct ParsePlugin {
    target: Stage,
}

impl ParsePlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for ParsePlugin {
    fn name(&self) -> &'static str {
        "parse"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let mut next = request.clone();
        if let Some(parsed) = resolver.parse(request.request_str()) {
            if parsed.module {
                scope.log("Parsed request is a module");
            }
            if parsed.directory {
                scope.log("Parsed request is a directory");
            }
            next.request = Some(parsed.request);
            next.module = parsed.module;
            next.directory = parsed.directory;
            // A query already split off by an earlier pass survives re-parsing.
            if !parsed.query.is_empty() {
                next.query = parsed.query;
            }
        }
        resolver.do_resolve(self.target, next, None, scope).await
    }
}
