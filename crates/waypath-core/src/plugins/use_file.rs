use crate::request::ResolveRequest;
use crate::resolver::{Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Tries a fixed file name (`index`) inside the current directory.
#[derive(Debug, Clone)]
pub struct UseFilePlugin {
    filename: String,
    target: Stage,
}

impl UseFilePlugin {
    #[must_use]
    pub fn new(filename: impl Into<String>, target: Stage) -> Self {
        Self {
            filename: filename.into(),
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for UseFilePlugin {
    fn name(&self) -> &'static str {
        "use-file"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let path = resolver.join(&request.path, &self.filename);
        let message = format!("using path: {path}");
        let next = ResolveRequest {
            relative_path: request
                .relative_path
                .as_deref()
                .map(|relative| resolver.join(relative, &self.filename)),
            path,
            ..request.clone()
        };
        resolver
            .do_resolve(self.target, next, Some(message), scope)
            .await
    }
}
