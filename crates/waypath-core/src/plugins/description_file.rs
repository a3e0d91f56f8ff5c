use crate::description::{load_description_file, relative_path};
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Attaches the nearest package manifest to the request.
#[derive(Debug, Clone)]
pub struct DescriptionFilePlugin {
    filenames: Vec<String>,
    target: Stage,
}

impl DescriptionFilePlugin {
    #[must_use]
    pub fn new(filenames: Vec<String>, target: Stage) -> Self {
        Self { filenames, target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for DescriptionFilePlugin {
    fn name(&self) -> &'static str {
        "description-file"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let directory = request.path.as_str();
        let Some(found) = load_description_file(resolver, directory, &self.filenames).await? else {
            for filename in &self.filenames {
                scope.missing(resolver.join(directory, filename));
            }
            scope.log("No description file found");
            return Ok(Outcome::Continue);
        };

        let relative = relative_path(&found.root, directory);
        let message = format!(
            "using description file: {} (relative path: {relative})",
            found.path
        );
        let next = ResolveRequest {
            description_file_path: Some(found.path),
            description_file_data: Some(found.data),
            description_file_root: Some(found.root),
            relative_path: Some(relative),
            ..request.clone()
        };
        let outcome = resolver
            .do_resolve(self.target, next, Some(message), scope)
            .await?;
        Ok(outcome.committed())
    }
}
