use crate::error::ResolveError;
use crate::fs::is_not_found;
use crate::hooks::for_each_bail;
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;
use waypath_util::path::ancestors;

/// Looks for a package in module directories of every ancestor, nearest
/// first (`/a/b/node_modules`, `/a/node_modules`, `/node_modules`).
#[derive(Debug, Clone)]
pub struct ModulesInHierarchicDirectoriesPlugin {
    directories: Vec<String>,
    target: Stage,
}

impl ModulesInHierarchicDirectoriesPlugin {
    #[must_use]
    pub fn new(directories: Vec<String>, target: Stage) -> Self {
        Self {
            directories,
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for ModulesInHierarchicDirectoriesPlugin {
    fn name(&self) -> &'static str {
        "modules-in-hierarchic-directories"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let candidates: Vec<String> = ancestors(&request.path)
            .paths
            .iter()
            .flat_map(|ancestor| {
                self.directories
                    .iter()
                    .map(move |directory| resolver.join(ancestor, directory))
            })
            .collect();

        let outcome = for_each_bail(candidates, |candidate| {
            look_in(resolver, request, candidate, self.target, scope)
        })
        .await;
        outcome.unwrap_or(Ok(Outcome::Continue))
    }
}

/// Looks for a package in a single fixed directory.
#[derive(Debug, Clone)]
pub struct ModulesInRootPlugin {
    root: String,
    target: Stage,
}

impl ModulesInRootPlugin {
    #[must_use]
    pub fn new(root: impl Into<String>, target: Stage) -> Self {
        Self {
            root: root.into(),
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for ModulesInRootPlugin {
    fn name(&self) -> &'static str {
        "modules-in-root"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let next = ResolveRequest {
            path: self.root.clone(),
            request: Some(format!("./{}", request.request_str())),
            ..request.clone()
        };
        resolver
            .do_resolve(
                self.target,
                next,
                Some(format!("looking for modules in {}", self.root)),
                scope,
            )
            .await
    }
}

/// Resolve the request inside `directory` if it is an existing directory.
async fn look_in(
    resolver: &Resolver,
    request: &ResolveRequest,
    directory: String,
    target: Stage,
    scope: &Scope,
) -> StageResult {
    match resolver.file_system().stat(&directory).await {
        Ok(stat) if stat.is_dir => {
            let message = format!("looking for modules in {directory}");
            let next = ResolveRequest {
                path: directory,
                request: Some(format!("./{}", request.request_str())),
                ..request.clone()
            };
            resolver
                .do_resolve(target, next, Some(message), scope)
                .await
        }
        Ok(_) => {
            scope.log(format!("{directory} doesn't exist or is not a directory"));
            scope.missing(directory);
            Ok(Outcome::Continue)
        }
        Err(e) if is_not_found(&e) => {
            scope.log(format!("{directory} doesn't exist or is not a directory"));
            scope.missing(directory);
            Ok(Outcome::Continue)
        }
        Err(e) => Err(ResolveError::filesystem(&directory, e)),
    }
}
