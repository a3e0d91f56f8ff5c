use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;
use waypath_util::path::is_separator;

/// Appends a suffix (an extension) to the current path.
#[derive(Debug, Clone)]
pub struct AppendPlugin {
    appending: String,
    target: Stage,
}

impl AppendPlugin {
    #[must_use]
    pub fn new(appending: impl Into<String>, target: Stage) -> Self {
        Self {
            appending: appending.into(),
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for AppendPlugin {
    fn name(&self) -> &'static str {
        "append"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let next = ResolveRequest {
            path: format!("{}{}", request.path, self.appending),
            relative_path: request
                .relative_path
                .as_ref()
                .map(|relative| format!("{relative}{}", self.appending)),
            ..request.clone()
        };
        resolver
            .do_resolve(self.target, next, Some(self.appending.clone()), scope)
            .await
    }
}

/// Appends a suffix to the package name of a module request
/// (`foo/bar` becomes `foo-loader/bar`).
#[derive(Debug, Clone)]
pub struct ModuleAppendPlugin {
    appending: String,
    target: Stage,
}

impl ModuleAppendPlugin {
    #[must_use]
    pub fn new(appending: impl Into<String>, target: Stage) -> Self {
        Self {
            appending: appending.into(),
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for ModuleAppendPlugin {
    fn name(&self) -> &'static str {
        "module-append"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let specifier = request.request_str();
        let (module_name, remaining) = match specifier.find(is_separator) {
            Some(index) => specifier.split_at(index),
            None => (specifier, ""),
        };
        if module_name == "." || module_name == ".." {
            return Ok(Outcome::Continue);
        }

        let final_name = format!("{module_name}{}", self.appending);
        let next = ResolveRequest {
            request: Some(format!("{final_name}{remaining}")),
            ..request.clone()
        };
        resolver
            .do_resolve(
                self.target,
                next,
                Some(format!("module variation {final_name}")),
                scope,
            )
            .await
    }
}
