use crate::request::ResolveRequest;
use crate::resolver::{Hook, Outcome, Resolver, ResolverPlugin, Scope, StageResult};
use async_trait::async_trait;

/// Observer that writes the request's fields into the diagnostic log.
#[derive(Debug, Clone, Copy)]
pub struct LogInfoPlugin {
    source: Hook,
}

impl LogInfoPlugin {
    /// `source` is only used as the log prefix; attach the plugin to the
    /// same hook.
    #[must_use]
    pub fn new(source: Hook) -> Self {
        Self { source }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for LogInfoPlugin {
    fn name(&self) -> &'static str {
        "log-info"
    }

    async fn handle(&self, _: &Resolver, request: &ResolveRequest, scope: &Scope) -> StageResult {
        let prefix = format!("[{}] ", self.source);
        if !request.path.is_empty() {
            scope.log(format!("{prefix}Resolving in directory: {}", request.path));
        }
        if let Some(specifier) = request.request.as_deref().filter(|s| !s.is_empty()) {
            scope.log(format!("{prefix}Resolving request: {specifier}"));
        }
        if request.module {
            scope.log(format!("{prefix}Request is an module request."));
        }
        if request.directory {
            scope.log(format!("{prefix}Request is a directory request."));
        }
        if !request.query.is_empty() {
            scope.log(format!("{prefix}Resolving request query: {}", request.query));
        }
        if let Some(manifest) = &request.description_file_path {
            scope.log(format!("{prefix}Has description data from {manifest}"));
        }
        if let Some(relative) = &request.relative_path {
            scope.log(format!(
                "{prefix}Relative path from description file is: {relative}"
            ));
        }
        Ok(Outcome::Continue)
    }
}
