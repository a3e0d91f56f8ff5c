use crate::error::ResolveError;
use crate::fs::{is_not_found, FileStat};
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Passes the request on only if `path` is an existing directory.
#[derive(Debug, Clone)]
pub struct DirectoryExistsPlugin {
    target: Stage,
}

impl DirectoryExistsPlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for DirectoryExistsPlugin {
    fn name(&self) -> &'static str {
        "directory-exists"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let directory = &request.path;
        match probe(resolver, directory, scope).await? {
            Some(stat) if stat.is_dir => {
                resolver
                    .do_resolve(
                        self.target,
                        request.clone(),
                        Some("existing directory".to_string()),
                        scope,
                    )
                    .await
            }
            Some(_) => {
                scope.missing(directory.clone());
                scope.log(format!("{directory} is not a directory"));
                Ok(Outcome::Continue)
            }
            None => Ok(Outcome::Continue),
        }
    }
}

/// Passes the request on only if `path` is an existing file.
#[derive(Debug, Clone)]
pub struct FileExistsPlugin {
    target: Stage,
}

impl FileExistsPlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for FileExistsPlugin {
    fn name(&self) -> &'static str {
        "file-exists"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let file = &request.path;
        match probe(resolver, file, scope).await? {
            Some(stat) if stat.is_file => {
                resolver
                    .do_resolve(
                        self.target,
                        request.clone(),
                        Some(format!("existing file: {file}")),
                        scope,
                    )
                    .await
            }
            Some(_) => {
                scope.missing(file.clone());
                scope.log(format!("{file} is not a file"));
                Ok(Outcome::Continue)
            }
            None => Ok(Outcome::Continue),
        }
    }
}

/// Stat `path`, recording it as missing when it does not exist.
async fn probe(
    resolver: &Resolver,
    path: &str,
    scope: &Scope,
) -> Result<Option<FileStat>, ResolveError> {
    match resolver.file_system().stat(path).await {
        Ok(stat) => Ok(Some(stat)),
        Err(e) if is_not_found(&e) => {
            scope.missing(path);
            scope.log(format!("{path} doesn't exist"));
            Ok(None)
        }
        Err(e) => Err(ResolveError::filesystem(path, e)),
    }
}
