use crate::error::ResolveError;
use crate::hooks::for_each_bail;
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use waypath_util::path::{ancestors, is_absolute};

/// Replaces symlinked segments of the current path with their targets.
///
/// Every ancestor is probed concurrently. An absolute link target makes
/// everything above it irrelevant, so the nearest-to-the-file absolute
/// target wins; relative targets are spliced in place. A `readlink` failure
/// other than "not a link" aborts the resolve.
#[derive(Debug, Clone)]
pub struct SymlinkPlugin {
    target: Stage,
}

impl SymlinkPlugin {
    #[must_use]
    pub fn new(target: Stage) -> Self {
        Self { target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for SymlinkPlugin {
    fn name(&self) -> &'static str {
        "symlink"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let ancestors = ancestors(&request.path);
        let segments = RefCell::new(ancestors.segments);
        let contains_symlink = Cell::new(false);

        let absolute_at = for_each_bail(ancestors.paths.iter().enumerate(), |(index, path)| {
            let segments = &segments;
            let contains_symlink = &contains_symlink;
            async move {
                let target = match resolver.file_system().readlink(path).await {
                    Ok(Some(target)) => target,
                    Ok(None) => return None,
                    Err(err) => return Some(Err(ResolveError::filesystem(path, err))),
                };
                let absolute = is_absolute(&target);
                segments.borrow_mut()[index] = target;
                contains_symlink.set(true);
                absolute.then_some(Ok(index))
            }
        })
        .await
        .flatten()
        .transpose()?;

        if !contains_symlink.get() {
            return Ok(Outcome::Continue);
        }

        let mut segments = segments.into_inner();
        if let Some(index) = absolute_at {
            segments.truncate(index + 1);
        }
        let Some(resolved) = segments
            .into_iter()
            .rev()
            .reduce(|path, segment| resolver.join(&path, &segment))
        else {
            return Ok(Outcome::Continue);
        };

        let message = format!("resolved symlink to {resolved}");
        let next = ResolveRequest {
            path: resolved,
            ..request.clone()
        };
        resolver
            .do_resolve(self.target, next, Some(message), scope)
            .await
    }
}
