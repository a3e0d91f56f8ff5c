//! Stage pipeline orchestrator.
//!
//! A [`Resolver`] owns a [`HookMap`] of plugins keyed by [`Hook`]. Resolving
//! a request through a [`Stage`] runs four phases in order:
//!
//! 1. `<stage>-step` observers (sync, notify only),
//! 2. `before-<stage>` plugins (async series, first result wins),
//! 3. `<stage>` plugins (started together, lowest-index result wins),
//! 4. `after-<stage>` plugins (async series, first result wins).
//!
//! The first phase that produces a result ends the stage. A stage with no
//! result reports [`Outcome::Continue`], which is ordinary control flow: the
//! calling plugin is free to try something else. Only [`Resolver::resolve`]
//! turns an unresolved outermost call into [`ResolveError::NotFound`].

mod scope;

pub use scope::{Fingerprint, Scope};

use crate::error::ResolveError;
use crate::fs::FileSystem;
use crate::hooks::{self, Bail, HookMap};
use crate::join::JoinMemo;
use crate::request::{parse_identifier, ParsedIdentifier, RequestContext, ResolveRequest};
use async_trait::async_trait;
use futures::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::rc::Rc;

/// Named points of the resolution pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolve,
    NewResolve,
    ParsedResolve,
    DescribedResolve,
    RawModule,
    Module,
    Relative,
    DescribedRelative,
    Directory,
    ExistingDirectory,
    UndescribedRawFile,
    RawFile,
    File,
    ExistingFile,
    Resolved,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::NewResolve => "new-resolve",
            Self::ParsedResolve => "parsed-resolve",
            Self::DescribedResolve => "described-resolve",
            Self::RawModule => "raw-module",
            Self::Module => "module",
            Self::Relative => "relative",
            Self::DescribedRelative => "described-relative",
            Self::Directory => "directory",
            Self::ExistingDirectory => "existing-directory",
            Self::UndescribedRawFile => "undescribed-raw-file",
            Self::RawFile => "raw-file",
            Self::File => "file",
            Self::ExistingFile => "existing-file",
            Self::Resolved => "resolved",
        }
    }

    /// Every stage, in pipeline order.
    pub const ALL: [Stage; 15] = [
        Self::Resolve,
        Self::NewResolve,
        Self::ParsedResolve,
        Self::DescribedResolve,
        Self::RawModule,
        Self::Module,
        Self::Relative,
        Self::DescribedRelative,
        Self::Directory,
        Self::ExistingDirectory,
        Self::UndescribedRawFile,
        Self::RawFile,
        Self::File,
        Self::ExistingFile,
        Self::Resolved,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of a stage's async phases a plugin is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Before,
    Main,
    After,
}

/// A hook name: a stage plus a phase (`before-file`, `file`, `after-file`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hook {
    pub phase: Phase,
    pub stage: Stage,
}

impl Hook {
    #[must_use]
    pub fn before(stage: Stage) -> Self {
        Self {
            phase: Phase::Before,
            stage,
        }
    }

    #[must_use]
    pub fn on(stage: Stage) -> Self {
        Self {
            phase: Phase::Main,
            stage,
        }
    }

    #[must_use]
    pub fn after(stage: Stage) -> Self {
        Self {
            phase: Phase::After,
            stage,
        }
    }
}

impl From<Stage> for Hook {
    fn from(stage: Stage) -> Self {
        Self::on(stage)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Before => write!(f, "before-{}", self.stage),
            Phase::Main => write!(f, "{}", self.stage),
            Phase::After => write!(f, "after-{}", self.stage),
        }
    }
}

/// What a plugin (or a whole stage) reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Not applicable; siblings and later phases may try.
    Continue,
    /// Resolved to `request.path`.
    Resolved(ResolveRequest),
    /// Deliberately not resolved (mapped to `false`); final.
    Ignored(ResolveRequest),
    /// Committed without a result: blocks later siblings and phases. A
    /// stage never reports this; it becomes [`Outcome::Continue`] at the
    /// stage boundary.
    Stop,
}

impl Outcome {
    /// A plugin that has chosen an interpretation of the request must not
    /// let siblings try another one when its own path fails.
    #[must_use]
    pub fn committed(self) -> Self {
        match self {
            Self::Continue => Self::Stop,
            other => other,
        }
    }

    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Result type of plugins and stages.
pub type StageResult = Result<Outcome, ResolveError>;

impl Bail for StageResult {
    fn has_result(&self) -> bool {
        !matches!(self, Ok(Outcome::Continue))
    }
}

/// A request transformer attached to a hook.
#[async_trait(?Send)]
pub trait ResolverPlugin {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult;
}

/// Observer of the final request before a successful resolve returns.
#[async_trait(?Send)]
pub trait ResultHook {
    async fn on_result(&self, request: &ResolveRequest) -> Result<(), ResolveError>;
}

type StepHook = Box<dyn Fn(Stage, &ResolveRequest)>;
type NoResolveHook = Box<dyn Fn(&ResolveRequest, &ResolveError)>;

/// What a successful resolve points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Resolved path with the query appended.
    Path(String),
    /// The request was mapped to `false` and must not be loaded.
    Ignored,
}

/// Successful outcome of [`Resolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
    pub resource: Resource,
    /// The final request, including manifest data.
    pub request: ResolveRequest,
    /// Diagnostic log of the call.
    pub log: Vec<String>,
    /// Paths probed along the way that did not exist.
    pub missing: Vec<String>,
}

impl Resolved {
    /// Resolved path with query, or `None` when ignored.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match &self.resource {
            Resource::Path(path) => Some(path),
            Resource::Ignored => None,
        }
    }
}

/// The pipeline: a filesystem, plugins per hook, and the notify hooks.
pub struct Resolver {
    fs: Rc<dyn FileSystem>,
    plugins: HookMap<Hook, Rc<dyn ResolverPlugin>>,
    step_hooks: Vec<StepHook>,
    no_resolve_hooks: Vec<NoResolveHook>,
    result_hooks: Vec<Rc<dyn ResultHook>>,
    joins: Rc<JoinMemo>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("plugins", &self.plugins.len())
            .field("step_hooks", &self.step_hooks.len())
            .field("result_hooks", &self.result_hooks.len())
            .finish_non_exhaustive()
    }
}

impl Resolver {
    #[must_use]
    pub fn new(fs: Rc<dyn FileSystem>) -> Self {
        Self {
            fs,
            plugins: HookMap::new(),
            step_hooks: Vec::new(),
            no_resolve_hooks: Vec::new(),
            result_hooks: Vec::new(),
            joins: Rc::new(JoinMemo::new()),
        }
    }

    /// Share a join memo with other resolvers.
    #[must_use]
    pub fn with_join_memo(mut self, joins: Rc<JoinMemo>) -> Self {
        self.joins = joins;
        self
    }

    /// Attach a plugin to a hook. Registration order decides ties.
    pub fn plugin(&mut self, hook: impl Into<Hook>, plugin: impl ResolverPlugin + 'static) {
        self.plugins.tap(hook.into(), Rc::new(plugin));
    }

    /// Attach a shared plugin instance.
    pub fn plugin_rc(&mut self, hook: Hook, plugin: Rc<dyn ResolverPlugin>) {
        self.plugins.tap(hook, plugin);
    }

    /// Number of attached plugins across all hooks.
    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Observe every stage invocation.
    pub fn on_step(&mut self, hook: impl Fn(Stage, &ResolveRequest) + 'static) {
        self.step_hooks.push(Box::new(hook));
    }

    /// Observe every outermost resolve that ends in `NotFound`.
    pub fn on_no_resolve(&mut self, hook: impl Fn(&ResolveRequest, &ResolveError) + 'static) {
        self.no_resolve_hooks.push(Box::new(hook));
    }

    /// Run `hook` on the final request of every successful resolve.
    pub fn on_result(&mut self, hook: impl ResultHook + 'static) {
        self.result_hooks.push(Rc::new(hook));
    }

    #[must_use]
    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    #[must_use]
    pub fn plugins(&self, hook: Hook) -> &[Rc<dyn ResolverPlugin>] {
        self.plugins.handlers(&hook)
    }

    pub(crate) fn result_hooks(&self) -> &[Rc<dyn ResultHook>] {
        &self.result_hooks
    }

    /// Memoized path join.
    #[must_use]
    pub fn join(&self, path: &str, request: &str) -> String {
        self.joins.join(path, request)
    }

    #[must_use]
    pub fn parse(&self, identifier: &str) -> Option<ParsedIdentifier> {
        parse_identifier(identifier)
    }

    /// Resolve `request` as seen from the directory `path`.
    pub async fn resolve(
        &self,
        context: &RequestContext,
        path: &str,
        request: &str,
    ) -> Result<Resolved, ResolveError> {
        let scope = Scope::root();
        let initial = ResolveRequest::new(context.clone(), path, request);
        let message = format!("resolve '{request}' in '{path}'");

        let outcome = self
            .do_resolve(Stage::Resolve, initial.clone(), Some(message), &scope)
            .await;
        let (log, missing) = scope.finish();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!(target: "waypath", request, path, error = %err, "resolve failed");
                return Err(err);
            }
        };

        let (resource, final_request) = match outcome {
            Outcome::Resolved(found) => (
                Resource::Path(format!("{}{}", found.path, found.query)),
                found,
            ),
            Outcome::Ignored(found) => (Resource::Ignored, found),
            Outcome::Continue | Outcome::Stop => {
                let err = ResolveError::NotFound {
                    request: request.to_string(),
                    path: path.to_string(),
                    details: log.join("\n"),
                    missing,
                };
                hooks::call_all(&self.no_resolve_hooks, |hook| hook(&initial, &err));
                tracing::debug!(target: "waypath", request, path, "not found");
                return Err(err);
            }
        };

        tracing::debug!(target: "waypath", request, path, resource = ?resource, "resolved");
        Ok(Resolved {
            resource,
            request: final_request,
            log,
            missing,
        })
    }

    /// Resolve without a runtime. Only valid when every filesystem
    /// operation the pipeline can reach completes immediately (for example
    /// with [`crate::fs::SyncFileSystem`]); otherwise returns
    /// [`ResolveError::NotSync`].
    pub fn resolve_sync(
        &self,
        context: &RequestContext,
        path: &str,
        request: &str,
    ) -> Result<Resolved, ResolveError> {
        if self.fs.needs_runtime() {
            return Err(ResolveError::NotSync);
        }
        self.resolve(context, path, request)
            .now_or_never()
            .unwrap_or(Err(ResolveError::NotSync))
    }

    /// Run `request` through `stage`.
    ///
    /// `message` describes why the stage is entered; it heads the stage's
    /// diagnostic lines in the parent scope.
    pub fn do_resolve<'a>(
        &'a self,
        stage: Stage,
        request: ResolveRequest,
        message: Option<String>,
        scope: &'a Scope,
    ) -> LocalBoxFuture<'a, StageResult> {
        async move {
            let fingerprint = Fingerprint::new(stage, &request);
            if scope.contains(&fingerprint) {
                scope.log("abort resolving because of recursion");
                let stack = scope
                    .stack()
                    .iter()
                    .chain(std::iter::once(&fingerprint))
                    .map(ToString::to_string)
                    .collect();
                return Err(ResolveError::Recursion { stack });
            }
            let stack = scope.pushed(fingerprint);

            tracing::trace!(
                target: "waypath",
                stage = stage.as_str(),
                path = %request.path,
                request = request.request_str(),
                "stage"
            );
            hooks::call_all(&self.step_hooks, |hook| hook(stage, &request));

            let before_message = message.as_ref().map(|m| format!("before {m}"));
            let inner = scope.child(&stack);
            let before = hooks::series_bail(self.plugins(Hook::before(stage)), |plugin| {
                plugin.handle(self, &request, &inner)
            })
            .await;
            inner.flush_into(scope, before_message.as_deref(), true);
            if let Some(result) = before {
                return settle(result);
            }

            let inner = scope.child(&stack);
            let main = hooks::parallel_bail(self.plugins(Hook::on(stage)), |plugin| {
                plugin.handle(self, &request, &inner)
            })
            .await;
            inner.flush_into(scope, message.as_deref(), false);
            if let Some(result) = main {
                return settle(result);
            }

            let after_message = message.as_ref().map(|m| format!("after {m}"));
            let inner = scope.child(&stack);
            let after = hooks::series_bail(self.plugins(Hook::after(stage)), |plugin| {
                plugin.handle(self, &request, &inner)
            })
            .await;
            inner.flush_into(scope, after_message.as_deref(), true);
            if let Some(result) = after {
                return settle(result);
            }

            Ok(Outcome::Continue)
        }
        .boxed_local()
    }
}

/// A phase's committed result as seen by the stage's caller.
fn settle(result: StageResult) -> StageResult {
    match result? {
        Outcome::Stop => Ok(Outcome::Continue),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::SyncFileSystem;
    use futures::executor::block_on;
    use std::cell::RefCell;

    /// Resolves every request to a fixed path.
    struct Answer(&'static str);

    #[async_trait(?Send)]
    impl ResolverPlugin for Answer {
        fn name(&self) -> &'static str {
            "answer"
        }

        async fn handle(&self, _: &Resolver, request: &ResolveRequest, _: &Scope) -> StageResult {
            Ok(Outcome::Resolved(ResolveRequest {
                path: self.0.to_string(),
                ..request.clone()
            }))
        }
    }

    /// Commits without a result.
    struct Refuse;

    #[async_trait(?Send)]
    impl ResolverPlugin for Refuse {
        fn name(&self) -> &'static str {
            "refuse"
        }

        async fn handle(&self, _: &Resolver, _: &ResolveRequest, scope: &Scope) -> StageResult {
            scope.log("refused");
            Ok(Outcome::Stop)
        }
    }

    /// Forwards to another stage unchanged.
    struct Forward(Stage);

    #[async_trait(?Send)]
    impl ResolverPlugin for Forward {
        fn name(&self) -> &'static str {
            "forward"
        }

        async fn handle(
            &self,
            resolver: &Resolver,
            request: &ResolveRequest,
            scope: &Scope,
        ) -> StageResult {
            resolver
                .do_resolve(self.0, request.clone(), None, scope)
                .await
        }
    }

    fn resolver() -> Resolver {
        Resolver::new(Rc::new(SyncFileSystem))
    }

    fn ctx() -> RequestContext {
        RequestContext::default()
    }

    #[test]
    fn test_hook_display() {
        assert_eq!(Hook::before(Stage::RawFile).to_string(), "before-raw-file");
        assert_eq!(Hook::on(Stage::File).to_string(), "file");
        assert_eq!(Hook::after(Stage::ParsedResolve).to_string(), "after-parsed-resolve");
    }

    #[test]
    fn test_unresolved_becomes_not_found_at_top_level() {
        let r = resolver();
        let err = r.resolve_sync(&ctx(), "/proj", "./x").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Can't resolve './x' in '/proj'");
    }

    #[test]
    fn test_resolved_path_comes_from_plugin() {
        let mut r = resolver();
        r.plugin(Stage::Resolve, Answer("/proj/a.js"));
        let resolved = r.resolve_sync(&ctx(), "/proj", "./a?raw").unwrap();
        assert_eq!(resolved.path(), Some("/proj/a.js"));
    }

    #[test]
    fn test_before_phase_short_circuits_main() {
        let mut r = resolver();
        r.plugin(Hook::before(Stage::Resolve), Answer("/before"));
        r.plugin(Stage::Resolve, Answer("/main"));
        let resolved = r.resolve_sync(&ctx(), "/", "x").unwrap();
        assert_eq!(resolved.path(), Some("/before"));
    }

    #[test]
    fn test_stop_blocks_later_siblings_and_after_phase() {
        let mut r = resolver();
        r.plugin(Stage::Resolve, Refuse);
        r.plugin(Stage::Resolve, Answer("/sibling"));
        r.plugin(Hook::after(Stage::Resolve), Answer("/after"));
        let err = r.resolve_sync(&ctx(), "/", "x").unwrap_err();
        match err {
            ResolveError::NotFound { details, .. } => {
                assert!(details.contains("refused"), "{details}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_after_phase_runs_when_main_has_no_result() {
        let mut r = resolver();
        r.plugin(Hook::after(Stage::Resolve), Forward(Stage::File));
        r.plugin(Stage::File, Answer("/file"));
        let resolved = r.resolve_sync(&ctx(), "/", "x").unwrap();
        assert_eq!(resolved.path(), Some("/file"));
    }

    #[test]
    fn test_recursion_is_detected() {
        let mut r = resolver();
        r.plugin(Stage::Resolve, Forward(Stage::File));
        r.plugin(Stage::File, Forward(Stage::Resolve));
        let err = r.resolve_sync(&ctx(), "/", "x").unwrap_err();
        match err {
            ResolveError::Recursion { stack } => {
                assert_eq!(stack, vec!["resolve: (/) x", "file: (/) x", "resolve: (/) x"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_step_and_no_resolve_hooks_fire() {
        let steps = Rc::new(RefCell::new(Vec::new()));
        let failures = Rc::new(RefCell::new(0));

        let mut r = resolver();
        r.plugin(Stage::Resolve, Forward(Stage::File));
        let seen = Rc::clone(&steps);
        r.on_step(move |stage, _| seen.borrow_mut().push(stage));
        let count = Rc::clone(&failures);
        r.on_no_resolve(move |request, err| {
            assert_eq!(request.request_str(), "x");
            assert!(err.is_not_found());
            *count.borrow_mut() += 1;
        });

        assert!(r.resolve_sync(&ctx(), "/", "x").is_err());
        assert_eq!(*steps.borrow(), vec![Stage::Resolve, Stage::File]);
        assert_eq!(*failures.borrow(), 1);
    }

    #[test]
    fn test_async_resolve_matches_sync() {
        let mut r = resolver();
        r.plugin(Stage::Resolve, Answer("/a"));
        let resolved = block_on(r.resolve(&ctx(), "/", "a")).unwrap();
        assert_eq!(resolved.resource, Resource::Path("/a".to_string()));
    }

    #[test]
    fn test_resolve_sync_rejects_pending_pipeline() {
        struct Pending;

        #[async_trait(?Send)]
        impl ResolverPlugin for Pending {
            fn name(&self) -> &'static str {
                "pending"
            }

            async fn handle(&self, _: &Resolver, _: &ResolveRequest, _: &Scope) -> StageResult {
                futures::future::pending::<()>().await;
                Ok(Outcome::Continue)
            }
        }

        let mut r = resolver();
        r.plugin(Stage::Resolve, Pending);
        let err = r.resolve_sync(&ctx(), "/", "a").unwrap_err();
        assert!(matches!(err, ResolveError::NotSync));
    }
}
