use super::inner_request;
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;

/// Rewrites a specifier that matches a configured alias name.
///
/// Once an alias matches, the rewritten request is the only candidate: if
/// it fails, the stage fails rather than trying other aliases or the
/// literal specifier.
#[derive(Debug, Clone)]
pub struct AliasPlugin {
    name: String,
    alias: String,
    only_module: bool,
    target: Stage,
}

impl AliasPlugin {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        alias: impl Into<String>,
        only_module: bool,
        target: Stage,
    ) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            only_module,
            target,
        }
    }

    /// The rest of `inner` after the alias name, if the alias applies.
    fn matches<'r>(&self, inner: &'r str) -> Option<&'r str> {
        let rest = inner.strip_prefix(self.name.as_str())?;
        if rest.is_empty() || (!self.only_module && rest.starts_with('/')) {
            Some(rest)
        } else {
            None
        }
    }

    /// A request that already points into the alias target is left alone.
    fn already_aliased(&self, inner: &str) -> bool {
        inner
            .strip_prefix(self.alias.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for AliasPlugin {
    fn name(&self) -> &'static str {
        "alias"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let Some(inner) = inner_request(request).filter(|inner| !inner.is_empty()) else {
            return Ok(Outcome::Continue);
        };
        let Some(rest) = self.matches(&inner) else {
            return Ok(Outcome::Continue);
        };
        if self.already_aliased(&inner) {
            return Ok(Outcome::Continue);
        }

        let rewritten = format!("{}{rest}", self.alias);
        let message = format!(
            "aliased with mapping '{}': '{}' to '{rewritten}'",
            self.name, self.alias
        );
        let next = ResolveRequest {
            request: Some(rewritten),
            ..request.clone()
        };
        let outcome = resolver
            .do_resolve(self.target, next, Some(message), scope)
            .await?;
        Ok(outcome.committed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_exact_matching() {
        let prefix = AliasPlugin::new("foo", "./src/foo", false, Stage::Resolve);
        assert_eq!(prefix.matches("foo"), Some(""));
        assert_eq!(prefix.matches("foo/bar.js"), Some("/bar.js"));
        assert_eq!(prefix.matches("foobar"), None);

        let exact = AliasPlugin::new("Foo", "./src/foo", true, Stage::Resolve);
        assert_eq!(exact.matches("Foo"), Some(""));
        assert_eq!(exact.matches("Foo/bar.js"), None);
    }

    #[test]
    fn test_already_aliased() {
        let plugin = AliasPlugin::new("react", "react/dist", false, Stage::Resolve);
        assert!(plugin.already_aliased("react/dist"));
        assert!(plugin.already_aliased("react/dist/index.js"));
        assert!(!plugin.already_aliased("react/lib"));
    }
}
