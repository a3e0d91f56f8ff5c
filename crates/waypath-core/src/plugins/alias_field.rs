use super::inner_request;
use crate::description::Field;
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;
use serde_json::Value;

/// Applies an alias map stored in a manifest field (such as `browser`).
///
/// A mapping to `false` ignores the request. Like [`super::AliasPlugin`], a
/// matched mapping commits.
#[derive(Debug, Clone)]
pub struct AliasFieldPlugin {
    field: Field,
    target: Stage,
}

impl AliasFieldPlugin {
    #[must_use]
    pub fn new(field: Field, target: Stage) -> Self {
        Self { field, target }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for AliasFieldPlugin {
    fn name(&self) -> &'static str {
        "alias-field"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        let Some(data) = request.description_file_data.as_deref() else {
            return Ok(Outcome::Continue);
        };
        let Some(inner) = inner_request(request).filter(|inner| !inner.is_empty()) else {
            return Ok(Outcome::Continue);
        };
        let Some(Value::Object(map)) = self.field.get(data) else {
            scope.log(format!(
                "Field '{}' doesn't contain a valid alias configuration",
                self.field
            ));
            return Ok(Outcome::Continue);
        };

        let mapped = map
            .get(&inner)
            .or_else(|| inner.strip_prefix("./").and_then(|bare| map.get(bare)));

        let mapped = match mapped {
            Some(Value::Bool(false)) => {
                return Ok(Outcome::Ignored(request.clone()));
            }
            Some(Value::String(mapped)) if *mapped != inner => mapped,
            _ => return Ok(Outcome::Continue),
        };

        let message = format!(
            "aliased from description file {} with mapping '{inner}' to '{mapped}'",
            request.description_file_path.as_deref().unwrap_or_default()
        );
        let next = ResolveRequest {
            path: request
                .description_file_root
                .clone()
                .unwrap_or_else(|| request.path.clone()),
            request: Some(mapped.clone()),
            ..request.clone()
        };
        let outcome = resolver
            .do_resolve(self.target, next, Some(message), scope)
            .await?;
        Ok(outcome.committed())
    }
}
