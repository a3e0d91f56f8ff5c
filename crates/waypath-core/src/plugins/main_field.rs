use crate::description::Field;
use crate::request::ResolveRequest;
use crate::resolver::{Outcome, Resolver, ResolverPlugin, Scope, Stage, StageResult};
use async_trait::async_trait;
use serde_json::Value;
use waypath_util::path::basename;

/// Resolves a package directory through a manifest entry field (`main`).
#[derive(Debug, Clone)]
pub struct MainFieldPlugin {
    field: Field,
    force_relative: bool,
    target: Stage,
}

impl MainFieldPlugin {
    /// With `force_relative`, a bare value such as `lib/index.js` is treated
    /// as `./lib/index.js` rather than as a package name.
    #[must_use]
    pub fn new(field: Field, force_relative: bool, target: Stage) -> Self {
        Self {
            field,
            force_relative,
            target,
        }
    }
}

#[async_trait(?Send)]
impl ResolverPlugin for MainFieldPlugin {
    fn name(&self) -> &'static str {
        "main-field"
    }

    async fn handle(
        &self,
        resolver: &Resolver,
        request: &ResolveRequest,
        scope: &Scope,
    ) -> StageResult {
        if request.description_file_root.as_deref() != Some(request.path.as_str()) {
            return Ok(Outcome::Continue);
        }
        let Some(data) = request.description_file_data.as_deref() else {
            return Ok(Outcome::Continue);
        };
        let main = match self.field.get(data) {
            Some(Value::String(main)) if !main.is_empty() => main,
            _ => return Ok(Outcome::Continue),
        };

        let main = if self.force_relative && !main.starts_with("./") && !main.starts_with("../")
        {
            format!("./{main}")
        } else {
            main.clone()
        };

        let manifest = request.description_file_path.as_deref().unwrap_or_default();
        let filename = basename(manifest).unwrap_or(manifest);
        let message = format!("use {main} from {} in {filename}", self.field);
        let next = ResolveRequest {
            request: Some(main),
            ..request.clone()
        };
        resolver
            .do_resolve(self.target, next, Some(message), scope)
            .await
    }
}
