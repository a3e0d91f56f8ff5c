//! The stage plugin catalog.
//!
//! Every plugin is attached to one source hook and forwards a derived
//! request to a target [`Stage`](crate::Stage). [`crate::ResolverFactory`]
//! assembles them into the default topology; they can also be attached by
//! hand with [`crate::Resolver::plugin`].

mod alias;
mod alias_field;
mod append;
mod description_file;
mod exists;
mod join_request;
mod kind;
mod log_info;
mod main_field;
mod modules;
mod next;
mod parse;
mod result;
mod symlink;
mod unsafe_cache;
mod use_file;

pub use alias::AliasPlugin;
pub use alias_field::AliasFieldPlugin;
pub use append::{AppendPlugin, ModuleAppendPlugin};
pub use description_file::DescriptionFilePlugin;
pub use exists::{DirectoryExistsPlugin, FileExistsPlugin};
pub use join_request::JoinRequestPlugin;
pub use kind::{FileKindPlugin, ModuleKindPlugin};
pub use log_info::LogInfoPlugin;
pub use main_field::MainFieldPlugin;
pub use modules::{ModulesInHierarchicDirectoriesPlugin, ModulesInRootPlugin};
pub use next::{NextPlugin, TryNextPlugin};
pub use parse::ParsePlugin;
pub use result::ResultPlugin;
pub use symlink::SymlinkPlugin;
pub use unsafe_cache::{
    CachePredicate, MemoryCache, NoCache, ResolverCache, UnsafeCacheKey, UnsafeCachePlugin,
};
pub use use_file::UseFilePlugin;

use crate::request::ResolveRequest;
use waypath_util::path;

/// The specifier as alias tables see it.
///
/// A relative specifier is re-expressed relative to the manifest root when
/// one is known, so that `./lib/a.js` in a manifest's alias map matches a
/// `./a.js` request made from `lib/`.
pub(crate) fn inner_request(request: &ResolveRequest) -> Option<String> {
    let specifier = request.request.as_deref().filter(|s| !s.is_empty());
    match (specifier, request.relative_path.as_deref()) {
        (Some(spec), Some(relative)) if spec.starts_with("./") || spec.starts_with("../") => {
            Some(path::join(relative, spec))
        }
        (Some(spec), _) => Some(spec.to_string()),
        (None, relative) => relative.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestContext;

    #[test]
    fn test_inner_request_joins_relative_specifier() {
        let mut request = ResolveRequest::new(RequestContext::default(), "/p/lib", "./a.js");
        assert_eq!(inner_request(&request).as_deref(), Some("./a.js"));

        request.relative_path = Some("./lib".to_string());
        assert_eq!(inner_request(&request).as_deref(), Some("./lib/a.js"));

        request.request = Some("lodash".to_string());
        assert_eq!(inner_request(&request).as_deref(), Some("lodash"));

        request.request = None;
        request.relative_path = Some("./lib/a.js".to_string());
        assert_eq!(inner_request(&request).as_deref(), Some("./lib/a.js"));
    }

    #[test]
    fn test_inner_request_empty_specifier_falls_back_to_relative_path() {
        let mut request = ResolveRequest::new(RequestContext::default(), "/p/lib", "");
        assert_eq!(inner_request(&request), None);

        request.relative_path = Some("./lib/a.js".to_string());
        assert_eq!(inner_request(&request).as_deref(), Some("./lib/a.js"));
    }
}
