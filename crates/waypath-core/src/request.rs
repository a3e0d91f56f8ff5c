//! The request value threaded through the stage pipeline.
//!
//! A [`ResolveRequest`] is never mutated once handed to a stage. Plugins
//! derive a new request with struct-update syntax
//! (`ResolveRequest { path, ..request.clone() }`) because sibling plugins on
//! the same hook may still be racing against the original.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

/// Opaque tag identifying who issued the request.
///
/// The pipeline never interprets it; it only takes part in cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestContext {
    /// Module that contains the specifier, if known.
    pub issuer: Option<String>,
    /// Name of the compilation the request belongs to, if any.
    pub compiler: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn issuer(issuer: impl Into<String>) -> Self {
        Self {
            issuer: Some(issuer.into()),
            compiler: None,
        }
    }
}

/// A request in flight through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveRequest {
    pub context: RequestContext,
    /// Absolute directory (or file, late in the pipeline) being resolved in.
    pub path: String,
    /// Remaining specifier; `None` once it has been joined onto `path`.
    pub request: Option<String>,
    /// Query suffix including the leading `?`, or empty.
    pub query: String,
    /// The specifier is package-style (resolved through module directories).
    pub module: bool,
    /// The specifier had a trailing separator.
    pub directory: bool,
    pub description_file_path: Option<String>,
    pub description_file_data: Option<Rc<Value>>,
    pub description_file_root: Option<String>,
    /// `path` relative to `description_file_root`, always `.`-prefixed.
    pub relative_path: Option<String>,
}

impl ResolveRequest {
    /// A fresh top-level request.
    #[must_use]
    pub fn new(context: RequestContext, path: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            context,
            path: path.into(),
            request: Some(request.into()),
            ..Self::default()
        }
    }

    /// Remaining specifier, or the empty string once consumed.
    #[must_use]
    pub fn request_str(&self) -> &str {
        self.request.as_deref().unwrap_or_default()
    }
}

/// A raw specifier split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedIdentifier {
    pub request: String,
    pub query: String,
    pub module: bool,
    pub directory: bool,
}

/// Split a specifier at the first `?` and classify it.
///
/// Returns `None` for the empty specifier. A trailing separator marks the
/// request as a directory and is stripped.
#[must_use]
pub fn parse_identifier(identifier: &str) -> Option<ParsedIdentifier> {
    if identifier.is_empty() {
        return None;
    }

    let (request, query) = match identifier.find('?') {
        Some(index) => (&identifier[..index], &identifier[index..]),
        None => (identifier, ""),
    };

    let mut parsed = ParsedIdentifier {
        request: request.to_string(),
        query: query.to_string(),
        module: false,
        directory: false,
    };

    if !parsed.request.is_empty() {
        parsed.module = is_module(&parsed.request);
        parsed.directory = is_directory(&parsed.request);
        if parsed.directory {
            parsed.request.pop();
        }
    }

    Some(parsed)
}

/// True for package-style specifiers: anything that is not `.`, `..`,
/// `./…`, `../…`, `/…` or a drive-letter path.
#[must_use]
pub fn is_module(request: &str) -> bool {
    let bytes = request.as_bytes();
    let sep = |b: u8| b == b'/' || b == b'\\';

    let relative = match bytes {
        [b'.'] | [b'.', b'.'] => true,
        [b'.', b, ..] if sep(*b) => true,
        [b'.', b'.', b, ..] if sep(*b) => true,
        [b'/', ..] => true,
        [drive, b':', b, ..] if drive.is_ascii_alphabetic() && sep(*b) => true,
        _ => false,
    };

    !relative
}

/// True if the specifier ends with a path separator.
#[must_use]
pub fn is_directory(request: &str) -> bool {
    request.ends_with('/') || request.ends_with('\\')
}
