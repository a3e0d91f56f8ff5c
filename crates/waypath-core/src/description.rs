//! Package manifest ("description file") lookup.
//!
//! Walks from a directory towards the filesystem root and stops at the
//! first directory that contains one of the configured manifest names.

use crate::error::ResolveError;
use crate::fs::is_not_found;
use crate::hooks::for_each_bail;
use crate::resolver::Resolver;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io;
use std::rc::Rc;
use waypath_util::path::cd_up;

/// A located and parsed manifest.
#[derive(Debug, Clone)]
pub struct DescriptionFile {
    /// Full path of the manifest file.
    pub path: String,
    /// Directory that contains it.
    pub root: String,
    pub data: Rc<Value>,
}

/// A manifest field name, either top-level or nested.
///
/// Deserializes from a string (`"browser"`) or a string array
/// (`["browser", "main"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Name(String),
    /// Nested lookup, e.g. `["browser", "main"]`.
    Path(Vec<String>),
}

impl Field {
    /// Look the field up in a manifest.
    #[must_use]
    pub fn get<'v>(&self, data: &'v Value) -> Option<&'v Value> {
        match self {
            Self::Name(name) => data.get(name),
            Self::Path(keys) => keys.iter().try_fold(data, |value, key| value.get(key)),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Path(keys) => f.write_str(&keys.join(".")),
        }
    }
}

/// Find the nearest manifest at or above `directory`.
///
/// Within one directory the filenames are tried concurrently and the first
/// one in list order that exists wins. A manifest that exists but is not
/// valid JSON is an error; a missing manifest is not.
pub async fn load_description_file(
    resolver: &Resolver,
    directory: &str,
    filenames: &[String],
) -> Result<Option<DescriptionFile>, ResolveError> {
    let mut directory = directory.to_string();
    loop {
        let found = for_each_bail(filenames, |filename| {
            let path = resolver.join(&directory, filename);
            let root = directory.clone();
            async move { read_description(resolver, path, root).await }
        })
        .await
        .flatten();

        match found {
            Some(result) => return result.map(Some),
            None => match cd_up(&directory) {
                Some(parent) => directory = parent,
                None => return Ok(None),
            },
        }
    }
}

async fn read_description(
    resolver: &Resolver,
    path: String,
    root: String,
) -> Option<Result<DescriptionFile, ResolveError>> {
    match resolver.file_system().read_json(&path).await {
        Ok(data) => Some(Ok(DescriptionFile {
            path,
            root,
            data: Rc::new(data),
        })),
        Err(e) if is_not_found(&e) => None,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            Some(Err(ResolveError::DescriptionFile {
                message: e.to_string(),
                path,
            }))
        }
        Err(e) => Some(Err(ResolveError::filesystem(&path, e))),
    }
}

/// `path` relative to the manifest `root`, always `.`-prefixed and using `/`.
#[must_use]
pub fn relative_path(root: &str, path: &str) -> String {
    let rest = path.strip_prefix(root).unwrap_or_default().replace('\\', "/");
    if rest.is_empty() || rest.starts_with('/') {
        format!(".{rest}")
    } else {
        // The root itself ends with a separator (`/`).
        format!("./{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_lookup() {
        let data = json!({"main": "lib/index.js", "browser": {"main": "browser.js"}});
        assert_eq!(
            Field::Name("main".into()).get(&data),
            Some(&json!("lib/index.js"))
        );
        let nested = Field::Path(vec!["browser".into(), "main".into()]);
        assert_eq!(nested.get(&data), Some(&json!("browser.js")));
        assert_eq!(nested.to_string(), "browser.main");
        assert!(Field::Name("module".into()).get(&data).is_none());
        assert!(Field::Path(vec!["main".into(), "x".into()]).get(&data).is_none());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("/d1", "/d1/d2/d3"), "./d2/d3");
        assert_eq!(relative_path("/d1", "/d1"), ".");
        assert_eq!(relative_path("C:\\d1", "C:\\d1\\d2"), "./d2");
        assert_eq!(relative_path("/", "/d1"), "./d1");
    }
}
