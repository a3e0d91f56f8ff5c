//! Pipeline assembly options.
//!
//! Every field has a default, so `{}` is a complete configuration. Field
//! names are camelCase in JSON.

use crate::description::Field;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use waypath_util::path::is_absolute;

/// Options for [`crate::ResolverFactory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    /// Module directory names searched in every ancestor (`node_modules`),
    /// or absolute directories searched as-is.
    pub modules: Vec<String>,
    /// Manifest filenames, in priority order.
    pub description_files: Vec<String>,
    /// Manifest fields naming a package's entry point.
    pub main_fields: Vec<MainField>,
    /// Manifest fields holding alias maps (`browser`).
    pub alias_fields: Vec<Field>,
    /// File names tried inside a directory (`index`).
    pub main_files: Vec<String>,
    pub extensions: Vec<String>,
    /// Never try a request without one of `extensions` appended.
    pub enforce_extension: bool,
    /// Suffixes appended to package names (`-loader`).
    pub module_extensions: Vec<String>,
    /// Never try a package name without one of `module_extensions`.
    pub enforce_module_extension: bool,
    pub alias: AliasTable,
    /// Resolve symlinks to their real location.
    pub symlinks: bool,
    /// Resolve to a directory instead of a file.
    pub resolve_to_context: bool,
    /// Cache final results in memory, never invalidated.
    pub unsafe_cache: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            modules: vec!["node_modules".to_string()],
            description_files: vec!["package.json".to_string()],
            main_fields: vec![MainField::forced("main")],
            alias_fields: Vec::new(),
            main_files: vec!["index".to_string()],
            extensions: vec![".js".to_string(), ".json".to_string(), ".node".to_string()],
            enforce_extension: false,
            module_extensions: Vec::new(),
            enforce_module_extension: false,
            alias: AliasTable::default(),
            symlinks: true,
            resolve_to_context: false,
            unsafe_cache: false,
        }
    }
}

impl ResolverOptions {
    /// Load options from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&content, &path.display().to_string())
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        parse(json, "<inline>")
    }

    /// Reject option values that cannot be assembled into a pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(
                "modules",
                "module directory names must not be empty",
            ));
        }
        if self.description_files.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(
                "descriptionFiles",
                "description file names must not be empty",
            ));
        }
        if self.main_files.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(
                "mainFiles",
                "entry must not be empty",
            ));
        }
        for field in &self.main_fields {
            if field_is_empty(&field.name) {
                return Err(ConfigError::invalid(
                    "mainFields",
                    "field name must not be empty",
                ));
            }
        }
        for field in &self.alias_fields {
            if field_is_empty(field) {
                return Err(ConfigError::invalid(
                    "aliasFields",
                    "field name must not be empty",
                ));
            }
        }
        for entry in &self.alias.0 {
            if entry.name.is_empty() {
                return Err(ConfigError::invalid("alias", "alias name must not be empty"));
            }
        }
        Ok(())
    }

    /// Module directories in search order. Consecutive relative names share
    /// one ancestor walk; absolute entries are searched on their own.
    #[must_use]
    pub fn module_directories(&self) -> Vec<ModuleDirectories> {
        let mut groups: Vec<ModuleDirectories> = Vec::new();
        for module in &self.modules {
            if is_absolute(module) {
                groups.push(ModuleDirectories::Root(module.clone()));
                continue;
            }
            match groups.last_mut() {
                Some(ModuleDirectories::Hierarchic(names)) => names.push(module.clone()),
                _ => groups.push(ModuleDirectories::Hierarchic(vec![module.clone()])),
            }
        }
        groups
    }
}

fn parse(json: &str, origin: &str) -> Result<ResolverOptions, ConfigError> {
    serde_json::from_str(json).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

fn field_is_empty(field: &Field) -> bool {
    match field {
        Field::Name(name) => name.is_empty(),
        Field::Path(keys) => keys.is_empty() || keys.iter().any(String::is_empty),
    }
}

/// A group of module directories searched by one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleDirectories {
    /// Names joined onto every ancestor of the requesting directory.
    Hierarchic(Vec<String>),
    /// A single absolute directory.
    Root(String),
}

/// A manifest entry-point field.
///
/// In JSON, either a field (`"main"`, `["browser", "main"]`), which forces
/// a relative interpretation, or `{ "name": ..., "forceRelative": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MainFieldRepr", rename_all = "camelCase")]
pub struct MainField {
    pub name: Field,
    pub force_relative: bool,
}

impl MainField {
    /// A field whose bare values are relative paths.
    #[must_use]
    pub fn forced(name: &str) -> Self {
        Self {
            name: Field::Name(name.to_string()),
            force_relative: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MainFieldRepr {
    Field(Field),
    Full {
        name: Field,
        #[serde(default, rename = "forceRelative")]
        force_relative: bool,
    },
}

impl From<MainFieldRepr> for MainField {
    fn from(repr: MainFieldRepr) -> Self {
        match repr {
            MainFieldRepr::Field(name) => Self {
                name,
                force_relative: true,
            },
            MainFieldRepr::Full {
                name,
                force_relative,
            } => Self {
                name,
                force_relative,
            },
        }
    }
}

/// One alias rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasEntry {
    pub name: String,
    pub alias: String,
    /// Match only the exact name, not `name/...`.
    #[serde(default)]
    pub only_module: bool,
}

impl AliasEntry {
    #[must_use]
    pub fn new(name: &str, alias: &str, only_module: bool) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.to_string(),
            only_module,
        }
    }
}

/// Alias rules in priority order.
///
/// In JSON, either a list of [`AliasEntry`] or an object mapping names to
/// targets. In the object form a trailing `$` on the name means
/// `onlyModule`, and a target may be a string or
/// `{ "alias": ..., "onlyModule": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AliasRepr", into = "Vec<AliasEntry>")]
pub struct AliasTable(pub Vec<AliasEntry>);

impl From<AliasTable> for Vec<AliasEntry> {
    fn from(table: AliasTable) -> Self {
        table.0
    }
}

impl From<Vec<AliasEntry>> for AliasTable {
    fn from(entries: Vec<AliasEntry>) -> Self {
        Self(entries)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AliasRepr {
    List(Vec<AliasEntry>),
    Map(serde_json::Map<String, Value>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AliasTarget {
    alias: String,
    only_module: Option<bool>,
}

impl TryFrom<AliasRepr> for AliasTable {
    type Error = String;

    fn try_from(repr: AliasRepr) -> Result<Self, Self::Error> {
        let map = match repr {
            AliasRepr::List(entries) => return Ok(Self(entries)),
            AliasRepr::Map(map) => map,
        };

        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let (name, exact) = match key.strip_suffix('$') {
                Some(name) => (name.to_string(), true),
                None => (key.clone(), false),
            };
            let entry = match value {
                Value::String(alias) => AliasEntry {
                    name,
                    alias,
                    only_module: exact,
                },
                Value::Object(_) => {
                    let target: AliasTarget = serde_json::from_value(value)
                        .map_err(|e| format!("invalid alias `{key}`: {e}"))?;
                    AliasEntry {
                        name,
                        alias: target.alias,
                        only_module: target.only_module.unwrap_or(exact),
                    }
                }
                _ => {
                    return Err(format!(
                        "invalid alias `{key}`: expected a string or an object"
                    ))
                }
            };
            entries.push(entry);
        }
        Ok(Self(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let options = ResolverOptions::from_json_str("{}").unwrap();
        assert_eq!(options, ResolverOptions::default());
        assert!(options.symlinks);
        assert_eq!(options.extensions, vec![".js", ".json", ".node"]);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_main_field_forms() {
        let options = ResolverOptions::from_json_str(
            r#"{"mainFields": ["module", ["browser", "main"], {"name": "main"}, {"name": "x", "forceRelative": true}]}"#,
        )
        .unwrap();
        assert_eq!(options.main_fields[0], MainField::forced("module"));
        assert_eq!(
            options.main_fields[1].name,
            Field::Path(vec!["browser".into(), "main".into()])
        );
        assert!(options.main_fields[1].force_relative);
        assert!(!options.main_fields[2].force_relative);
        assert!(options.main_fields[3].force_relative);
    }

    #[test]
    fn test_alias_map_form_keeps_order() {
        let options = ResolverOptions::from_json_str(
            r#"{"alias": {"zeta": "./z", "Foo$": "./src/foo", "bar": {"alias": "./b", "onlyModule": true}}}"#,
        )
        .unwrap();
        assert_eq!(
            options.alias.0,
            vec![
                AliasEntry::new("zeta", "./z", false),
                AliasEntry::new("Foo", "./src/foo", true),
                AliasEntry::new("bar", "./b", true),
            ]
        );
    }

    #[test]
    fn test_alias_list_form() {
        let options = ResolverOptions::from_json_str(
            r#"{"alias": [{"name": "Foo", "alias": "./src/foo", "onlyModule": true}, {"name": "a", "alias": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(
            options.alias.0,
            vec![
                AliasEntry::new("Foo", "./src/foo", true),
                AliasEntry::new("a", "b", false),
            ]
        );
    }

    #[test]
    fn test_alias_bad_value_is_parse_error() {
        let err = ResolverOptions::from_json_str(r#"{"alias": {"a": 1}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_entries() {
        let options = ResolverOptions {
            main_files: vec![String::new()],
            ..ResolverOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("mainFiles"));

        let options = ResolverOptions {
            alias: AliasTable(vec![AliasEntry::new("", "./x", false)]),
            ..ResolverOptions::default()
        };
        assert!(options.validate().is_err());

        let options = ResolverOptions {
            main_fields: vec![MainField {
                name: Field::Path(vec![]),
                force_relative: false,
            }],
            ..ResolverOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_module_directories_grouping() {
        let options = ResolverOptions {
            modules: vec![
                "node_modules".into(),
                "web_modules".into(),
                "/opt/shared".into(),
                "vendor".into(),
            ],
            ..ResolverOptions::default()
        };
        assert_eq!(
            options.module_directories(),
            vec![
                ModuleDirectories::Hierarchic(vec!["node_modules".into(), "web_modules".into()]),
                ModuleDirectories::Root("/opt/shared".into()),
                ModuleDirectories::Hierarchic(vec!["vendor".into()]),
            ]
        );
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResolverOptions::from_path(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let path = dir.path().join("waypath.json");
        std::fs::write(&path, r#"{"extensions": [".ts"], "symlinks": false}"#).unwrap();
        let options = ResolverOptions::from_path(&path).unwrap();
        assert_eq!(options.extensions, vec![".ts"]);
        assert!(!options.symlinks);
    }
}
