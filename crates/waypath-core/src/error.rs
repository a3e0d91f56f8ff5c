use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a resolve call.
///
/// "No result" from an inner stage is not an error; only the outermost
/// [`crate::Resolver::resolve`] turns it into [`ResolveError::NotFound`].
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Can't resolve '{request}' in '{path}'")]
    NotFound {
        request: String,
        path: String,
        /// Diagnostic log of the whole call, one entry per line.
        details: String,
        /// Paths that were probed and did not exist.
        missing: Vec<String>,
    },

    #[error("Recursion in resolving\nStack:\n  {}", .stack.join("\n  "))]
    Recursion { stack: Vec<String> },

    #[error("{path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{path} (directory description file): {message}")]
    DescriptionFile { path: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot resolve synchronously because the file system is not sync. Use `resolve`")]
    NotSync,

    #[error("{0}")]
    Other(String),
}

impl ResolveError {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub(crate) fn filesystem(path: &str, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.to_string(),
            source,
        }
    }

    /// True for the terminal "nothing matched" outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when the pipeline revisited a stage with an identical request.
    #[must_use]
    pub fn is_recursion(&self) -> bool {
        matches!(self, Self::Recursion { .. })
    }
}

/// Malformed pipeline configuration, reported before any request runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid option `{option}`: {message}")]
    Invalid {
        option: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(option: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            option,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursion_message_lists_stack() {
        let err = ResolveError::Recursion {
            stack: vec![
                "resolve: (/) a".to_string(),
                "parsed-resolve: (/) a module".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Recursion in resolving\nStack:\n  resolve: (/) a\n  parsed-resolve: (/) a module"
        );
        assert!(err.is_recursion());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_message() {
        let err = ResolveError::NotFound {
            request: "./missing".to_string(),
            path: "/proj".to_string(),
            details: String::new(),
            missing: vec![],
        };
        assert_eq!(err.to_string(), "Can't resolve './missing' in '/proj'");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_config_error_converts() {
        let err: ResolveError = ConfigError::invalid("mainFiles", "entry must not be empty").into();
        assert_eq!(
            err.to_string(),
            "Invalid option `mainFiles`: entry must not be empty"
        );
    }
}
