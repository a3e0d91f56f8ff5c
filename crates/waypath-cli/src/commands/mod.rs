//! Subcommand implementations.

pub mod explain;
pub mod resolve;

use miette::{miette, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use waypath_core::{
    AliasEntry, FileSystem, OsFileSystem, RequestContext, ResolveError, Resolved, Resolver,
    ResolverOptions, SyncFileSystem,
};

/// Exit code when nothing matched the specifier.
pub const EXIT_NOT_FOUND: i32 = 1;
/// Exit code for every other resolution failure.
pub const EXIT_ERROR: i32 = 2;

/// Arguments shared by every command that resolves a specifier.
#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Module specifier to resolve (e.g. "./util", "lodash/fp", "@scope/pkg")
    pub specifier: String,

    /// Directory the specifier is resolved from (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub from: Option<PathBuf>,

    /// JSON file with resolver options
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra alias, NAME=TARGET; a trailing `$` on NAME matches only the exact name
    #[arg(long = "alias", value_name = "NAME=TARGET")]
    pub aliases: Vec<String>,

    /// Module that contains the specifier
    #[arg(long, value_name = "PATH")]
    pub issuer: Option<String>,
}

impl SourceArgs {
    /// Absolute directory to resolve from.
    pub fn directory(&self, cwd: &Path) -> String {
        let dir = match &self.from {
            Some(from) if from.is_absolute() => from.clone(),
            Some(from) => cwd.join(from),
            None => cwd.to_path_buf(),
        };
        dir.to_string_lossy().into_owned()
    }

    pub fn context(&self) -> RequestContext {
        self.issuer
            .as_ref()
            .map(RequestContext::issuer)
            .unwrap_or_default()
    }

    /// Options from `--config` (or defaults) plus every `--alias`.
    pub fn options(&self, cwd: &Path) -> Result<ResolverOptions> {
        let mut options = match &self.config {
            Some(path) if path.is_absolute() => ResolverOptions::from_path(path).into_diagnostic()?,
            Some(path) => ResolverOptions::from_path(&cwd.join(path)).into_diagnostic()?,
            None => ResolverOptions::default(),
        };
        for raw in &self.aliases {
            options.alias.0.push(parse_alias(raw)?);
        }
        Ok(options)
    }
}

fn parse_alias(raw: &str) -> Result<AliasEntry> {
    let (name, target) = raw
        .split_once('=')
        .ok_or_else(|| miette!("invalid alias '{raw}': expected NAME=TARGET"))?;
    let (name, only_module) = match name.strip_suffix('$') {
        Some(exact) => (exact, true),
        None => (name, false),
    };
    if name.is_empty() {
        return Err(miette!("invalid alias '{raw}': empty name"));
    }
    Ok(AliasEntry::new(name, target, only_module))
}

/// Blocking adapter for `--sync`, Tokio-backed otherwise.
pub fn file_system(sync: bool) -> Rc<dyn FileSystem> {
    if sync {
        Rc::new(SyncFileSystem)
    } else {
        Rc::new(OsFileSystem)
    }
}

/// Run one resolve call to completion on a current-thread runtime.
pub fn drive(
    resolver: &Resolver,
    context: &RequestContext,
    directory: &str,
    specifier: &str,
    sync: bool,
) -> Result<Result<Resolved, ResolveError>> {
    if sync {
        return Ok(resolver.resolve_sync(context, directory, specifier));
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .into_diagnostic()?;
    Ok(runtime.block_on(resolver.resolve(context, directory, specifier)))
}

/// Stable machine-readable name of an error kind.
pub fn error_code(err: &ResolveError) -> &'static str {
    match err {
        ResolveError::NotFound { .. } => "not_found",
        ResolveError::Recursion { .. } => "recursion",
        ResolveError::Filesystem { .. } => "filesystem",
        ResolveError::DescriptionFile { .. } => "description_file",
        ResolveError::Config(_) => "config",
        ResolveError::NotSync => "not_sync",
        ResolveError::Other(_) => "other",
    }
}

pub fn exit_code(err: &ResolveError) -> i32 {
    if err.is_not_found() {
        EXIT_NOT_FOUND
    } else {
        EXIT_ERROR
    }
}
