//! Assembles the default stage topology from [`ResolverOptions`].

use crate::error::ResolveError;
use crate::fs::{FileSystem, SyncFileSystem};
use crate::join::JoinMemo;
use crate::options::{ModuleDirectories, ResolverOptions};
use crate::plugins::{
    AliasFieldPlugin, AliasPlugin, AppendPlugin, CachePredicate, DescriptionFilePlugin,
    DirectoryExistsPlugin, FileExistsPlugin, FileKindPlugin, JoinRequestPlugin, MainFieldPlugin,
    MemoryCache, ModuleAppendPlugin, ModuleKindPlugin, ModulesInHierarchicDirectoriesPlugin,
    ModulesInRootPlugin, NextPlugin, ParsePlugin, ResolverCache, ResultPlugin, SymlinkPlugin,
    TryNextPlugin, UnsafeCachePlugin, UseFilePlugin,
};
use crate::resolver::{Hook, Resolver, ResolverPlugin, Stage};
use std::rc::Rc;

/// Builder for a fully wired [`Resolver`].
///
/// ```no_run
/// use std::rc::Rc;
/// use waypath_core::{OsFileSystem, RequestContext, ResolverFactory, ResolverOptions};
///
/// # async fn run() -> Result<(), waypath_core::ResolveError> {
/// let resolver = ResolverFactory::new(ResolverOptions::default())
///     .file_system(Rc::new(OsFileSystem))
///     .build()?;
/// let resolved = resolver
///     .resolve(&RequestContext::default(), "/project", "./src/main")
///     .await?;
/// println!("{:?}", resolved.path());
/// # Ok(())
/// # }
/// ```
pub struct ResolverFactory {
    options: ResolverOptions,
    fs: Rc<dyn FileSystem>,
    cache: Option<Rc<dyn ResolverCache>>,
    cache_predicate: CachePredicate,
    joins: Option<Rc<JoinMemo>>,
    extra: Vec<(Hook, Rc<dyn ResolverPlugin>)>,
}

impl ResolverFactory {
    /// Start from `options` over the blocking filesystem.
    #[must_use]
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            fs: Rc::new(SyncFileSystem),
            cache: None,
            cache_predicate: Rc::new(|_| true),
            joins: None,
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub fn file_system(mut self, fs: Rc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Cache storage used when `unsafeCache` is on. Defaults to a fresh
    /// [`MemoryCache`].
    #[must_use]
    pub fn unsafe_cache(mut self, cache: Rc<dyn ResolverCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Only requests matching `predicate` use the unsafe cache.
    #[must_use]
    pub fn cache_predicate(mut self, predicate: CachePredicate) -> Self {
        self.cache_predicate = predicate;
        self
    }

    /// Share a join memo with other resolvers.
    #[must_use]
    pub fn join_memo(mut self, joins: Rc<JoinMemo>) -> Self {
        self.joins = Some(joins);
        self
    }

    /// Attach an extra plugin. Extra plugins are registered before the
    /// built-in ones, so they win ties on the same hook.
    #[must_use]
    pub fn plugin(mut self, hook: impl Into<Hook>, plugin: impl ResolverPlugin + 'static) -> Self {
        self.extra.push((hook.into(), Rc::new(plugin)));
        self
    }

    /// Validate the options and wire every plugin.
    pub fn build(self) -> Result<Resolver, ResolveError> {
        self.options.validate()?;

        let Self {
            options,
            fs,
            cache,
            cache_predicate,
            joins,
            extra,
        } = self;

        let mut resolver = Resolver::new(fs);
        if let Some(joins) = joins {
            resolver = resolver.with_join_memo(joins);
        }
        for (hook, plugin) in extra {
            resolver.plugin_rc(hook, plugin);
        }

        let descriptions = options.description_files.clone();

        // resolve
        if options.unsafe_cache {
            let cache = cache.unwrap_or_else(|| Rc::new(MemoryCache::new()));
            resolver.plugin(
                Stage::Resolve,
                UnsafeCachePlugin::new(cache_predicate, cache, Stage::NewResolve),
            );
            resolver.plugin(Stage::NewResolve, ParsePlugin::new(Stage::ParsedResolve));
        } else {
            resolver.plugin(Stage::Resolve, ParsePlugin::new(Stage::ParsedResolve));
        }

        // parsed-resolve
        resolver.plugin(
            Stage::ParsedResolve,
            DescriptionFilePlugin::new(descriptions.clone(), Stage::DescribedResolve),
        );
        resolver.plugin(
            Hook::after(Stage::ParsedResolve),
            NextPlugin::new(Stage::DescribedResolve),
        );

        // described-resolve
        for entry in &options.alias.0 {
            resolver.plugin(
                Stage::DescribedResolve,
                AliasPlugin::new(&entry.name, &entry.alias, entry.only_module, Stage::Resolve),
            );
        }
        for field in &options.alias_fields {
            resolver.plugin(
                Stage::DescribedResolve,
                AliasFieldPlugin::new(field.clone(), Stage::Resolve),
            );
        }
        resolver.plugin(
            Hook::after(Stage::DescribedResolve),
            ModuleKindPlugin::new(Stage::RawModule),
        );
        resolver.plugin(
            Hook::after(Stage::DescribedResolve),
            JoinRequestPlugin::new(Stage::Relative),
        );

        // raw-module
        for extension in &options.module_extensions {
            resolver.plugin(
                Stage::RawModule,
                ModuleAppendPlugin::new(extension, Stage::Module),
            );
        }
        if !options.enforce_module_extension {
            resolver.plugin(Stage::RawModule, TryNextPlugin::new(None, Stage::Module));
        }

        // module
        for group in options.module_directories() {
            match group {
                ModuleDirectories::Hierarchic(names) => resolver.plugin(
                    Stage::Module,
                    ModulesInHierarchicDirectoriesPlugin::new(names, Stage::Resolve),
                ),
                ModuleDirectories::Root(root) => resolver.plugin(
                    Stage::Module,
                    ModulesInRootPlugin::new(root, Stage::Resolve),
                ),
            }
        }

        // relative
        resolver.plugin(
            Stage::Relative,
            DescriptionFilePlugin::new(descriptions.clone(), Stage::DescribedRelative),
        );
        resolver.plugin(
            Hook::after(Stage::Relative),
            NextPlugin::new(Stage::DescribedRelative),
        );

        // described-relative
        resolver.plugin(
            Stage::DescribedRelative,
            FileKindPlugin::new(Stage::RawFile),
        );
        resolver.plugin(
            Stage::DescribedRelative,
            TryNextPlugin::new(Some("as directory"), Stage::Directory),
        );

        // directory
        resolver.plugin(
            Stage::Directory,
            DirectoryExistsPlugin::new(Stage::ExistingDirectory),
        );

        if options.resolve_to_context {
            // existing-directory
            resolver.plugin(
                Stage::ExistingDirectory,
                NextPlugin::new(Stage::Resolved),
            );
        } else {
            // existing-directory
            for field in &options.main_fields {
                resolver.plugin(
                    Stage::ExistingDirectory,
                    MainFieldPlugin::new(field.name.clone(), field.force_relative, Stage::Resolve),
                );
            }
            for filename in &options.main_files {
                resolver.plugin(
                    Stage::ExistingDirectory,
                    UseFilePlugin::new(filename, Stage::UndescribedRawFile),
                );
            }

            // undescribed-raw-file
            resolver.plugin(
                Stage::UndescribedRawFile,
                DescriptionFilePlugin::new(descriptions, Stage::RawFile),
            );
            resolver.plugin(
                Hook::after(Stage::UndescribedRawFile),
                NextPlugin::new(Stage::RawFile),
            );

            // raw-file
            if !options.enforce_extension {
                resolver.plugin(
                    Stage::RawFile,
                    TryNextPlugin::new(Some("no extension"), Stage::File),
                );
            }
            for extension in &options.extensions {
                resolver.plugin(Stage::RawFile, AppendPlugin::new(extension, Stage::File));
            }

            // file
            for entry in &options.alias.0 {
                resolver.plugin(
                    Stage::File,
                    AliasPlugin::new(&entry.name, &entry.alias, entry.only_module, Stage::Resolve),
                );
            }
            for field in &options.alias_fields {
                resolver.plugin(
                    Stage::File,
                    AliasFieldPlugin::new(field.clone(), Stage::Resolve),
                );
            }
            if options.symlinks {
                resolver.plugin(Stage::File, SymlinkPlugin::new(Stage::Relative));
            }
            resolver.plugin(Stage::File, FileExistsPlugin::new(Stage::ExistingFile));

            // existing-file
            resolver.plugin(Stage::ExistingFile, NextPlugin::new(Stage::Resolved));
        }

        // resolved
        resolver.plugin(Stage::Resolved, ResultPlugin);

        tracing::debug!(
            target: "waypath",
            plugins = resolver.plugin_count(),
            unsafe_cache = options.unsafe_cache,
            "resolver assembled"
        );
        Ok(resolver)
    }
}

/// Shorthand for `ResolverFactory::new(options).file_system(fs).build()`.
pub fn create_resolver(
    options: ResolverOptions,
    fs: Rc<dyn FileSystem>,
) -> Result<Resolver, ResolveError> {
    ResolverFactory::new(options).file_system(fs).build()
}
