#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Module path resolution on a pluggable, asynchronous stage pipeline.
//!
//! A [`Resolver`] drives a request through named stages; plugins attached
//! to each stage transform the request and forward it. [`ResolverFactory`]
//! wires the standard package-directory topology from [`ResolverOptions`].
//!
//! Everything runs on one cooperative timeline: futures are `!Send`, shared
//! state lives in `Rc`/`RefCell`, and several filesystem probes may be in
//! flight at once. Where several plugins race, the outcome only depends on
//! registration order, never on completion order.

pub mod description;
pub mod error;
pub mod factory;
pub mod fs;
pub mod hooks;
pub mod join;
pub mod options;
pub mod plugins;
pub mod request;
pub mod resolver;

pub use error::{ConfigError, ResolveError};
pub use factory::{create_resolver, ResolverFactory};
pub use fs::{FileStat, FileSystem, OsFileSystem, SyncFileSystem};
pub use join::JoinMemo;
pub use options::{AliasEntry, AliasTable, MainField, ResolverOptions};
pub use request::{RequestContext, ResolveRequest};
pub use resolver::{
    Hook, Outcome, Phase, Resource, Resolved, Resolver, ResolverPlugin, ResultHook, Scope, Stage,
    StageResult,
};
