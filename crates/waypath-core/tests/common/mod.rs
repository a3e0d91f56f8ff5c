//! In-memory filesystem for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use waypath_core::{FileStat, FileSystem, RequestContext, ResolverFactory, ResolverOptions};
use waypath_util::path::cd_up;

/// Files, directories and symlinks kept in maps.
///
/// - Adding a file creates its parent directories.
/// - `stat` follows symlinks; `readlink` reports them.
/// - Every path may carry a delay (number of times the operation yields
///   before completing) to reorder completions.
/// - After [`MemoryFs::poison`], every operation fails.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    links: BTreeMap<String, String>,
    delays: HashMap<String, usize>,
    unreadable_links: BTreeSet<String>,
    ops: Cell<usize>,
    poisoned: Cell<bool>,
    log: RefCell<Vec<String>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.as_bytes().to_vec());
        self.parents(path);
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.dirs.insert(path.to_string());
        self.parents(path);
        self
    }

    pub fn link(mut self, path: &str, target: &str) -> Self {
        self.links.insert(path.to_string(), target.to_string());
        self.parents(path);
        self
    }

    /// Make every operation on `path` yield `polls` times first.
    pub fn delay(mut self, path: &str, polls: usize) -> Self {
        self.delays.insert(path.to_string(), polls);
        self
    }

    /// Make `readlink` on `path` fail with `PermissionDenied`.
    pub fn unreadable_link(mut self, path: &str) -> Self {
        self.unreadable_links.insert(path.to_string());
        self
    }

    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Fail every later operation.
    pub fn poison(&self) {
        self.poisoned.set(true);
    }

    pub fn ops(&self) -> usize {
        self.ops.get()
    }

    /// Every path passed to an operation, in call order.
    pub fn accessed(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn parents(&mut self, path: &str) {
        let mut current = cd_up(path);
        while let Some(dir) = current {
            current = cd_up(&dir);
            self.dirs.insert(dir);
        }
    }

    fn follow(&self, path: &str) -> String {
        let mut path = path.to_string();
        for _ in 0..32 {
            let hit = self.links.iter().find_map(|(link, target)| {
                if path == *link {
                    Some(target.clone())
                } else {
                    path.strip_prefix(link.as_str())
                        .filter(|rest| rest.starts_with('/'))
                        .map(|rest| format!("{target}{rest}"))
                }
            });
            match hit {
                Some(next) => path = next,
                None => break,
            }
        }
        path
    }

    async fn enter(&self, path: &str) -> io::Result<()> {
        self.ops.set(self.ops.get() + 1);
        self.log.borrow_mut().push(path.to_string());
        if self.poisoned.get() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("filesystem accessed after poison: {path}"),
            ));
        }
        if let Some(&polls) = self.delays.get(path) {
            Yield(polls).await;
        }
        Ok(())
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("ENOENT: {path}"))
}

#[async_trait(?Send)]
impl FileSystem for MemoryFs {
    async fn stat(&self, path: &str) -> io::Result<FileStat> {
        self.enter(path).await?;
        let real = self.follow(path);
        if self.files.contains_key(&real) {
            Ok(FileStat::file())
        } else if self.dirs.contains(&real) {
            Ok(FileStat::dir())
        } else {
            Err(not_found(path))
        }
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.enter(path).await?;
        self.files
            .get(&self.follow(path))
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn readlink(&self, path: &str) -> io::Result<Option<String>> {
        self.enter(path).await?;
        if self.unreadable_links.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("EACCES: {path}"),
            ));
        }
        Ok(self.links.get(path).cloned())
    }
}

/// Suspends the current task a fixed number of times.
pub struct Yield(pub usize);

impl Future for Yield {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 == 0 {
            return Poll::Ready(());
        }
        self.0 -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

pub fn ctx() -> RequestContext {
    RequestContext::default()
}

/// Default-configured resolver over `fs`.
pub fn resolver_over(fs: Rc<MemoryFs>, options: ResolverOptions) -> waypath_core::Resolver {
    ResolverFactory::new(options)
        .file_system(fs)
        .build()
        .expect("valid options")
}
