//! Filesystem contract consumed by the pipeline, plus two adapters.
//!
//! The pipeline only needs `stat`, `read_file` and `readlink`. It tells
//! "does not exist" ([`is_not_found`]) apart from every other I/O error:
//! the former is a normal tried-and-failed probe, the latter aborts the
//! whole resolve call.

use async_trait::async_trait;
use serde_json::Value;
use std::io;

/// The subset of file metadata the pipeline looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_file: bool,
    pub is_dir: bool,
}

impl FileStat {
    #[must_use]
    pub fn file() -> Self {
        Self {
            is_file: true,
            is_dir: false,
        }
    }

    #[must_use]
    pub fn dir() -> Self {
        Self {
            is_file: false,
            is_dir: true,
        }
    }
}

impl From<std::fs::Metadata> for FileStat {
    fn from(meta: std::fs::Metadata) -> Self {
        Self {
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
        }
    }
}

/// Asynchronous filesystem used by resolver plugins.
///
/// Implementations whose futures always complete on first poll make
/// [`crate::Resolver::resolve_sync`] usable.
#[async_trait(?Send)]
pub trait FileSystem {
    /// Metadata of `path`, following symlinks.
    async fn stat(&self, path: &str) -> io::Result<FileStat>;

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Target of the symlink at `path`, or `None` if it is not a symlink.
    async fn readlink(&self, path: &str) -> io::Result<Option<String>>;

    /// Read and parse a JSON file. Parse failures are reported with
    /// [`io::ErrorKind::InvalidData`].
    async fn read_json(&self, path: &str) -> io::Result<Value> {
        let bytes = self.read_file(path).await?;
        serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// True if operations can only make progress inside an async runtime.
    /// Such a filesystem is never polled by [`crate::Resolver::resolve_sync`].
    fn needs_runtime(&self) -> bool {
        false
    }
}

/// True if the error means the path does not exist.
#[must_use]
pub fn is_not_found(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }
    // A file used as a directory component (`index.js/package.json`).
    #[cfg(unix)]
    {
        if err.raw_os_error() == Some(libc::ENOTDIR) {
            return true;
        }
    }
    false
}

/// Map a `read_link` error: "not a link" and "missing" both mean no target.
fn readlink_result(result: io::Result<std::path::PathBuf>) -> io::Result<Option<String>> {
    match result {
        Ok(target) => Ok(Some(target.to_string_lossy().into_owned())),
        Err(e) if is_not_found(&e) || e.kind() == io::ErrorKind::InvalidInput => Ok(None),
        // ERROR_NOT_A_REPARSE_POINT
        #[cfg(windows)]
        Err(e) if e.raw_os_error() == Some(4390) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Blocking `std::fs` adapter. Every operation completes on first poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncFileSystem;

#[async_trait(?Send)]
impl FileSystem for SyncFileSystem {
    async fn stat(&self, path: &str) -> io::Result<FileStat> {
        std::fs::metadata(path).map(FileStat::from)
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    async fn readlink(&self, path: &str) -> io::Result<Option<String>> {
        readlink_result(std::fs::read_link(path))
    }
}

/// Non-blocking adapter over `tokio::fs`. Requires a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

#[async_trait(?Send)]
impl FileSystem for OsFileSystem {
    async fn stat(&self, path: &str) -> io::Result<FileStat> {
        tokio::fs::metadata(path).await.map(FileStat::from)
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn readlink(&self, path: &str) -> io::Result<Option<String>> {
        readlink_result(tokio::fs::read_link(path).await)
    }

    fn needs_runtime(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::fs;
    use tempfile::tempdir;

    fn s(path: &std::path::Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_sync_stat_distinguishes_kinds() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "x").unwrap();

        let fs = SyncFileSystem;
        assert_eq!(block_on(fs.stat(&s(&file))).unwrap(), FileStat::file());
        assert_eq!(block_on(fs.stat(&s(dir.path()))).unwrap(), FileStat::dir());

        let err = block_on(fs.stat(&s(&dir.path().join("missing")))).unwrap_err();
        assert!(is_not_found(&err));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_as_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "x").unwrap();

        let err = block_on(SyncFileSystem.stat(&s(&file.join("package.json")))).unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_read_json_reports_invalid_data() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, r#"{"main": "lib/index.js"}"#).unwrap();
        fs::write(&bad, "{ not json").unwrap();

        let value = block_on(SyncFileSystem.read_json(&s(&good))).unwrap();
        assert_eq!(value["main"], "lib/index.js");

        let err = block_on(SyncFileSystem.read_json(&s(&bad))).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_readlink_on_regular_file_is_none() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "x").unwrap();

        assert_eq!(block_on(SyncFileSystem.readlink(&s(&file))).unwrap(), None);
        assert_eq!(
            block_on(SyncFileSystem.readlink(&s(&dir.path().join("missing")))).unwrap(),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_readlink_returns_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("real");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(
            block_on(SyncFileSystem.readlink(&s(&link))).unwrap(),
            Some(s(&target))
        );
    }

    #[tokio::test]
    async fn test_os_file_system_reads() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "module.exports = 1").unwrap();

        let fs = OsFileSystem;
        assert!(fs.stat(&s(&file)).await.unwrap().is_file);
        assert_eq!(fs.read_file(&s(&file)).await.unwrap(), b"module.exports = 1");
        let err = fs.stat(&s(&dir.path().join("nope"))).await.unwrap_err();
        assert!(is_not_found(&err));
    }
}
