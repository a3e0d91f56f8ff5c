//! String-based path manipulation.
//!
//! Resolution works on path strings rather than `std::path::Path` so that a
//! Windows-style path (`C:\project`) and a POSIX path (`/project`) can be
//! handled by the same pipeline regardless of the host platform.

/// Returns true if `c` is a path separator (`/` or `\`).
#[must_use]
pub fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Check for a Windows drive prefix followed by a separator or end of input
/// (`C:`, `c:\`, `D:/`).
#[must_use]
pub fn is_windows_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Check if a path is absolute in either POSIX or Windows form.
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || is_windows_absolute(path)
}

/// Normalize a path: collapse repeated separators, resolve `.` and `..`
/// segments and drop trailing separators.
///
/// - Absolute paths never climb above their root (`/a/../..` is `/`).
/// - Windows drive paths are rendered with `\`.
/// - Relative paths keep a leading `./` when they had one, so a path
///   relative to a package root (`./lib/index.js`) stays recognizable.
#[must_use]
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let (root, rest, separator) = if is_windows_absolute(path) {
        (Some(format!("{}\\", &path[..2])), &path[2..], '\\')
    } else if path.starts_with('/') {
        (Some("/".to_string()), &path[1..], '/')
    } else if path.starts_with('\\') {
        (Some("\\".to_string()), &path[1..], '\\')
    } else {
        (None, path, '/')
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ => {
                    if root.is_none() {
                        segments.push("..");
                    }
                }
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join(&separator.to_string());

    match root {
        Some(root) => root + &joined,
        None => {
            let dotted = path == "." || path.starts_with("./") || path.starts_with(".\\");
            if segments.first() == Some(&"..") {
                joined
            } else if dotted {
                if joined.is_empty() {
                    ".".to_string()
                } else {
                    format!(".{separator}{joined}")
                }
            } else if joined.is_empty() {
                ".".to_string()
            } else {
                joined
            }
        }
    }
}

/// Join `request` onto `path` and normalize the result.
///
/// An absolute `request` replaces `path` entirely. An empty `request`
/// normalizes `path` alone.
#[must_use]
pub fn join(path: &str, request: &str) -> String {
    if request.is_empty() {
        return normalize(path);
    }
    if is_windows_absolute(request) {
        return normalize(&request.replace('/', "\\"));
    }
    if request.starts_with('/') {
        return normalize(request);
    }
    if path == "/" {
        return normalize(&format!("/{request}"));
    }
    if is_windows_absolute(path) {
        return normalize(&format!(
            "{}\\{}",
            path.replace('/', "\\"),
            request.replace('/', "\\")
        ));
    }
    normalize(&format!("{path}/{request}"))
}

/// Position of the last separator in `path`, whichever style it uses.
fn last_separator(path: &str) -> Option<usize> {
    path.rfind(is_separator)
}

/// Parent directory of `directory`, or `None` at the filesystem root.
///
/// `/a/b` → `/a` → `/` → `None`.
#[must_use]
pub fn cd_up(directory: &str) -> Option<String> {
    if directory == "/" {
        return None;
    }
    let position = last_separator(directory)?;
    Some(directory[..position.max(1)].to_string())
}

/// Last segment of `path`, or `None` if it has no separator.
#[must_use]
pub fn basename(path: &str) -> Option<&str> {
    last_separator(path).map(|position| &path[position + 1..])
}

/// Every ancestor of a path together with the segment that leads to it.
///
/// For `/a/b/c`:
/// - `paths`: `["/a/b/c", "/a/b", "/a", "/"]`
/// - `segments`: `["c", "b", "a", "/"]`
///
/// `segments[i]` is the last component of `paths[i]`; the final entry is the
/// root itself, so folding the reversed segments with [`join`] rebuilds the
/// original path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestors {
    pub paths: Vec<String>,
    pub segments: Vec<String>,
}

/// Decompose a path into its ancestors, nearest first.
#[must_use]
pub fn ancestors(path: &str) -> Ancestors {
    let mut paths = vec![path.to_string()];
    let mut segments = Vec::new();
    let mut current = path.to_string();

    while let Some(position) = last_separator(&current) {
        let segment = current[position + 1..].to_string();
        if segment.is_empty() {
            break;
        }
        current.truncate(position.max(1));
        segments.push(segment);
        paths.push(current.clone());
    }

    if let Some(last) = paths.last() {
        segments.push(last.clone());
    }

    Ancestors { paths, segments }
}
