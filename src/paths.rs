//! Lexical path manipulation.
//!
//! Target names are paths relative to the invocation's working directory,
//! and rulefiles print dependencies relative to their own directory, so
//! planning needs to normalize, join, and re-relativize paths without
//! touching the disk.

use std::path::{Component, Path, PathBuf};

/// Lexically canonicalize a path, removing `.` components and resolving
/// `..` against preceding components.  Does not access the disk, so
/// symlinks are not resolved.  An empty result becomes `.`.
pub fn canon(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(c) => {
                out.push(c);
                depth += 1;
            }
            c => out.push(c.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Resolve `path` against the working directory `wd`: relative paths are
/// joined onto `wd`, absolute paths pass through.  Either way the result
/// is canonicalized.
pub fn absolute(wd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        canon(path)
    } else {
        canon(&wd.join(path))
    }
}

/// Compute a lexical relative path from `base` to `path`.  Both are
/// canonicalized first; the shared prefix is stripped and each remaining
/// `base` component becomes a `..`.  Falls back to `path` itself when the
/// two don't share a root.
pub fn relative(base: &Path, path: &Path) -> PathBuf {
    let base = canon(base);
    let path = canon(path);
    if base.is_absolute() != path.is_absolute() {
        return path;
    }

    let mut base_parts = base.components().peekable();
    let mut path_parts = path.components().peekable();
    while let (Some(b), Some(p)) = (base_parts.peek(), path_parts.peek()) {
        if b != p {
            break;
        }
        base_parts.next();
        path_parts.next();
    }

    let mut out = PathBuf::new();
    for _ in base_parts {
        out.push("..");
    }
    for p in path_parts {
        out.push(p.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
