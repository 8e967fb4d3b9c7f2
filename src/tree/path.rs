//! Helpers for workspace-relative paths.
//!
//! Paths are `/`-separated, have no leading or trailing slash and no empty
//! segments. The empty string is the workspace root.

/// Normalize a user or backend supplied path.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent folder of `path`; the root for top-level entries.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of `path`.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a folder and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_strict_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Every prefix of `path`, shortest first (`a/b/c` → `a`, `a/b`, `a/b/c`).
pub fn prefixes(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<&str> = path
        .match_indices('/')
        .map(|(idx, _)| &path[..idx])
        .collect();
    out.push(path);
    out
}
