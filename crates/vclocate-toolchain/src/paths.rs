//! Windows-style path helpers.
//!
//! Toolchain layouts are described with backslash-separated relative paths
//! (`Common7\IDE`, `Bin\x86_amd64`). They are joined one component at a time
//! so the same layout maps onto whatever filesystem the host has.

use std::path::{Path, PathBuf};

/// Separator of search-path lists such as `PATH` and `LIB`.
pub const LIST_SEPARATOR: char = ';';

/// Join a backslash-separated relative path onto `base`.
pub fn join(base: &Path, relative: &str) -> PathBuf {
    relative
        .split(['\\', '/'])
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |path, part| path.join(part))
}

/// Lexically normalize a Windows path: unify separators, drop `.` and empty
/// components, fold `..` into its parent.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('/', "\\");
    let (prefix, rest) = match unified.find(':') {
        Some(1) => unified.split_at(2),
        _ => ("", unified.as_str()),
    };
    let rooted = rest.starts_with('\\');

    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('\\') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let mut out = String::from(prefix);
    if rooted {
        out.push('\\');
    }
    out.push_str(&parts.join("\\"));
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// Split a search-path list, normalize each entry and drop repeats while
/// keeping first occurrences in order.
pub fn dedup_list(value: &str) -> String {
    let mut seen: Vec<String> = Vec::new();
    for entry in value.split(LIST_SEPARATOR) {
        let entry = normalize(entry);
        if !seen.contains(&entry) {
            seen.push(entry);
        }
    }
    seen.join(";")
}
