use std::{env, path::PathBuf};

/// Expand a leading `~` in a filesystem path using the `HOME` environment variable.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~")
        && let Ok(home) = env::var("HOME")
    {
        return PathBuf::from(path.replacen("~", &home, 1));
    }
    PathBuf::from(path)
}

/// Derive a mirror directory name from a remote URL.
///
/// Every character outside `[A-Za-z0-9@._-]` becomes `-`, so
/// `https://github.com/org/repo.git` maps to `https---github.com-org-repo.git`.
/// A result made only of dots (or nothing) would name the mirror directory or
/// its parent, so its dots become `-` as well.
pub fn dirname_for_remote(remote: &str) -> String {
    if remote.chars().all(|c| c == '.') {
        return "-".repeat(remote.len().max(1));
    }
    remote
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
