//! Path utilities for wacast
//!
//! Handles tilde expansion, app-root resolution, and lookup of user-supplied
//! input files (templates, contact lists).

use std::path::PathBuf;

/// Expands tilde (~) in paths to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if !path.contains('~') {
        return path.to_string();
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());

    let mut result = path.to_string();
    if result.starts_with("~/") {
        result = result.replacen("~/", &format!("{}/", home), 1);
    }
    result.replace(" ~/", &format!(" {}/", home))
}

/// Helper to convert a potentially tilde-containing string into a PathBuf.
pub fn get_path(path: &str) -> PathBuf {
    PathBuf::from(expand_tilde(path))
}

/// Resolves the wacast root using the WACAST_ROOT env var.
/// Handles absolute paths, tilde expansion, and relative names.
pub fn get_app_root() -> PathBuf {
    let root_name = std::env::var("WACAST_ROOT").unwrap_or_else(|_| ".wacast".to_string());

    if root_name.starts_with('/') {
        PathBuf::from(root_name)
    } else if root_name.starts_with('~') {
        get_path(&root_name)
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(root_name)
    }
}

/// Ensures a path is absolute, resolving tilde and relative to app root.
pub fn ensure_absolute(path: &str) -> PathBuf {
    let p = get_path(path);
    if p.is_absolute() {
        p
    } else {
        get_app_root().join(p)
    }
}

/// Looks up a user-supplied input file: the invocation directory wins,
/// then the app root. Returns None when neither has it.
pub fn resolve_input_path(path: &str) -> Option<PathBuf> {
    let direct = get_path(path);
    if direct.exists() {
        return Some(direct);
    }
    if !direct.is_absolute() {
        let rooted = get_app_root().join(&direct);
        if rooted.exists() {
            return Some(rooted);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_leaves_plain_paths_alone() {
        assert_eq!(expand_tilde("/tmp/foo"), "/tmp/foo");
        assert_eq!(expand_tilde("relative/path"), "relative/path");
    }

    #[test]
    fn expand_tilde_uses_home() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        assert_eq!(expand_tilde("~/notes"), format!("{}/notes", home));
    }

    #[test]
    fn resolve_input_path_finds_absolute_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("message.txt");
        std::fs::write(&file, "hello").unwrap();

        let resolved = resolve_input_path(file.to_str().unwrap());
        assert_eq!(resolved, Some(file));
    }

    #[test]
    fn resolve_input_path_misses_cleanly() {
        assert_eq!(resolve_input_path("definitely_not_here_wacast.csv"), None);
    }
}
