//! Filesystem traversal and path eligibility.
//!
//! Directories are walked recursively; hidden directories and `vendor` trees
//! are pruned during the walk. A file is eligible when it has the `.go`
//! suffix, is not a `_test.go` file, is not hidden, and no path component is
//! hidden or a vendored-dependency directory. Ineligible paths are skipped
//! silently.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Recursive scanner for Go source files under one root directory.
pub struct FileScanner {
    root_path: PathBuf,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Walks the directory tree and collects eligible `.go` files in the
    /// traversal's yield order.
    ///
    /// # Errors
    ///
    /// Traversal failures are fatal; the whole run aborts rather than
    /// silently producing partial results.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut go_files = Vec::new();

        for entry in WalkDir::new(&self.root_path).into_iter().filter_entry(|e| {
            // Don't filter the root directory itself.
            if e.path() == self.root_path {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            let hidden = name.starts_with('.');
            let vendored = e.file_type().is_dir() && name == "vendor";
            !hidden && !vendored
        }) {
            let entry = entry.with_context(|| {
                format!("failed to walk directory: {}", self.root_path.display())
            })?;
            // Judge eligibility on the path relative to the root so hidden
            // ancestors of the root itself don't disqualify the whole tree.
            let relative = entry
                .path()
                .strip_prefix(&self.root_path)
                .unwrap_or_else(|_| entry.path());
            if entry.file_type().is_file() && is_eligible(relative) {
                go_files.push(entry.path().to_path_buf());
            }
        }

        Ok(go_files)
    }
}

/// Whether a file name alone is a candidate: `.go` suffix, not a test file,
/// not hidden. Explicitly-named file arguments are judged by this rule only,
/// so a file the user points at directly is never skipped for living under a
/// hidden ancestor.
pub fn is_eligible_name(name: &str) -> bool {
    name.ends_with(".go") && !name.ends_with("_test.go") && !name.starts_with('.')
}

/// Whether a relative file path found during traversal is a candidate for
/// annotation.
pub fn is_eligible(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !is_eligible_name(name) {
        return false;
    }
    !path.components().any(|component| match component {
        Component::Normal(part) => part
            .to_str()
            .is_some_and(|s| s != name && (s == "vendor" || s.starts_with('.'))),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_eligible_accepts_plain_go_file() {
        assert!(is_eligible(Path::new("main.go")));
        assert!(is_eligible(Path::new("pkg/server/handler.go")));
        assert!(is_eligible(Path::new("./handler.go")));
    }

    #[test]
    fn test_is_eligible_rejects_non_go_and_test_files() {
        assert!(!is_eligible(Path::new("main.rs")));
        assert!(!is_eligible(Path::new("handler_test.go")));
        assert!(!is_eligible(Path::new("pkg/handler_test.go")));
    }

    #[test]
    fn test_is_eligible_rejects_hidden_and_vendored_paths() {
        assert!(!is_eligible(Path::new(".hidden.go")));
        assert!(!is_eligible(Path::new(".git/config.go")));
        assert!(!is_eligible(Path::new("vendor/dep/dep.go")));
        assert!(!is_eligible(Path::new("pkg/vendor/dep.go")));
    }

    #[test]
    fn test_is_eligible_name_ignores_ancestors() {
        assert!(is_eligible_name("main.go"));
        assert!(!is_eligible_name("main_test.go"));
        assert!(!is_eligible_name(".hidden.go"));
        assert!(!is_eligible_name("main.rs"));
    }

    #[test]
    fn test_scan_collects_nested_go_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("pkg")).unwrap();
        fs::write(root.join("main.go"), "package main\n").unwrap();
        fs::write(root.join("pkg/types.go"), "package pkg\n").unwrap();
        fs::write(root.join("readme.md"), "# README\n").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let files = scanner.scan().unwrap();

        assert_eq!(files.len(), 2);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"main.go".to_string()));
        assert!(names.contains(&"types.go".to_string()));
    }

    #[test]
    fn test_scan_skips_test_files_vendor_and_hidden() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("vendor")).unwrap();
        fs::create_dir(root.join(".cache")).unwrap();
        fs::write(root.join("main.go"), "package main\n").unwrap();
        fs::write(root.join("main_test.go"), "package main\n").unwrap();
        fs::write(root.join("vendor/dep.go"), "package dep\n").unwrap();
        fs::write(root.join(".cache/gen.go"), "package gen\n").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let files = scanner.scan().unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap().to_string_lossy(), "main.go");
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = FileScanner::new(temp_dir.path().to_path_buf());
        assert!(scanner.scan().unwrap().is_empty());
    }
}
