// Directory walker (FileEnumerator adapter)
// reason: walkdir for portable recursive traversal
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use hostkeeper_core::error::{AppError, Result};
use hostkeeper_core::port::{FileEntry, FileEnumerator, WalkScope};

/// Walks the local filesystem
///
/// Symlinks are never followed. Lenient scopes return regular files only and
/// skip entries that cannot be read; `Tree` also returns symlinks and fails on
/// the first unreadable entry. Output is sorted by path.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkDirEnumerator;

impl WalkDirEnumerator {
    pub fn new() -> Self {
        Self
    }
}

fn walk(root: &Path, scope: WalkScope) -> Result<Vec<FileEntry>> {
    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(root.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Err(AppError::NotFound(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if !scope.is_recursive() {
        walker = walker.max_depth(1);
    }
    let strict = scope.is_strict();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if strict => return Err(walk_error(e)),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let file_type = entry.file_type();
        let wanted = file_type.is_file() || (strict && file_type.is_symlink());
        if !wanted {
            continue;
        }

        // symlinks are not followed, so this is the link's own metadata
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) if strict => return Err(walk_error(e)),
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "Skipping file without metadata");
                continue;
            }
        };
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) if strict => return Err(e.into()),
            Err(_) => {
                debug!(path = %entry.path().display(), "Skipping file without mtime");
                continue;
            }
        };
        let Ok(relative_path) = entry.path().strip_prefix(root).map(PathBuf::from) else {
            continue;
        };

        files.push(FileEntry {
            path: entry.path().to_path_buf(),
            relative_path,
            size_bytes: metadata.len(),
            modified_ms: DateTime::<Utc>::from(modified).timestamp_millis(),
        });
    }

    Ok(files)
}

/// Walk failure below the root; never reported as NotFound since the root exists
fn walk_error(e: walkdir::Error) -> AppError {
    let path = e
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let kind = match e.io_error().map(|io| io.kind()) {
        Some(io::ErrorKind::NotFound) | None => io::ErrorKind::Other,
        Some(kind) => kind,
    };
    AppError::Io(io::Error::new(kind, format!("cannot read {}: {}", path, e)))
}

#[async_trait]
impl FileEnumerator for WalkDirEnumerator {
    async fn enumerate(&self, root: &Path, scope: WalkScope) -> Result<Vec<FileEntry>> {
        let root = root.to_path_buf();
        let files = crate::blocking(move || walk(&root, scope)).await?;

        debug!(count = files.len(), scope = ?scope, "Enumerated files");

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/b.log"), b"0123456789").unwrap();
        fs::write(dir.path().join("sub/deeper/c.log"), b"").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_recursive_lists_files_only() {
        let dir = tree();
        let files = WalkDirEnumerator::new()
            .enumerate(dir.path(), WalkScope::Recursive)
            .await
            .unwrap();

        let relative: Vec<PathBuf> = files.iter().map(|f| f.relative_path.clone()).collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("sub").join("b.log"),
                PathBuf::from("sub").join("deeper").join("c.log"),
            ]
        );
        assert_eq!(files[1].size_bytes, 10);
        assert!(files[0].modified_ms > 0);
    }

    #[tokio::test]
    async fn test_top_level_skips_subdirectories() {
        let dir = tree();
        let files = WalkDirEnumerator::new()
            .enumerate(dir.path(), WalkScope::TopLevel)
            .await
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "a.txt");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tree_lists_symlinks_without_following() {
        let dir = tree();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("target.txt"), b"outside").unwrap();
        std::os::unix::fs::symlink(outside.path().join("target.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked-dir")).unwrap();

        let enumerator = WalkDirEnumerator::new();
        let tree_files = enumerator.enumerate(dir.path(), WalkScope::Tree).await.unwrap();
        let recursive = enumerator
            .enumerate(dir.path(), WalkScope::Recursive)
            .await
            .unwrap();

        let names: Vec<String> = tree_files.iter().map(|f| f.relative_display()).collect();
        assert_eq!(
            names,
            vec!["a.txt", "link.txt", "linked-dir", "sub/b.log", "sub/deeper/c.log"]
        );
        assert_eq!(recursive.len(), 3);
    }

    #[test]
    fn test_walk_error_is_never_not_found() {
        let err = WalkDir::new("/nonexistent/hostkeeper-walk-root")
            .into_iter()
            .find_map(|entry| entry.err())
            .unwrap();

        let mapped = walk_error(err);
        assert!(!mapped.is_not_found());
        assert!(mapped.to_string().contains("hostkeeper-walk-root"));
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = WalkDirEnumerator::new()
            .enumerate(&dir.path().join("nope"), WalkScope::Recursive)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_file_root_is_not_found() {
        let dir = tree();
        let err = WalkDirEnumerator::new()
            .enumerate(&dir.path().join("a.txt"), WalkScope::Recursive)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
