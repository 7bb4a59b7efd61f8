// File enumeration port
// reason: async-trait so adapters can offload blocking directory walks
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// How deep an enumeration goes below its root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkScope {
    /// Direct children of the root only
    TopLevel,
    /// Whole tree below the root
    Recursive,
    /// Whole tree for archiving: symlinks are listed as entries and any
    /// unreadable entry fails the enumeration
    Tree,
}

impl WalkScope {
    pub fn is_recursive(self) -> bool {
        self != WalkScope::TopLevel
    }

    /// Unreadable entries are errors instead of being skipped
    pub fn is_strict(self) -> bool {
        self == WalkScope::Tree
    }
}

/// A file found under an enumeration root (or a symlink, for `Tree` walks)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Path relative to the enumeration root
    pub relative_path: PathBuf,
    pub size_bytes: u64,
    /// Last-modified time, epoch ms
    pub modified_ms: i64,
}

impl FileEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn relative_display(&self) -> String {
        self.relative_path.to_string_lossy().into_owned()
    }
}

/// File enumerator port
///
/// Implementations:
/// - WalkDirEnumerator: walks the local filesystem
#[async_trait]
pub trait FileEnumerator: Send + Sync {
    /// List files under `root`
    ///
    /// `TopLevel` and `Recursive` return regular files only and skip
    /// unreadable entries. `Tree` also returns symlinks (not followed).
    ///
    /// # Errors
    /// - AppError::NotFound if `root` does not exist or is not a directory
    /// - AppError::Io for an unreadable entry during a `Tree` walk
    async fn enumerate(&self, root: &Path, scope: WalkScope) -> Result<Vec<FileEntry>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;

    /// Mock enumerator returning a fixed listing
    pub struct StaticEnumerator {
        root: PathBuf,
        files: Vec<FileEntry>,
        unreadable: Vec<PathBuf>,
    }

    impl StaticEnumerator {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self {
                root: root.into(),
                files: Vec::new(),
                unreadable: Vec::new(),
            }
        }

        /// Entry that cannot be read: skipped by lenient walks, fatal for `Tree`
        pub fn with_unreadable(mut self, relative: &str) -> Self {
            self.unreadable.push(PathBuf::from(relative));
            self
        }

        /// Add a file at `relative` (use '/' separators)
        pub fn with_file(mut self, relative: &str, size_bytes: u64, modified_ms: i64) -> Self {
            self.files.push(FileEntry {
                path: self.root.join(relative),
                relative_path: PathBuf::from(relative),
                size_bytes,
                modified_ms,
            });
            self
        }
    }

    #[async_trait]
    impl FileEnumerator for StaticEnumerator {
        async fn enumerate(&self, root: &Path, scope: WalkScope) -> Result<Vec<FileEntry>> {
            if root != self.root {
                return Err(AppError::NotFound(root.display().to_string()));
            }
            if let Some(relative) = self.unreadable.first().filter(|_| scope.is_strict()) {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("cannot read {}", self.root.join(relative).display()),
                )));
            }
            Ok(self
                .files
                .iter()
                .filter(|f| scope.is_recursive() || f.relative_path.components().count() == 1)
                .cloned()
                .collect())
        }
    }
}
