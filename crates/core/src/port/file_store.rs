// File mutation port
use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// File store port (destructive operations on single files)
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Delete one regular file. No soft-delete.
    async fn remove_file(&self, path: &Path) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock store recording removals; paths listed in `failing` error out
    #[derive(Default)]
    pub struct RecordingFileStore {
        removed: Mutex<Vec<PathBuf>>,
        failing: Vec<PathBuf>,
    }

    impl RecordingFileStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(mut self, path: impl Into<PathBuf>) -> Self {
            self.failing.push(path.into());
            self
        }

        pub fn removed(&self) -> Vec<PathBuf> {
            self.removed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FileStore for RecordingFileStore {
        async fn remove_file(&self, path: &Path) -> Result<()> {
            if self.failing.iter().any(|p| p == path) {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                )));
            }
            self.removed.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }
}
