// Compression port (tar.gz archives and single-file gzip)
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One file to place in an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub source: PathBuf,
    /// Path inside the archive, below `ArchiveRequest::root_name`
    pub relative_path: PathBuf,
}

/// Everything needed to write one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub destination: PathBuf,
    /// Top-level entry name (base name of the source directory)
    pub root_name: String,
    pub members: Vec<ArchiveMember>,
}

/// Compressor port
///
/// Implementations:
/// - TarGzCompressor: tar + gzip on the local filesystem
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Write a gzip-compressed tar archive
    ///
    /// The destination's parent directory is created if absent. The archive
    /// only appears at `destination` once fully written.
    ///
    /// # Returns
    /// Archive size in bytes
    async fn write_archive(&self, request: ArchiveRequest) -> Result<u64>;

    /// Compress `path` into the sibling `<path>.gz`, then delete `path`
    ///
    /// # Errors
    /// - AppError::Conflict if `<path>.gz` already exists (never overwritten)
    ///
    /// # Returns
    /// Compressed size in bytes
    async fn gzip_file(&self, path: &Path) -> Result<u64>;
}

/// Sibling path produced by `Compressor::gzip_file`
pub fn gzip_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    /// Mock compressor with canned sizes
    pub struct MockCompressor {
        archive_size: u64,
        gzip_size: u64,
        fail_with: Option<String>,
        requests: Mutex<Vec<ArchiveRequest>>,
        gzipped: Mutex<Vec<PathBuf>>,
    }

    impl MockCompressor {
        pub fn new(archive_size: u64, gzip_size: u64) -> Self {
            Self {
                archive_size,
                gzip_size,
                fail_with: None,
                requests: Mutex::new(Vec::new()),
                gzipped: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                fail_with: Some(message.into()),
                ..Self::new(0, 0)
            }
        }

        pub fn requests(&self) -> Vec<ArchiveRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn gzipped(&self) -> Vec<PathBuf> {
            self.gzipped.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Compressor for MockCompressor {
        async fn write_archive(&self, request: ArchiveRequest) -> Result<u64> {
            if let Some(msg) = &self.fail_with {
                return Err(AppError::Compression(msg.clone()));
            }
            self.requests.lock().unwrap().push(request);
            Ok(self.archive_size)
        }

        async fn gzip_file(&self, path: &Path) -> Result<u64> {
            if let Some(msg) = &self.fail_with {
                return Err(AppError::Compression(msg.clone()));
            }
            self.gzipped.lock().unwrap().push(path.to_path_buf());
            Ok(self.gzip_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_path_appends_suffix() {
        assert_eq!(
            gzip_path(Path::new("logs/app.log")),
            PathBuf::from("logs/app.log.gz")
        );
    }
}
