// Hostkeeper Infrastructure - Filesystem Adapters
// Implements: FileEnumerator, FileStore, Compressor

pub mod compressor;
pub mod enumerator;
pub mod store;

pub use compressor::TarGzCompressor;
pub use enumerator::WalkDirEnumerator;
pub use store::LocalFileStore;

use hostkeeper_core::error::{AppError, Result};

/// Run blocking filesystem work off the async runtime
pub(crate) async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}
