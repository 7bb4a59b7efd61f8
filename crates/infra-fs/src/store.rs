// Local file store (FileStore adapter)
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use hostkeeper_core::error::Result;
use hostkeeper_core::port::FileStore;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn remove_file(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        info!(path = %path.display(), "Deleted file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup-a.tar.gz");
        std::fs::write(&path, b"data").unwrap();

        LocalFileStore::new().remove_file(&path).await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFileStore::new()
            .remove_file(&dir.path().join("gone"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
