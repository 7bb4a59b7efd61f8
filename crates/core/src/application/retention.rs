// Retention Job - prune backup archives older than keep_days

use std::sync::Arc;
use tracing::{debug, info};

use crate::application::JobContext;
use crate::domain::policy::{age_days, bytes_to_mb};
use crate::domain::{
    is_archive_name, ItemError, ItemErrorKind, JobKind, MaintenanceReport, ReportItem,
    RetentionConfig,
};
use crate::port::{FileEnumerator, FileStore, WalkScope};

/// Deletes expired `<prefix>-*.tar.gz` archives from a backup directory
///
/// Partial-failure tolerant: a file that cannot be deleted is recorded in
/// `errors` and the remaining files are still processed. Two invocations
/// racing on the same directory must be serialized by the caller.
pub struct RetentionJob {
    enumerator: Arc<dyn FileEnumerator>,
    store: Arc<dyn FileStore>,
    context: JobContext,
}

impl RetentionJob {
    pub fn new(
        enumerator: Arc<dyn FileEnumerator>,
        store: Arc<dyn FileStore>,
        context: JobContext,
    ) -> Self {
        Self {
            enumerator,
            store,
            context,
        }
    }

    pub async fn run(&self, config: &RetentionConfig) -> MaintenanceReport {
        let mut report = self.context.begin(JobKind::Retention);
        let now = self.context.now_millis();

        let entries = match self
            .enumerator
            .enumerate(&config.backup_dir, WalkScope::TopLevel)
            .await
        {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                debug!(
                    backup_dir = %config.backup_dir.display(),
                    "Backup directory missing, nothing to prune"
                );
                return self.context.finish(report.finish());
            }
            Err(e) => {
                let dir = config.backup_dir.display().to_string();
                return self.context.finish(report.fail(dir, e.to_string()));
            }
        };

        info!(
            backup_dir = %config.backup_dir.display(),
            keep_days = config.policy.keep_days,
            candidates = entries.len(),
            "Running archive retention"
        );

        for entry in entries
            .iter()
            .filter(|e| is_archive_name(&config.prefix, &e.file_name()))
        {
            if !config.policy.is_expired(entry.modified_ms, now) {
                continue;
            }

            match self.store.remove_file(&entry.path).await {
                Ok(()) => self.context.record(
                    &mut report,
                    ReportItem::Deleted {
                        name: entry.file_name(),
                        size_mb: bytes_to_mb(entry.size_bytes),
                        age_days: age_days(entry.modified_ms, now),
                    },
                ),
                Err(e) => self.context.record_error(
                    &mut report,
                    ItemError::new(entry.file_name(), ItemErrorKind::Delete, e.to_string()),
                ),
            }
        }

        self.context.finish(report.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::test_support::{context, NOW};
    use crate::domain::policy::MILLIS_PER_DAY;
    use crate::domain::ReportStatus;
    use crate::port::file_enumerator::mocks::StaticEnumerator;
    use crate::port::file_store::mocks::RecordingFileStore;
    use std::path::PathBuf;

    const MB: u64 = 1024 * 1024;

    fn days_ago(days: i64) -> i64 {
        NOW - days * MILLIS_PER_DAY
    }

    #[tokio::test]
    async fn test_deletes_only_expired_matching_archives() {
        let enumerator = StaticEnumerator::new("/backups")
            .with_file("backup-20231104_000000.tar.gz", 2 * MB, days_ago(10))
            .with_file("backup-20231111_000000.tar.gz", MB, days_ago(3))
            .with_file("notes-20231001.tar.gz", MB, days_ago(40))
            .with_file("backup-old.zip", MB, days_ago(40));
        let store = Arc::new(RecordingFileStore::new());
        let (ctx, _) = context();
        let job = RetentionJob::new(Arc::new(enumerator), store.clone(), ctx);

        let report = job.run(&RetentionConfig::new("/backups", 7)).await;

        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(
            store.removed(),
            vec![PathBuf::from("/backups/backup-20231104_000000.tar.gz")]
        );
        assert_eq!(report.totals.deleted_count, 1);
        assert_eq!(report.items[0].age_days(), Some(10));
        assert!((report.totals.total_freed_mb - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_keep_days_boundary() {
        let enumerator = StaticEnumerator::new("/backups")
            .with_file("backup-a.tar.gz", MB, days_ago(7))
            .with_file("backup-b.tar.gz", MB, days_ago(8));
        let store = Arc::new(RecordingFileStore::new());
        let (ctx, _) = context();
        let job = RetentionJob::new(Arc::new(enumerator), store.clone(), ctx);

        let report = job.run(&RetentionConfig::new("/backups", 7)).await;

        assert_eq!(
            store.removed(),
            vec![PathBuf::from("/backups/backup-b.tar.gz")]
        );
        assert_eq!(report.items[0].age_days(), Some(8));
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_stop_job() {
        let enumerator = StaticEnumerator::new("/backups")
            .with_file("backup-a.tar.gz", MB, days_ago(20))
            .with_file("backup-b.tar.gz", MB, days_ago(20));
        let store =
            Arc::new(RecordingFileStore::new().failing_on("/backups/backup-a.tar.gz"));
        let (ctx, _) = context();
        let job = RetentionJob::new(Arc::new(enumerator), store.clone(), ctx);

        let report = job.run(&RetentionConfig::new("/backups", 7)).await;

        assert_eq!(report.status, ReportStatus::Warning);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].item, "backup-a.tar.gz");
        assert_eq!(report.errors[0].kind, ItemErrorKind::Delete);
        assert_eq!(report.totals.deleted_count, 1);
        assert_eq!(
            store.removed(),
            vec![PathBuf::from("/backups/backup-b.tar.gz")]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_report() {
        let enumerator = StaticEnumerator::new("/other");
        let (ctx, _) = context();
        let job = RetentionJob::new(
            Arc::new(enumerator),
            Arc::new(RecordingFileStore::new()),
            ctx,
        );

        let report = job.run(&RetentionConfig::new("/backups", 7)).await;

        assert_eq!(report.status, ReportStatus::Success);
        assert!(report.items.is_empty());
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_nested_archives_are_not_scanned() {
        let enumerator = StaticEnumerator::new("/backups")
            .with_file("nested/backup-a.tar.gz", MB, days_ago(30));
        let store = Arc::new(RecordingFileStore::new());
        let (ctx, _) = context();
        let job = RetentionJob::new(Arc::new(enumerator), store.clone(), ctx);

        let report = job.run(&RetentionConfig::new("/backups", 7)).await;

        assert!(report.items.is_empty());
        assert!(store.removed().is_empty());
    }
}
