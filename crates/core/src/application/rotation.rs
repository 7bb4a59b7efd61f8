// Rotation Job - compress oversized logs, delete aged compressed logs

use std::sync::Arc;
use tracing::{debug, info};

use crate::application::JobContext;
use crate::domain::policy::{age_days, bytes_to_mb, signed_bytes_to_mb};
use crate::domain::{
    ItemError, ItemErrorKind, JobKind, MaintenanceReport, ReportItem, RotationConfig,
};
use crate::port::{Compressor, FileEntry, FileEnumerator, FileStore, WalkScope};

const LOG_SUFFIX: &str = ".log";
const COMPRESSED_LOG_SUFFIX: &str = ".log.gz";

/// Two-pass log rotation over a directory tree
///
/// 1. compress every `*.log` larger than `max_size_bytes` into `<name>.gz`
/// 2. delete every `*.log.gz` older than `max_age_days`
///
/// Both file sets are listed before the first pass, so logs compressed in
/// this run are never deleted in the same run.
pub struct RotationJob {
    enumerator: Arc<dyn FileEnumerator>,
    store: Arc<dyn FileStore>,
    compressor: Arc<dyn Compressor>,
    context: JobContext,
}

impl RotationJob {
    pub fn new(
        enumerator: Arc<dyn FileEnumerator>,
        store: Arc<dyn FileStore>,
        compressor: Arc<dyn Compressor>,
        context: JobContext,
    ) -> Self {
        Self {
            enumerator,
            store,
            compressor,
            context,
        }
    }

    pub async fn run(&self, config: &RotationConfig) -> MaintenanceReport {
        let mut report = self.context.begin(JobKind::Rotation);
        let now = self.context.now_millis();
        let policy = config.policy;

        let entries = match self
            .enumerator
            .enumerate(&config.log_dir, WalkScope::Recursive)
            .await
        {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                debug!(log_dir = %config.log_dir.display(), "Log directory missing, nothing to rotate");
                return self.context.finish(report.finish());
            }
            Err(e) => {
                let dir = config.log_dir.display().to_string();
                return self.context.finish(report.fail(dir, e.to_string()));
            }
        };

        let (logs, compressed): (Vec<FileEntry>, Vec<FileEntry>) = entries
            .into_iter()
            .filter(|e| {
                let name = e.file_name();
                name.ends_with(LOG_SUFFIX) || name.ends_with(COMPRESSED_LOG_SUFFIX)
            })
            .partition(|e| e.file_name().ends_with(LOG_SUFFIX));

        info!(
            log_dir = %config.log_dir.display(),
            logs = logs.len(),
            compressed_logs = compressed.len(),
            max_size_bytes = policy.max_size_bytes,
            max_age_days = policy.max_age_days,
            "Running log rotation"
        );

        // Pass 1: compress
        for log in logs.iter().filter(|f| policy.should_compress(f.size_bytes)) {
            match self.compressor.gzip_file(&log.path).await {
                Ok(compressed_bytes) => {
                    let freed_bytes = log.size_bytes as i64 - compressed_bytes as i64;
                    self.context.record(
                        &mut report,
                        ReportItem::Compressed {
                            name: log.relative_display(),
                            original_mb: bytes_to_mb(log.size_bytes),
                            compressed_mb: bytes_to_mb(compressed_bytes),
                            freed_mb: signed_bytes_to_mb(freed_bytes),
                        },
                    );
                }
                Err(e) => self.context.record_error(
                    &mut report,
                    ItemError::new(log.relative_display(), ItemErrorKind::Compress, e.to_string()),
                ),
            }
        }

        // Pass 2: delete aged compressed logs (snapshot taken before pass 1)
        for archive in compressed
            .iter()
            .filter(|f| policy.should_delete(f.modified_ms, now))
        {
            match self.store.remove_file(&archive.path).await {
                Ok(()) => self.context.record(
                    &mut report,
                    ReportItem::Deleted {
                        name: archive.relative_display(),
                        size_mb: bytes_to_mb(archive.size_bytes),
                        age_days: age_days(archive.modified_ms, now),
                    },
                ),
                Err(e) => self.context.record_error(
                    &mut report,
                    ItemError::new(
                        archive.relative_display(),
                        ItemErrorKind::Delete,
                        e.to_string(),
                    ),
                ),
            }
        }

        self.context.finish(report.finish())
    }
}
